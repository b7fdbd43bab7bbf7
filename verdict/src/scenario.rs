//! Orchestration for `verdict run`.
//!
//! Turns a [`Scenario`] into a [`Chain`] and a [`Matcher`], runs the chain
//! against a [`RunLedger`] context, and matches the resulting outcome.

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument};

use crate::chain::{Chain, attempt_all};
use crate::core::outcome::Outcome;
use crate::core::value::Value;
use crate::io::reply::ReplyRenderer;
use crate::io::scenario::{ClauseKind, ClauseSpec, Op, Scenario, StepKind, StepSpec};
use crate::matcher::{Clause, ClauseTag, Matcher, Pattern};

/// Context shared by every step body of a scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLedger {
    /// Ops whose bodies actually ran, in order.
    pub ops: Vec<Op>,
}

impl RunLedger {
    fn record(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn steps_run(&self) -> usize {
        self.ops.len()
    }
}

/// Result of running a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Final outcome of the chain.
    pub outcome: Outcome,
    /// Rendered reply of the winning clause.
    pub reply: String,
    /// Number of step bodies that ran before the chain finished.
    pub steps_run: usize,
}

/// Run a scenario's chain and match its outcome.
///
/// Errors are returned unchanged from the chain runner (empty chain, missing
/// input, `let` step errors) and from the matcher ([`crate::error::NoMatchError`]).
#[instrument(skip_all, fields(steps = scenario.steps.len(), clauses = scenario.clauses.len()))]
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport> {
    let mut ledger = RunLedger::default();
    let outcome = attempt_all(&mut ledger, |chain| {
        for spec in &scenario.steps {
            push_step(chain, spec);
        }
    })?;
    info!(tag = %outcome.tag(), steps_run = ledger.steps_run(), "chain finished");

    let renderer = ReplyRenderer::new();
    let mut matcher = Matcher::new();
    for spec in &scenario.clauses {
        matcher.clause(build_clause(spec, &renderer)?);
    }
    let reply = matcher.evaluate(outcome.clone())??;

    Ok(ScenarioReport {
        outcome,
        reply,
        steps_run: ledger.steps_run(),
    })
}

fn push_step(chain: &mut Chain<'_, RunLedger>, spec: &StepSpec) {
    let op = spec.op;
    let operand = spec.value.clone().unwrap_or_default();
    match (spec.kind, op.takes_input()) {
        (StepKind::Try, false) => chain.attempt(move |ledger| {
            ledger.record(op);
            apply(op, &operand, None)
        }),
        (StepKind::Try, true) => chain.attempt_with(move |ledger, input| {
            ledger.record(op);
            apply(op, &operand, Some(input))
        }),
        (StepKind::Let, false) => chain.bind(move |ledger| {
            ledger.record(op);
            apply(op, &operand, None).map(Outcome::lift)
        }),
        (StepKind::Let, true) => chain.bind_with(move |ledger, input| {
            ledger.record(op);
            apply(op, &operand, Some(input)).map(Outcome::lift)
        }),
    };
}

fn apply(op: Op, operand: &Value, input: Option<Value>) -> Result<Value> {
    match op {
        Op::Const => Ok(operand.clone()),
        Op::Fail => Ok(Outcome::failure(operand.clone()).into()),
        Op::Raise => Err(anyhow!("{operand}")),
        Op::Add | Op::Mul | Op::Div => {
            let input =
                input.ok_or_else(|| anyhow!("{} needs the previous payload", op.as_str()))?;
            arithmetic(op, &input, operand)
        }
    }
}

/// Integer arithmetic when both sides are integers, float arithmetic otherwise.
fn arithmetic(op: Op, lhs: &Value, rhs: &Value) -> Result<Value> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let result = match op {
            Op::Add => a.checked_add(*b),
            Op::Mul => a.checked_mul(*b),
            Op::Div if *b == 0 => bail!("division by zero"),
            Op::Div => a.checked_div(*b),
            other => bail!("{} is not arithmetic", other.as_str()),
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| anyhow!("integer overflow in {}", op.as_str()));
    }

    let a = number(op, lhs)?;
    let b = number(op, rhs)?;
    let result = match op {
        Op::Add => a + b,
        Op::Mul => a * b,
        Op::Div if b == 0.0 => bail!("division by zero"),
        Op::Div => a / b,
        other => bail!("{} is not arithmetic", other.as_str()),
    };
    Ok(Value::Float(result))
}

fn number(op: Op, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow!("{} expects a number, got {}", op.as_str(), value.kind()))
}

fn build_clause<'a>(
    spec: &'a ClauseSpec,
    renderer: &'a ReplyRenderer,
) -> Result<Clause<'a, Result<String>>> {
    let tag = match spec.tag {
        ClauseKind::Success => ClauseTag::Success,
        ClauseKind::Failure => ClauseTag::Failure,
        ClauseKind::Either | ClauseKind::Any => ClauseTag::Either,
    };
    let pattern = clause_pattern(spec)?;
    let template = spec.reply.as_str();
    Ok(Clause::new(tag, pattern, move |value| {
        renderer.render(template, &value)
    }))
}

fn clause_pattern(spec: &ClauseSpec) -> Result<Pattern<'static>> {
    if let Some(literal) = &spec.literal {
        return Ok(Pattern::literal(literal.clone()));
    }
    if let Some(kind) = spec.kind {
        return Ok(Pattern::kind(kind));
    }
    if let Some(source) = &spec.matches {
        let re = Regex::new(source).with_context(|| format!("compile regex '{source}'"))?;
        return Ok(Pattern::predicate(move |value| {
            re.is_match(&value.to_string())
        }));
    }
    if let Some(threshold) = spec.above {
        return Ok(Pattern::predicate(move |value| {
            value.as_f64().is_some_and(|n| n > threshold)
        }));
    }
    Ok(Pattern::Wildcard)
}
