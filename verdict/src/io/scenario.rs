//! Scenario files: a declarative chain plus match clauses, stored as TOML.
//!
//! Loading is layered: TOML syntax, then the embedded JSON Schema, then the
//! semantic rules in [`Scenario::validate`] that the schema cannot express.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::value::{Kind, Value};
use crate::io::reply::ReplyRenderer;

pub const SCENARIO_SCHEMA: &str = include_str!("../../schemas/scenario.schema.json");

/// A chain of steps and the clauses used to match its outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub options: ScenarioOptions,
    pub steps: Vec<StepSpec>,
    pub clauses: Vec<ClauseSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioOptions {
    /// Pretty-print the JSON report.
    pub pretty: bool,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Errors become failures.
    Try,
    /// Errors abort the run.
    Let,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Yield `value`.
    Const,
    /// Add `value` to the previous payload.
    Add,
    /// Multiply the previous payload by `value`.
    Mul,
    /// Divide the previous payload by `value`; dividing by zero is an error.
    Div,
    /// Yield a failure carrying `value`.
    Fail,
    /// Error with `value` as the message.
    Raise,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Const => "const",
            Op::Add => "add",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Fail => "fail",
            Op::Raise => "raise",
        }
    }

    /// True for ops that consume the previous payload.
    pub fn takes_input(self) -> bool {
        matches!(self, Op::Add | Op::Mul | Op::Div)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub kind: StepKind,
    pub op: Op,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseKind {
    Success,
    Failure,
    Either,
    /// Catch-all; carries no pattern.
    Any,
}

/// A match clause. At most one of the pattern fields may be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClauseSpec {
    pub tag: ClauseKind,
    /// Matches a payload equal to this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<Value>,
    /// Matches a payload of this kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    /// Matches when this regex finds a match in the payload's plain-text form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    /// Matches a numeric payload strictly greater than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
    /// Reply template rendered with the matched payload.
    pub reply: String,
}

impl ClauseSpec {
    fn pattern_count(&self) -> usize {
        [
            self.literal.is_some(),
            self.kind.is_some(),
            self.matches.is_some(),
            self.above.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl Scenario {
    /// Semantic checks not expressible in the JSON Schema.
    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            return Ok(());
        }
        Err(anyhow!("scenario invalid: {}", errors.join("; ")))
    }

    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            let op = step.op.as_str();
            match (step.op, &step.value) {
                (_, None) => errors.push(format!("steps[{index}]: {op} requires a value")),
                (Op::Add | Op::Mul | Op::Div, Some(value)) if value.as_f64().is_none() => {
                    errors.push(format!(
                        "steps[{index}]: {op} requires a numeric value, got {}",
                        value.kind()
                    ));
                }
                _ => {}
            }
        }

        let renderer = ReplyRenderer::new();
        for (index, clause) in self.clauses.iter().enumerate() {
            let patterns = clause.pattern_count();
            if patterns > 1 {
                errors.push(format!(
                    "clauses[{index}]: at most one of literal/kind/matches/above may be set"
                ));
            }
            if clause.tag == ClauseKind::Any && patterns > 0 {
                errors.push(format!("clauses[{index}]: an any clause takes no pattern"));
            }
            if let Some(Err(err)) = clause.matches.as_deref().map(Regex::new) {
                errors.push(format!("clauses[{index}]: invalid regex: {err}"));
            }
            if let Err(err) = renderer.check(&clause.reply) {
                errors.push(format!("clauses[{index}]: {err:#}"));
            }
        }

        errors
    }
}

/// Load, schema-check, and validate a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    debug!(path = %path.display(), "loading scenario");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_scenario(&contents).with_context(|| format!("load scenario {}", path.display()))
}

/// Parse scenario TOML text (schema + semantic validation).
pub fn parse_scenario(contents: &str) -> Result<Scenario> {
    let raw: serde_json::Value = toml::from_str(contents).context("parse scenario toml")?;
    validate_schema(&raw)?;
    let scenario: Scenario = serde_json::from_value(raw).context("deserialize scenario")?;
    scenario.validate()?;
    debug!(
        steps = scenario.steps.len(),
        clauses = scenario.clauses.len(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// Atomically write a scenario to disk (temp file + rename).
pub fn write_scenario(path: &Path, scenario: &Scenario) -> Result<()> {
    scenario.validate()?;
    let mut buf = toml::to_string_pretty(scenario).context("serialize scenario toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    write_atomic(path, &buf)
}

/// Write [`sample_scenario`] to `path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init_scenario(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    write_scenario(path, &sample_scenario())
}

/// A small scenario exercising both step kinds and several pattern kinds.
pub fn sample_scenario() -> Scenario {
    Scenario {
        options: ScenarioOptions::default(),
        steps: vec![
            StepSpec {
                kind: StepKind::Try,
                op: Op::Const,
                value: Some(Value::from(20)),
            },
            StepSpec {
                kind: StepKind::Try,
                op: Op::Div,
                value: Some(Value::from(4)),
            },
            StepSpec {
                kind: StepKind::Let,
                op: Op::Add,
                value: Some(Value::from(1)),
            },
        ],
        clauses: vec![
            ClauseSpec {
                tag: ClauseKind::Success,
                literal: Some(Value::from(6)),
                kind: None,
                matches: None,
                above: None,
                reply: "exactly six".to_string(),
            },
            ClauseSpec {
                tag: ClauseKind::Success,
                literal: None,
                kind: Some(Kind::Number),
                matches: None,
                above: None,
                reply: "number {{ value }}".to_string(),
            },
            ClauseSpec {
                tag: ClauseKind::Failure,
                literal: None,
                kind: None,
                matches: Some("division by zero".to_string()),
                above: None,
                reply: "cannot divide: {{ value }}".to_string(),
            },
            ClauseSpec {
                tag: ClauseKind::Any,
                literal: None,
                kind: None,
                matches: None,
                above: None,
                reply: "unexpected {{ kind }}: {{ value }}".to_string(),
            },
        ],
    }
}

fn validate_schema(scenario: &serde_json::Value) -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(SCENARIO_SCHEMA).context("parse scenario schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages = compiled
        .iter_errors(scenario)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    if !messages.is_empty() {
        return Err(anyhow!(
            "scenario schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("scenario path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp scenario {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace scenario {}", path.display()))?;
    Ok(())
}
