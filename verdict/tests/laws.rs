//! Algebra laws for `Outcome`, plus chain and matcher behavior through the
//! public API.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;
use serde_json::json;
use verdict::chain::{Chain, attempt_all};
use verdict::core::outcome::Outcome;
use verdict::core::value::{Kind, Value};
use verdict::error::{EmptyChainError, MissingInputError, NoMatchError, NotAnOutcomeError};
use verdict::matcher::{Pattern, match_outcome};

fn samples() -> Vec<Value> {
    vec![
        Value::Nil,
        Value::from(true),
        Value::from(-3),
        Value::from(2.5),
        Value::from("text"),
        Value::from(vec![1, 2]),
        Value::from(BTreeMap::from([("k".to_string(), Value::from(1))])),
    ]
}

fn describe(value: Value) -> String {
    format!("<{value}>")
}

#[test]
fn map_applies_to_success_and_skips_failure() {
    for v in samples() {
        assert_eq!(
            Outcome::success(v.clone()).map(describe),
            Outcome::success(describe(v.clone()))
        );
        assert_eq!(
            Outcome::failure(v.clone()).map(describe),
            Outcome::failure(v)
        );
    }
}

#[test]
fn same_variant_nesting_flattens() {
    for v in samples() {
        assert_eq!(
            Outcome::success(Outcome::success(v.clone())),
            Outcome::success(v.clone())
        );
        assert_eq!(
            Outcome::failure(Outcome::failure(v.clone())),
            Outcome::failure(v)
        );
    }
}

#[test]
fn append_is_asymmetric() {
    assert_eq!(
        Outcome::success(1) << Outcome::success(2),
        Outcome::success(2)
    );
    assert_eq!(
        Outcome::failure(1) << Outcome::failure(2),
        Outcome::failure(1)
    );
}

#[test]
fn and_keeps_the_first_failure() {
    assert_eq!(
        Outcome::success(1).and(Outcome::success(2)),
        Outcome::success(2)
    );
    assert_eq!(
        Outcome::failure(1).and(Outcome::success(2)),
        Outcome::failure(1)
    );
}

#[test]
fn or_keeps_the_first_success() {
    assert_eq!(
        Outcome::failure(1).or(Outcome::success(1)),
        Outcome::success(1)
    );
    assert_eq!(
        Outcome::success(1).or(Outcome::success(2)),
        Outcome::success(1)
    );
}

#[test]
fn capture_turns_errors_into_fault_payloads() {
    let outcome = Outcome::capture(|| -> anyhow::Result<i64> { Err(anyhow!("x")) });
    assert!(outcome.is_failure());
    let fault = outcome.value().as_fault().expect("fault payload");
    assert_eq!(fault.message(), "x");
}

#[test]
fn dynamic_and_then_rejects_non_outcomes() {
    let err = Outcome::success(1)
        .and_then_value(|v| v)
        .expect_err("plain value");
    assert_eq!(
        err,
        NotAnOutcomeError {
            combinator: "and_then",
            found: Kind::Int,
        }
    );

    let chained = Outcome::success(1)
        .and_then_value(|v| Value::from(Outcome::failure(v)))
        .expect("outcome");
    assert_eq!(chained, Outcome::failure(1));
}

#[test]
fn success_serializes_under_its_tag() {
    let outcome = Outcome::success(BTreeMap::from([("a".to_string(), Value::from(1))]));
    let json = serde_json::to_value(&outcome).expect("serialize");
    assert_eq!(json, json!({ "Success": { "a": 1 } }));
}

#[test]
fn chain_threads_previous_payload() {
    let outcome = attempt_all(&mut (), |chain| {
        chain
            .attempt(|_| Ok(1))
            .attempt_with(|_, p| Ok(p.as_i64().unwrap_or_default() + 1));
    })
    .expect("run");
    assert_eq!(outcome, Outcome::success(2));
}

#[derive(Default)]
struct Counters {
    first: usize,
    third: usize,
}

#[test]
fn chain_stops_at_the_first_failure() {
    let mut counters = Counters::default();
    let outcome = attempt_all(&mut counters, |chain| {
        chain
            .attempt(|c: &mut Counters| {
                c.first += 1;
                Ok(1)
            })
            .attempt(|_| -> anyhow::Result<Value> { Err(anyhow!("boom")) })
            .attempt(|c: &mut Counters| {
                c.third += 1;
                Ok(2)
            });
    })
    .expect("run");

    assert!(outcome.is_failure());
    let fault = outcome.value().as_fault().expect("fault payload");
    assert_eq!(fault.message(), "boom");
    assert_eq!(counters.first, 1);
    assert_eq!(counters.third, 0);
}

#[derive(Debug)]
struct Quota(u32);

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quota exceeded: {}", self.0)
    }
}

impl std::error::Error for Quota {}

#[test]
fn let_errors_escape_with_their_type() {
    let err = attempt_all(&mut (), |chain| {
        chain
            .attempt(|_| Ok(1))
            .bind(|_| Err(Quota(7).into()));
    })
    .expect_err("let error propagates");
    assert_eq!(err.downcast_ref::<Quota>().map(|q| q.0), Some(7));
}

#[test]
fn contract_errors_for_empty_and_unary_first_chains() {
    let err = Chain::<()>::new().run(&mut ()).expect_err("empty");
    assert!(err.downcast_ref::<EmptyChainError>().is_some());

    let err = attempt_all(&mut (), |chain| {
        chain.bind_with(|_, v| Ok(Outcome::success(v)));
    })
    .expect_err("unary first");
    assert_eq!(
        err.downcast_ref::<MissingInputError>(),
        Some(&MissingInputError { step: 0 })
    );
}

#[test]
fn context_mutations_survive_the_run() {
    let mut log: Vec<String> = Vec::new();
    attempt_all(&mut log, |chain| {
        chain
            .attempt(|log: &mut Vec<String>| {
                log.push("try".to_string());
                Ok("a")
            })
            .bind_with(|log: &mut Vec<String>, v| {
                log.push(format!("let {v}"));
                Ok(Outcome::success(v))
            });
    })
    .expect("run");
    assert_eq!(log, vec!["try", "let a"]);
}

#[test]
fn specific_clause_before_general_wins() {
    let reply = match_outcome(Outcome::success(1), |m| {
        m.success_when(Pattern::literal(1), |_| "A")
            .success(|_| "B");
    })
    .expect("match");
    assert_eq!(reply, "A");
}

#[test]
fn unmatched_outcome_raises_no_match() {
    let err = match_outcome(Outcome::success(1), |m| {
        m.failure_when(Pattern::literal(1), |_| "never");
    })
    .expect_err("no match");
    assert_eq!(
        err,
        NoMatchError {
            outcome: Outcome::success(1),
            clauses: 1,
        }
    );
}

#[test]
fn any_clause_catches_what_earlier_clauses_miss() {
    for outcome in [Outcome::success("x"), Outcome::failure(3)] {
        let reply = match_outcome(outcome, |m| {
            m.success_when(Pattern::literal(1), |_| "one")
                .any(|_| "catch-all");
        })
        .expect("match");
        assert_eq!(reply, "catch-all");
    }
}

#[test]
fn number_kind_admits_ints_and_floats() {
    for outcome in [Outcome::success(3), Outcome::success(0.5)] {
        let reply = match_outcome(outcome, |m| {
            m.success_when(Pattern::kind(Kind::Number), |_| "number")
                .any(|_| "other");
        })
        .expect("match");
        assert_eq!(reply, "number");
    }
}
