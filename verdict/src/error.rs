//! Contract violations raised by the chain runner, the matcher, and the
//! dynamic combinators.
//!
//! These are programming errors, not domain failures: they never become a
//! `Failure` outcome. Orchestration code carries them inside `anyhow::Error`
//! and callers recover them with `downcast_ref`.

use std::fmt;

use crate::core::outcome::Outcome;
use crate::core::value::Kind;

/// A chain was run without any steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyChainError;

impl fmt::Display for EmptyChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("chain has no steps")
    }
}

impl std::error::Error for EmptyChainError {}

/// A step that needs the previous payload was placed first in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingInputError {
    /// Zero-based index of the offending step.
    pub step: usize,
}

impl fmt::Display for MissingInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} takes the previous payload but no step ran before it",
            self.step
        )
    }
}

impl std::error::Error for MissingInputError {}

/// A dynamic `and_then`/`or_else` callback returned something other than an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAnOutcomeError {
    pub combinator: &'static str,
    /// Kind of the value the callback returned.
    pub found: Kind,
}

impl fmt::Display for NotAnOutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} callback returned a {} value, expected an outcome",
            self.combinator, self.found
        )
    }
}

impl std::error::Error for NotAnOutcomeError {}

/// No clause matched the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct NoMatchError {
    /// The outcome nothing matched.
    pub outcome: Outcome,
    /// Number of clauses that were tried.
    pub clauses: usize,
}

impl fmt::Display for NoMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no clause matched {}({}) after trying {} clause(s)",
            self.outcome.tag(),
            self.outcome,
            self.clauses
        )
    }
}

impl std::error::Error for NoMatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_message_names_tag_and_payload() {
        let err = NoMatchError {
            outcome: Outcome::success(1),
            clauses: 2,
        };
        assert_eq!(
            err.to_string(),
            "no clause matched Success(1) after trying 2 clause(s)"
        );
    }

    #[test]
    fn errors_survive_anyhow_round_trip() {
        let err = anyhow::Error::from(MissingInputError { step: 0 });
        assert_eq!(
            err.downcast_ref::<MissingInputError>(),
            Some(&MissingInputError { step: 0 })
        );
    }
}
