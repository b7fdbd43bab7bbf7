//! Pattern matching over an [`Outcome`].
//!
//! Clauses are tried in declaration order; the first clause whose tag and
//! pattern both match wins, and its handler receives the owned payload.
//! When nothing matches, evaluation fails with [`NoMatchError`] instead of
//! falling through, so missing coverage is always reported.

use std::fmt;

use tracing::debug;

use crate::core::outcome::{Outcome, Tag};
use crate::core::value::{Kind, Value};
use crate::error::NoMatchError;

/// Which outcome variants a clause accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseTag {
    Success,
    Failure,
    /// Both variants.
    Either,
}

impl ClauseTag {
    pub fn admits(self, tag: Tag) -> bool {
        match self {
            ClauseTag::Success => tag == Tag::Success,
            ClauseTag::Failure => tag == Tag::Failure,
            ClauseTag::Either => true,
        }
    }
}

/// Test applied to the payload once the tag check passes.
pub enum Pattern<'a> {
    /// Always matches.
    Wildcard,
    /// Matches a payload equal to this value.
    Literal(Value),
    /// Matches when the predicate returns true.
    Predicate(Box<dyn Fn(&Value) -> bool + 'a>),
    /// Matches a payload whose runtime kind is admitted by this kind.
    Kind(Kind),
}

impl<'a> Pattern<'a> {
    pub fn literal(value: impl Into<Value>) -> Self {
        Pattern::Literal(value.into())
    }

    pub fn predicate(f: impl Fn(&Value) -> bool + 'a) -> Self {
        Pattern::Predicate(Box::new(f))
    }

    pub fn kind(kind: Kind) -> Self {
        Pattern::Kind(kind)
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Pattern::Wildcard => true,
            Pattern::Literal(expected) => expected.loose_eq(value),
            Pattern::Predicate(predicate) => predicate(value),
            Pattern::Kind(kind) => kind.admits(value),
        }
    }
}

impl From<Kind> for Pattern<'_> {
    fn from(kind: Kind) -> Self {
        Pattern::Kind(kind)
    }
}

impl fmt::Debug for Pattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => f.write_str("Wildcard"),
            Pattern::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Pattern::Predicate(_) => f.write_str("Predicate(..)"),
            Pattern::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
        }
    }
}

/// One `(tag, pattern, handler)` entry.
pub struct Clause<'a, R> {
    tag: ClauseTag,
    pattern: Pattern<'a>,
    handler: Box<dyn FnOnce(Value) -> R + 'a>,
}

impl<'a, R> Clause<'a, R> {
    pub fn new(
        tag: ClauseTag,
        pattern: Pattern<'a>,
        handler: impl FnOnce(Value) -> R + 'a,
    ) -> Self {
        Self {
            tag,
            pattern,
            handler: Box::new(handler),
        }
    }

    pub fn tag(&self) -> ClauseTag {
        self.tag
    }

    pub fn pattern(&self) -> &Pattern<'a> {
        &self.pattern
    }

    /// Tag check first; the pattern only runs when the tag agrees.
    pub fn matches(&self, outcome: &Outcome) -> bool {
        self.tag.admits(outcome.tag()) && self.pattern.matches(outcome.value())
    }
}

/// Ordered set of clauses producing an `R`.
pub struct Matcher<'a, R> {
    clauses: Vec<Clause<'a, R>>,
}

impl<R> Default for Matcher<'_, R> {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }
}

impl<'a, R> Matcher<'a, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clause(&mut self, clause: Clause<'a, R>) -> &mut Self {
        self.clauses.push(clause);
        self
    }

    /// Any success.
    pub fn success(&mut self, handler: impl FnOnce(Value) -> R + 'a) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Success, Pattern::Wildcard, handler))
    }

    pub fn success_when(
        &mut self,
        pattern: Pattern<'a>,
        handler: impl FnOnce(Value) -> R + 'a,
    ) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Success, pattern, handler))
    }

    /// Any failure.
    pub fn failure(&mut self, handler: impl FnOnce(Value) -> R + 'a) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Failure, Pattern::Wildcard, handler))
    }

    pub fn failure_when(
        &mut self,
        pattern: Pattern<'a>,
        handler: impl FnOnce(Value) -> R + 'a,
    ) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Failure, pattern, handler))
    }

    /// Either variant, any payload.
    pub fn either(&mut self, handler: impl FnOnce(Value) -> R + 'a) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Either, Pattern::Wildcard, handler))
    }

    /// Either variant, filtered by `pattern`.
    pub fn either_when(
        &mut self,
        pattern: Pattern<'a>,
        handler: impl FnOnce(Value) -> R + 'a,
    ) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Either, pattern, handler))
    }

    /// Catch-all: either variant, any payload.
    pub fn any(&mut self, handler: impl FnOnce(Value) -> R + 'a) -> &mut Self {
        self.clause(Clause::new(ClauseTag::Either, Pattern::Wildcard, handler))
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Run the first matching clause's handler with the payload.
    pub fn evaluate(self, outcome: Outcome) -> Result<R, NoMatchError> {
        let clauses = self.clauses.len();
        let winner = self
            .clauses
            .into_iter()
            .enumerate()
            .find(|(_, clause)| clause.matches(&outcome));

        match winner {
            Some((index, clause)) => {
                debug!(clause = index, tag = %outcome.tag(), "clause matched");
                Ok((clause.handler)(outcome.into_value()))
            }
            None => {
                debug!(clauses, tag = %outcome.tag(), "no clause matched");
                Err(NoMatchError { outcome, clauses })
            }
        }
    }
}

/// Declare clauses with `declare` and evaluate them against `outcome`.
///
/// ```
/// use verdict::core::outcome::Outcome;
/// use verdict::matcher::{Pattern, match_outcome};
///
/// let reply = match_outcome(Outcome::success(1), |m| {
///     m.success_when(Pattern::literal(1), |_| "one")
///         .success(|_| "other")
///         .any(|_| "catch-all");
/// })
/// .unwrap();
/// assert_eq!(reply, "one");
/// ```
pub fn match_outcome<'a, R>(
    outcome: Outcome,
    declare: impl FnOnce(&mut Matcher<'a, R>),
) -> Result<R, NoMatchError> {
    let mut matcher = Matcher::new();
    declare(&mut matcher);
    matcher.evaluate(outcome)
}
