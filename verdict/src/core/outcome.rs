//! The two-variant outcome type and its combinators.

use std::fmt;
use std::ops::Shl;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::value::{Fault, Value};
use crate::error::NotAnOutcomeError;

/// Variant of an [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Success,
    Failure,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Success => "Success",
            Tag::Failure => "Failure",
        }
    }

    /// Parse the serialized tag name (`"Success"` / `"Failure"`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Success" => Some(Tag::Success),
            "Failure" => Some(Tag::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an operation that may succeed or fail.
///
/// Fields are private so every outcome goes through [`Outcome::new`], which
/// collapses same-variant nesting: `success(success(v))` is `success(v)`.
/// Opposite-variant nesting is kept as a nested payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    tag: Tag,
    value: Value,
}

impl Outcome {
    pub fn new(tag: Tag, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Outcome(inner) if inner.tag == tag => *inner,
            value => Self { tag, value },
        }
    }

    pub fn success(value: impl Into<Value>) -> Self {
        Self::new(Tag::Success, value)
    }

    pub fn failure(value: impl Into<Value>) -> Self {
        Self::new(Tag::Failure, value)
    }

    /// Wrap a plain value as a success; an outcome passes through unchanged.
    pub fn lift(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Outcome(inner) => *inner,
            value => Self::success(value),
        }
    }

    /// Run a fallible closure once, turning its error into a failure.
    ///
    /// A returned outcome is used as is.
    pub fn capture<T: Into<Value>>(f: impl FnOnce() -> anyhow::Result<T>) -> Self {
        match f() {
            Ok(value) => Self::lift(value),
            Err(err) => Self::failure(Fault::new(err)),
        }
    }

    /// Collect the payloads of all successes into a list, or return the first failure.
    pub fn sequence(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let mut values = Vec::new();
        for outcome in outcomes {
            match outcome.tag {
                Tag::Success => values.push(outcome.value),
                Tag::Failure => return outcome,
            }
        }
        Self::success(Value::List(values))
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn is_success(&self) -> bool {
        self.tag == Tag::Success
    }

    pub fn is_failure(&self) -> bool {
        self.tag == Tag::Failure
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn into_parts(self) -> (Tag, Value) {
        (self.tag, self.value)
    }

    pub fn into_result(self) -> Result<Value, Value> {
        match self.tag {
            Tag::Success => Ok(self.value),
            Tag::Failure => Err(self.value),
        }
    }

    /// Payload on success, `default` on failure.
    pub fn value_or(self, default: impl Into<Value>) -> Value {
        match self.tag {
            Tag::Success => self.value,
            Tag::Failure => default.into(),
        }
    }

    pub fn map<T: Into<Value>>(self, f: impl FnOnce(Value) -> T) -> Self {
        match self.tag {
            Tag::Success => Self::success(f(self.value)),
            Tag::Failure => self,
        }
    }

    pub fn map_failure<T: Into<Value>>(self, f: impl FnOnce(Value) -> T) -> Self {
        match self.tag {
            Tag::Success => self,
            Tag::Failure => Self::failure(f(self.value)),
        }
    }

    pub fn and(self, other: Outcome) -> Self {
        match self.tag {
            Tag::Success => other,
            Tag::Failure => self,
        }
    }

    pub fn and_then(self, f: impl FnOnce(Value) -> Outcome) -> Self {
        match self.tag {
            Tag::Success => f(self.value),
            Tag::Failure => self,
        }
    }

    pub fn or(self, other: Outcome) -> Self {
        match self.tag {
            Tag::Success => self,
            Tag::Failure => other,
        }
    }

    pub fn or_else(self, f: impl FnOnce(Value) -> Outcome) -> Self {
        match self.tag {
            Tag::Success => self,
            Tag::Failure => f(self.value),
        }
    }

    /// [`Outcome::and_then`] for callbacks that produce a dynamic [`Value`].
    ///
    /// The callback must return an outcome; anything else is reported as
    /// [`NotAnOutcomeError`] rather than wrapped.
    pub fn and_then_value(
        self,
        f: impl FnOnce(Value) -> Value,
    ) -> Result<Self, NotAnOutcomeError> {
        match self.tag {
            Tag::Success => expect_outcome("and_then", f(self.value)),
            Tag::Failure => Ok(self),
        }
    }

    /// [`Outcome::or_else`] for callbacks that produce a dynamic [`Value`].
    pub fn or_else_value(self, f: impl FnOnce(Value) -> Value) -> Result<Self, NotAnOutcomeError> {
        match self.tag {
            Tag::Success => Ok(self),
            Tag::Failure => expect_outcome("or_else", f(self.value)),
        }
    }

    /// Combine two outcomes: successes advance to the newer value, the first
    /// failure sticks.
    ///
    /// `Success(a) << Success(b) == Success(b)`,
    /// `Failure(a) << Failure(b) == Failure(a)`, and a failure on either side
    /// wins over a success.
    pub fn append(self, other: Outcome) -> Self {
        if self.is_failure() { self } else { other }
    }

    /// Call `f` with the outcome for its side effects and return the outcome.
    pub fn pipe(self, f: impl FnOnce(&Outcome)) -> Self {
        f(&self);
        self
    }
}

fn expect_outcome(combinator: &'static str, value: Value) -> Result<Outcome, NotAnOutcomeError> {
    match value {
        Value::Outcome(outcome) => Ok(*outcome),
        other => Err(NotAnOutcomeError {
            combinator,
            found: other.kind(),
        }),
    }
}

impl Shl for Outcome {
    type Output = Outcome;

    fn shl(self, rhs: Outcome) -> Outcome {
        self.append(rhs)
    }
}

impl<T: Into<Value>, E: Into<Value>> From<Result<T, E>> for Outcome {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::success(value),
            Err(err) => Outcome::failure(err),
        }
    }
}

/// Plain-text form is the payload's own; the tag is not printed.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.tag.as_str(), &self.value)?;
        map.end()
    }
}

#[derive(Deserialize)]
enum WireOutcome {
    Success(Value),
    Failure(Value),
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireOutcome::deserialize(deserializer)? {
            WireOutcome::Success(value) => Outcome::success(value),
            WireOutcome::Failure(value) => Outcome::failure(value),
        })
    }
}
