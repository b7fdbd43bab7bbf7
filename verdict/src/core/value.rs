//! Dynamic payloads carried by an [`Outcome`].
//!
//! An outcome may hold any value, including another outcome or a captured
//! error. [`Value`] is the closed set of shapes a payload can take; [`Kind`]
//! names those shapes (plus a few umbrella kinds) so the matcher can dispatch
//! on a payload's runtime type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::outcome::{Outcome, Tag};

/// Payload of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A nested outcome of the opposite variant (same-variant nesting is
    /// flattened on construction).
    Outcome(Box<Outcome>),
    /// An error captured at a `Try` boundary.
    Fault(Fault),
}

impl Value {
    /// Runtime kind of this value. Never returns an umbrella kind.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Outcome(_) => Kind::Outcome,
            Value::Fault(_) => Kind::Fault,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_outcome(&self) -> Option<&Outcome> {
        match self {
            Value::Outcome(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Value::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Equality that also treats an `Int` and a `Float` holding exactly the
    /// same number as equal, recursing through lists, maps and outcomes.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                int_equals_float(*i, *f)
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
            }
            (Value::Outcome(a), Value::Outcome(b)) => {
                a.tag() == b.tag() && a.value().loose_eq(b.value())
            }
            _ => self == other,
        }
    }

    /// Convert to a JSON document.
    ///
    /// Nested outcomes become single-key objects (`{"Success": ..}`), faults
    /// become `{"error": .., "causes": [..]}`, and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Nil => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Outcome(outcome) => {
                let mut object = serde_json::Map::new();
                object.insert(outcome.tag().as_str().to_string(), outcome.value().to_json());
                Json::Object(object)
            }
            Value::Fault(fault) => fault.to_json(),
        }
    }

    /// Build a value from a JSON document.
    ///
    /// An object whose only key is `"Success"` or `"Failure"` decodes as a
    /// nested outcome; serializing a map of that shape is an error, so
    /// serialized values read back unchanged. Faults do not survive the trip;
    /// they decode as maps.
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            Json::Object(object) => {
                if object.len() == 1 {
                    let tag = object.keys().next().and_then(|key| Tag::parse(key));
                    if let Some(tag) = tag {
                        let payload = object.into_iter().next().map(|(_, v)| v);
                        let payload = payload.map(Value::from_json).unwrap_or_default();
                        return Value::Outcome(Box::new(Outcome::new(tag, payload)));
                    }
                }
                Value::Map(
                    object
                        .into_iter()
                        .map(|(key, value)| (key, Value::from_json(value)))
                        .collect(),
                )
            }
        }
    }
}

/// `f` is integral, in `i64` range, and equal to `i` without rounding.
fn int_equals_float(i: i64, f: f64) -> bool {
    // 2^63 is exactly representable; anything at or above it overflows i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Outcome(outcome) => write!(f, "{outcome}"),
            Value::Fault(fault) => write!(f, "{fault}"),
        }
    }
}

/// The key of a map that is indistinguishable from a serialized outcome.
fn outcome_shaped_key(entries: &BTreeMap<String, Value>) -> Option<&str> {
    match entries.keys().next() {
        Some(key) if entries.len() == 1 && Tag::parse(key).is_some() => Some(key),
        _ => None,
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(entries) => match outcome_shaped_key(entries) {
                Some(key) => Err(S::Error::custom(format!(
                    "map with the single key \"{key}\" would read back as an outcome"
                ))),
                None => serializer.collect_map(entries),
            },
            Value::Outcome(outcome) => outcome.serialize(serializer),
            Value::Fault(fault) => fault.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! int_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

int_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<Outcome> for Value {
    fn from(outcome: Outcome) -> Self {
        Value::Outcome(Box::new(outcome))
    }
}

impl From<Fault> for Value {
    fn from(fault: Fault) -> Self {
        Value::Fault(fault)
    }
}

impl From<anyhow::Error> for Value {
    fn from(error: anyhow::Error) -> Self {
        Value::Fault(Fault::new(error))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

/// An error captured as a payload.
///
/// The original error is kept so callers can recover their own error type
/// with [`Fault::downcast_ref`].
#[derive(Clone)]
pub struct Fault {
    error: Arc<anyhow::Error>,
}

impl Fault {
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error: Arc::new(error),
        }
    }

    /// Top-level error message.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Messages of the underlying source chain, outermost first.
    pub fn causes(&self) -> Vec<String> {
        self.error.chain().skip(1).map(ToString::to_string).collect()
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message(),
            "causes": self.causes(),
        })
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("message", &self.message())
            .field("causes", &self.causes())
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

/// Faults compare by their rendered error chain.
impl PartialEq for Fault {
    fn eq(&self, other: &Self) -> bool {
        self.error
            .chain()
            .map(ToString::to_string)
            .eq(other.error.chain().map(ToString::to_string))
    }
}

impl Serialize for Fault {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("error", &self.message())?;
        map.serialize_entry("causes", &self.causes())?;
        map.end()
    }
}

/// Type tag for payload dispatch.
///
/// `Number`, `Collection` and `Any` are umbrella kinds: they are never the
/// runtime kind of a value but admit several concrete kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Outcome,
    Fault,
    Number,
    Collection,
    Any,
}

impl Kind {
    /// True if `value`'s runtime kind is `self` or falls under it.
    pub fn admits(self, value: &Value) -> bool {
        match self {
            Kind::Any => true,
            Kind::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            Kind::Collection => matches!(value, Value::List(_) | Value::Map(_)),
            concrete => value.kind() == concrete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Outcome => "outcome",
            Kind::Fault => "fault",
            Kind::Number => "number",
            Kind::Collection => "collection",
            Kind::Any => "any",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
