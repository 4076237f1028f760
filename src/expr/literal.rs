//! Literal values embedded in conditions and expressions

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::object_id::ObjectId;

/// A typed constant
///
/// Rendering follows extended-JSON conventions so that values plain JSON
/// cannot carry (non-finite floats, ids, datetimes) survive serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    ObjectId(ObjectId),
    DateTime(DateTime<Utc>),
    Array(Vec<Literal>),
}

impl Literal {
    pub fn nan() -> Self {
        Literal::Float(f64::NAN)
    }

    pub fn inf() -> Self {
        Literal::Float(f64::INFINITY)
    }

    pub fn ninf() -> Self {
        Literal::Float(f64::NEG_INFINITY)
    }

    /// Empty array literal
    pub fn empty_array() -> Self {
        Literal::Array(Vec::new())
    }

    /// Converts a JSON number into an Int or Float literal
    pub fn from_number(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < (i64::MAX as f64) {
            Literal::Int(value as i64)
        } else {
            Literal::Float(value)
        }
    }

    /// Converts an arbitrary JSON scalar (or array of scalars)
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Literal::Null,
            Value::Bool(b) => Literal::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Literal::Int(i),
                None => Literal::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Literal::String(s.clone()),
            Value::Array(items) => Literal::Array(items.iter().map(Literal::from_json).collect()),
            Value::Object(_) => Literal::String(value.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Renders the literal in the executor's JSON dialect
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => json!(i),
            Literal::Float(f) if f.is_nan() => json!({"$numberDouble": "NaN"}),
            Literal::Float(f) if f.is_infinite() && *f > 0.0 => {
                json!({"$numberDouble": "Infinity"})
            }
            Literal::Float(f) if f.is_infinite() => json!({"$numberDouble": "-Infinity"}),
            Literal::Float(f) => json!(f),
            Literal::String(s) => Value::String(s.clone()),
            Literal::ObjectId(id) => json!({"$oid": id.to_hex()}),
            Literal::DateTime(dt) => {
                json!({"$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true)})
            }
            Literal::Array(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(i)
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<ObjectId> for Literal {
    fn from(id: ObjectId) -> Self {
        Literal::ObjectId(id)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(dt: DateTime<Utc>) -> Self {
        Literal::DateTime(dt)
    }
}
