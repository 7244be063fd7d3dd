use std::borrow::Cow;

use chrono::NaiveDateTime;
use serde::Serialize;

/// A generated value for a database column.
///
/// The `String` variant uses `Cow<'static, str>` so fixed literals stay
/// borrowed while generated text is owned. Serializes as the plain JSON
/// value, without a variant tag; `Json` nests as an object, not a string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used when a value has to travel as a string parameter.
    /// `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.to_string()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::Json(j) => Some(j.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}
