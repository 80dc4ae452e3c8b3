//! Compile-time constant values.
//!
//! A [`Value`] is what the front end knows about an operand before the
//! program runs: literals and folded constants. They end up in the
//! constant pool of the finalized code and are what the constant-return
//! recognizer hands back to call sites.

use std::fmt;

use ordered_float::OrderedFloat;

/// A compile-time constant.
///
/// Floats are wrapped in [`OrderedFloat`] so constants can be hashed and
/// deduplicated by the constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// The `None` singleton.
    None,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// 64-bit float.
    Float(OrderedFloat<f64>),
    /// String.
    Str(String),
}

impl Value {
    /// Create a float constant.
    pub fn float(value: f64) -> Self {
        Value::Float(OrderedFloat(value))
    }

    /// Create a string constant.
    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{:?}", v.0),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}
