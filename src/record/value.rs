//! Scalar field values
//!
//! This module defines how scalar record field values are represented
//! while they move between records and the value codec.

use std::fmt;

use super::FieldKind;

/// A scalar value held by a record field
#[derive(Debug, Clone)]
pub enum ScalarValue {
    /// 32-bit integer (also carries enum numbers)
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// UTF-8 string
    String(String),
    /// Boolean
    Bool(bool),
    /// Single-precision float
    Float(f32),
    /// Double-precision float
    Double(f64),
}

// Floats compare bitwise so round-trip checks treat NaN payloads as equal
impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a == b,
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a == b,
            (ScalarValue::String(a), ScalarValue::String(b)) => a == b,
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a == b,
            (ScalarValue::Float(a), ScalarValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ScalarValue::Double(a), ScalarValue::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl ScalarValue {
    /// Field kind this value belongs to
    pub fn kind(&self) -> FieldKind {
        match self {
            ScalarValue::Int32(_) => FieldKind::Int32,
            ScalarValue::Int64(_) => FieldKind::Int64,
            ScalarValue::String(_) => FieldKind::String,
            ScalarValue::Bool(_) => FieldKind::Bool,
            ScalarValue::Float(_) => FieldKind::Float,
            ScalarValue::Double(_) => FieldKind::Double,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Int32(_) => "INT32",
            ScalarValue::Int64(_) => "INT64",
            ScalarValue::String(_) => "STRING",
            ScalarValue::Bool(_) => "BOOL",
            ScalarValue::Float(_) => "FLOAT",
            ScalarValue::Double(_) => "DOUBLE",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int32(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::String(v) => write!(f, "'{}'", v),
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Double(v) => write!(f, "{}", v),
        }
    }
}
