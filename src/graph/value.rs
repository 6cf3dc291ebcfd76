//! Runtime values and the numeric comparison tolerance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The atomic unit of data flowing through the graph.
///
/// Arithmetic stays in `Int` only while both operands are integers; mixing
/// promotes to `Float`. `Bool` is produced by equality operations and is not
/// a valid arithmetic operand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Value::Bool(_))
    }

    #[inline(always)]
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Tolerance-aware equality. Integer pairs compare exactly; any pair
    /// involving a float compares with the given tolerance; booleans only
    /// ever equal booleans.
    pub fn approx_eq(&self, other: &Value, tolerance: &Tolerance) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Bool(_), _) | (_, Value::Bool(_)) => false,
            _ => {
                let a = self.as_f64();
                let b = other.as_f64();
                // The exact-equality guard keeps infinities comparable.
                a == b || (a - b).abs() <= f64::max(tolerance.rel * f64::max(a.abs(), b.abs()), tolerance.abs)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Relative/absolute tolerance for numeric comparisons.
///
/// The defaults match `isclose`-style semantics: relative 1e-9, absolute 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rel: f64,
    pub abs: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rel: 1e-9, abs: 0.0 }
    }
}
