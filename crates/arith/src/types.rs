//! Core numeric types and errors.

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde_json::Value;

/// A JSON number as the calculator sees it.
///
/// Integers stay integers for as long as the arithmetic allows it, so that
/// `1 + 2 + 3` reports `6` and not `6.0`. Any float operand, an overflow, or
/// a division turns the value into a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Interpret a JSON value as a number. Returns `None` for non-numbers.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Number::Int)
                .or_else(|| n.as_f64().map(Number::Float)),
            _ => None,
        }
    }

    /// Convert back into JSON. Non-finite floats cannot be represented.
    pub fn to_json(self) -> CalcResult<Value> {
        match self {
            Number::Int(n) => Ok(Value::from(n)),
            Number::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or(CalcError::NonFinite),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! int_or_float {
    ($trait:ident, $method:ident, $checked:ident, $op:tt) => {
        impl $trait for Number {
            type Output = Number;

            fn $method(self, rhs: Number) -> Number {
                match (self, rhs) {
                    (Number::Int(a), Number::Int(b)) => a
                        .$checked(b)
                        .map(Number::Int)
                        .unwrap_or(Number::Float(a as f64 $op b as f64)),
                    (a, b) => Number::Float(a.as_f64() $op b.as_f64()),
                }
            }
        }
    };
}

int_or_float!(Add, add, checked_add, +);
int_or_float!(Sub, sub, checked_sub, -);
int_or_float!(Mul, mul, checked_mul, *);

/// The four supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CalcError::UnknownOperation(s.to_string()))
    }
}

/// Errors that can occur while evaluating an operation.
///
/// The messages are user facing: they are reported verbatim to clients.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("At least two numbers are required")]
    NotEnoughNumbers,

    #[error("Division by zero is not allowed")]
    DivisionByZero,

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Result is not a finite number")]
    NonFinite,
}

/// Convenience result type.
pub type CalcResult<T> = Result<T, CalcError>;
