use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Type;

/// Runtime value representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit integer value; also the boolean representation
    Int(i64),
    /// 64-bit floating-point value
    Float(f64),
    /// Fixed-size array
    Array {
        /// Index of the first element
        start: i64,
        /// Elements in index order
        elements: Vec<Value>,
    },
}

impl Value {
    /// Default value for a declared type: 0, 0.0 or a default-filled array
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Integer => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Array(array) => Value::Array {
                start: array.start,
                elements: vec![Value::default_for(&array.element); array.len()],
            },
        }
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Array { .. } => "array",
        }
    }

    /// Zero is false, everything else is true
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Array { elements, .. } => !elements.is_empty(),
        }
    }

    /// Numeric view of a scalar; `None` for arrays
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Array { .. } => None,
        }
    }

    /// Builds a boolean result using the 0 / 1 convention
    pub fn from_bool(b: bool) -> Value {
        Value::Int(i64::from(b))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Array { elements, .. } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}
