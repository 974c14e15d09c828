//! # Minipas Static Types
//!
//! Every expression in a checked program carries one of these resolved types.
//! There is no implicit promotion between `INTEGER` and `FLOAT`; arrays are
//! fixed-size with inclusive integer bounds.
//!
//! The [`checker`] module walks the AST once, building a chain of
//! [`symbols::ScopedSymbolTable`]s and annotating expression nodes in place.

pub mod checker;
pub mod symbols;

pub use checker::SemanticAnalyzer;
pub use symbols::{BuiltinTypeSymbol, ScopedSymbolTable, Symbol, VarSymbol};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source-level type representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// 64-bit signed integer; also the boolean type (0 / non-zero)
    Integer,
    /// 64-bit floating point
    Float,
    /// Fixed-size array with inclusive bounds
    Array(ArrayType),
}

/// Shape of an `ARRAY[start..end] OF element` type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayType {
    /// Lowest valid index
    pub start: i64,
    /// Highest valid index
    pub end: i64,
    /// Type of every element
    pub element: Box<Type>,
}

/// Upper bound on the number of scalar cells one declaration may allocate
pub const MAX_ARRAY_CELLS: u64 = 1 << 24;

impl ArrayType {
    /// Number of elements; zero when `start > end`
    pub fn len(&self) -> usize {
        let count = (i128::from(self.end) - i128::from(self.start) + 1).max(0);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// True when the bounds describe no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Type {
    /// Check if this type is INTEGER or FLOAT
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// Total scalar cells a value of this type occupies, `None` on overflow
    pub fn cells(&self) -> Option<u64> {
        match self {
            Type::Integer | Type::Float => Some(1),
            Type::Array(array) => {
                let len = array.end.checked_sub(array.start)?.checked_add(1)?;
                u64::try_from(len).ok()?.checked_mul(array.element.cells()?)
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "INTEGER"),
            Type::Float => write!(f, "FLOAT"),
            Type::Array(array) => write!(
                f,
                "ARRAY[{}..{}] OF {}",
                array.start, array.end, array.element
            ),
        }
    }
}
