//! Error types for the Minipas pipeline
//!
//! Each stage fails fast with exactly one of four error kinds. The position,
//! when known, points at the token or character that triggered the failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Source location (both 1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number
    pub line: usize,
    /// Column number
    pub column: usize,
}

impl Position {
    /// Creates a new position
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

fn located(position: &Option<Position>) -> String {
    match position {
        Some(pos) => format!(" at {}", pos),
        None => String::new(),
    }
}

/// Minipas pipeline errors, one variant per stage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Scanner failure
    ///
    /// **Triggered by:** unterminated comment or string, unrecognized character,
    /// malformed numeric literal
    /// **Example:** `x := 'abc` (string never closed)
    #[error("Lexical error{}: {message}", located(.position))]
    Lexical {
        /// Error description
        message: String,
        /// Where scanning stopped
        position: Option<Position>,
    },

    /// Parser failure
    ///
    /// **Triggered by:** a token of the wrong kind at an expected grammar
    /// position, or tokens left over after the closing `.`
    /// **Example:** `PROGRAM T BEGIN END.` (missing `;`)
    #[error("Syntax error{}: {message}", located(.position))]
    Syntax {
        /// Error description
        message: String,
        /// Position of the offending token
        position: Option<Position>,
    },

    /// Semantic analysis failure
    ///
    /// **Triggered by:** unknown type, duplicate declaration, unresolved
    /// identifier, operand type mismatch, non-integer condition
    /// **Example:** `x := x + y` with `x: INTEGER` and `y: FLOAT`
    #[error("Semantic error{}: {message}", located(.position))]
    Semantic {
        /// Error description
        message: String,
        /// Position of the offending token
        position: Option<Position>,
    },

    /// Interpretation failure
    ///
    /// **Triggered by:** unbound variable, division by zero, malformed READ
    /// input, index out of bounds, integer overflow
    /// **Example:** `x := 5 / 0`
    #[error("Runtime error{}: {message}", located(.position))]
    Runtime {
        /// Error description
        message: String,
        /// Position of the offending token, if known
        position: Option<Position>,
    },
}

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Scanner
    Lexical,
    /// Parser
    Syntax,
    /// Semantic analyzer
    Semantic,
    /// Interpreter
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Runtime => "runtime",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a lexical error
    pub fn lexical(message: impl Into<String>, position: Option<Position>) -> Self {
        Error::Lexical {
            message: message.into(),
            position,
        }
    }

    /// Create a syntax error
    pub fn syntax(message: impl Into<String>, position: Option<Position>) -> Self {
        Error::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Create a semantic error
    pub fn semantic(message: impl Into<String>, position: Option<Position>) -> Self {
        Error::Semantic {
            message: message.into(),
            position,
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>, position: Option<Position>) -> Self {
        Error::Runtime {
            message: message.into(),
            position,
        }
    }

    /// Classify the error by stage
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Lexical { .. } => ErrorKind::Lexical,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::Semantic { .. } => ErrorKind::Semantic,
            Error::Runtime { .. } => ErrorKind::Runtime,
        }
    }

    /// Human-readable description without the kind prefix or location
    pub fn message(&self) -> &str {
        match self {
            Error::Lexical { message, .. }
            | Error::Syntax { message, .. }
            | Error::Semantic { message, .. }
            | Error::Runtime { message, .. } => message,
        }
    }

    /// Source location, if known
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lexical { position, .. }
            | Error::Syntax { position, .. }
            | Error::Semantic { position, .. }
            | Error::Runtime { position, .. } => *position,
        }
    }
}

/// Result type for Minipas operations
pub type Result<T> = std::result::Result<T, Error>;
