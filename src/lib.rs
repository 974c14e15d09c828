//! # Minipas - A Small Pascal-like Language
//!
//! A complete front end and tree-walking interpreter for a statically-typed,
//! Pascal-like imperative language: lexical scanning, recursive-descent
//! parsing, scope-aware type checking, and direct AST evaluation.
//!
//! Given program source text, the pipeline either reports a precisely located
//! lexical, syntax, semantic or runtime error, or runs the program against an
//! in-memory variable store and the supplied input/output streams.
//!
//! ## Quick Start
//!
//! ```rust
//! use minipas::{run_source_with_io, InterpreterOptions, Value};
//! use std::io::Cursor;
//!
//! # fn main() -> minipas::Result<()> {
//! let code = r#"
//!     PROGRAM Sum;
//!     VAR i, total: INTEGER;
//!     BEGIN
//!         i := 1;
//!         WHILE i <= 10 DO
//!         BEGIN
//!             total := total + i;
//!             i := i + 1
//!         END;
//!         WRITE(total)
//!     END.
//! "#;
//!
//! let mut output = Vec::new();
//! let store = run_source_with_io(
//!     code,
//!     Cursor::new(""),
//!     &mut output,
//!     InterpreterOptions::default(),
//! )?;
//!
//! assert_eq!(store["total"], Value::Int(55));
//! assert_eq!(String::from_utf8_lossy(&output), "55");
//! # Ok(())
//! # }
//! ```
//!
//! ### Stage by Stage
//!
//! Each stage can also be driven on its own:
//!
//! ```rust
//! use minipas::{Interpreter, InterpreterOptions, Parser, Scanner, SemanticAnalyzer, Value};
//! use std::io::Cursor;
//!
//! # fn main() -> minipas::Result<()> {
//! let code = "PROGRAM T; VAR x, y: INTEGER; BEGIN x := 5; y := x + 3 END.";
//!
//! // Tokenize (scan)
//! let tokens = Scanner::new(code).scan_tokens()?;
//! assert_eq!(tokens.last().map(|t| t.kind), Some(minipas::TokenKind::Eof));
//!
//! // Parse into AST (the parser pulls tokens on demand)
//! let mut program = Parser::from_source(code)?.parse()?;
//!
//! // Resolve names and annotate types
//! SemanticAnalyzer::new().analyze(&mut program)?;
//!
//! // Execute
//! let mut interpreter =
//!     Interpreter::with_io(Cursor::new(""), Vec::new(), InterpreterOptions::default());
//! let store = interpreter.execute(&program)?;
//!
//! assert_eq!(store["y"], Value::Int(8));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! ### Data Types
//!
//! - **INTEGER**: 64-bit signed; doubles as the boolean type (0 is false)
//! - **FLOAT**: 64-bit floating point
//! - **ARRAY[lo..hi] OF T**: fixed-size, inclusive bounds
//!
//! `INTEGER` and `FLOAT` never mix implicitly inside an expression. Use
//! `INT(expr)` (truncates toward zero) and `FLOAT(expr)` to convert.
//!
//! ### Statements
//!
//! - `x := expr`, `a[i] := expr` - Assignment
//! - `IF cond THEN stmt ELSE stmt` - Conditional execution
//! - `WHILE cond DO stmt` - Loop while the condition is non-zero
//! - `BEGIN stmt; stmt END` - Sequencing
//! - `READ(x)` / `WRITE(expr)` / `WRITE('text')` - Console I/O
//!
//! ### Operators
//!
//! - **Arithmetic**: `+ - * /` (`/` is true division), `%` (integers only)
//! - **Comparison**: `= <> < <= > >=` (yield 0 or 1)
//! - **Logical**: `AND OR NOT`
//!
//! Keywords are case-insensitive; identifiers are case-sensitive. Comments are
//! written `{ like this }`.
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → SemanticAnalyzer → Interpreter → Store
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source code on demand
//! - [`Parser`] - Builds the Abstract Syntax Tree (AST)
//! - [`SemanticAnalyzer`] - Resolves names and annotates every expression with its type
//! - [`Interpreter`] - Executes the analyzed AST
//! - [`Value`] - Runtime value representation
//! - [`Environment`] - Variable storage as a stack of frames
//!
//! ## Error Handling
//!
//! Every stage returns [`Result`]; errors carry their stage and source position:
//!
//! ```rust
//! use minipas::{run_source_with_io, ErrorKind, InterpreterOptions};
//! use std::io::Cursor;
//!
//! let code = "PROGRAM T; VAR x: INTEGER; BEGIN x := 0; WRITE(10 / x) END.";
//! let err = run_source_with_io(code, Cursor::new(""), Vec::new(), InterpreterOptions::default())
//!     .unwrap_err();
//!
//! assert_eq!(err.kind(), ErrorKind::Runtime);
//! assert_eq!(err.to_string(), "Runtime error at line 1, column 51: Division by zero");
//! ```

/// Version of the Minipas interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod types;

use std::collections::HashMap;
use std::io::{BufRead, Write};

// Re-export main types
pub use error::{Error, ErrorKind, Position, Result};
pub use lexer::{Scanner, Token, TokenKind, TokenStream, TokenValue};
pub use parser::{Expression, Parser, Program, Statement};
pub use runtime::{Environment, Interpreter, InterpreterOptions, Value};
pub use types::{ScopedSymbolTable, SemanticAnalyzer, Type};

/// Parses and analyzes `source`, returning the fully annotated program
pub fn analyze_source(source: &str) -> Result<Program> {
    let mut program = Parser::from_source(source)?.parse()?;
    SemanticAnalyzer::new().analyze(&mut program)?;
    Ok(program)
}

/// Runs `source` through the whole pipeline against the process console
pub fn run_source(source: &str) -> Result<HashMap<String, Value>> {
    let program = analyze_source(source)?;
    Interpreter::new().execute(&program)
}

/// Runs `source` through the whole pipeline against the given streams
pub fn run_source_with_io<R: BufRead, W: Write>(
    source: &str,
    input: R,
    output: W,
    options: InterpreterOptions,
) -> Result<HashMap<String, Value>> {
    let program = analyze_source(source)?;
    Interpreter::with_io(input, output, options).execute(&program)
}
