//! Lexical analysis for Minipas
//!
//! Converts source text into a lazily produced stream of positioned tokens.

mod scanner;
mod token;

pub use scanner::{Scanner, TokenBuffer, TokenStream};
pub use token::{Token, TokenKind, TokenValue};
