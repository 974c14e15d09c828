use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Position;

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Literal payload (identifier/keyword text, number, string body)
    pub value: TokenValue,
    /// Line number where token starts (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, value: TokenValue, line: usize, column: usize) -> Self {
        Token {
            kind,
            value,
            line,
            column,
        }
    }

    /// Position of the token's first character
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Text payload, or an empty string for numeric / valueless tokens
    pub fn text(&self) -> &str {
        match &self.value {
            TokenValue::Text(s) => s,
            _ => "",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token({}, {}, position={}:{})",
            self.kind, self.value, self.line, self.column
        )
    }
}

/// Payload carried by a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenValue {
    /// Identifier, keyword (uppercased), operator or string text
    Text(String),
    /// Integer literal value
    Integer(i64),
    /// Floating-point literal value
    Float(f64),
    /// No payload (end of input)
    None,
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Text(s) => write!(f, "'{}'", s),
            TokenValue::Integer(n) => write!(f, "{}", n),
            TokenValue::Float(x) => write!(f, "{:?}", x),
            TokenValue::None => write!(f, "None"),
        }
    }
}

/// All possible token types in Minipas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    /// PROGRAM keyword
    Program,
    /// VAR keyword
    Var,
    /// INTEGER keyword
    Integer,
    /// FLOAT keyword
    Float,
    /// ARRAY keyword
    Array,
    /// OF keyword
    Of,
    /// BEGIN keyword
    Begin,
    /// END keyword
    End,
    /// IF keyword
    If,
    /// THEN keyword
    Then,
    /// ELSE keyword
    Else,
    /// WHILE keyword
    While,
    /// DO keyword
    Do,
    /// READ keyword
    Read,
    /// WRITE keyword
    Write,
    /// AND keyword
    And,
    /// OR keyword
    Or,
    /// NOT keyword
    Not,

    // Operators
    /// Plus operator (+)
    Plus,
    /// Minus operator (-)
    Minus,
    /// Multiplication operator (*)
    Mul,
    /// Division operator (/)
    Div,
    /// Modulo operator (%)
    Mod,
    /// Assignment operator (:=)
    Assign,
    /// Equality operator (=)
    Equal,
    /// Inequality operator (<>)
    NotEqual,
    /// Less than operator (<)
    Less,
    /// Less than or equal operator (<=)
    LessEqual,
    /// Greater than operator (>)
    Greater,
    /// Greater than or equal operator (>=)
    GreaterEqual,

    // Delimiters
    /// Semicolon
    Semi,
    /// Comma
    Comma,
    /// Colon
    Colon,
    /// Dot (program terminator)
    Dot,
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Left bracket
    LBrack,
    /// Right bracket
    RBrack,
    /// Range operator (..)
    DotDot,

    // Literals
    /// Identifier
    Id,
    /// Integer literal
    IntConst,
    /// Floating-point literal
    FloatConst,
    /// String literal
    String,

    // Special
    /// End of input marker
    Eof,
}

impl TokenKind {
    /// Look up a keyword, case-insensitively
    pub fn keyword(s: &str) -> Option<TokenKind> {
        let kind = match s.to_ascii_uppercase().as_str() {
            "PROGRAM" => TokenKind::Program,
            "VAR" => TokenKind::Var,
            "INTEGER" => TokenKind::Integer,
            "FLOAT" => TokenKind::Float,
            "ARRAY" => TokenKind::Array,
            "OF" => TokenKind::Of,
            "BEGIN" => TokenKind::Begin,
            "END" => TokenKind::End,
            "IF" => TokenKind::If,
            "THEN" => TokenKind::Then,
            "ELSE" => TokenKind::Else,
            "WHILE" => TokenKind::While,
            "DO" => TokenKind::Do,
            "READ" => TokenKind::Read,
            "WRITE" => TokenKind::Write,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical upper-case name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Program => "PROGRAM",
            TokenKind::Var => "VAR",
            TokenKind::Integer => "INTEGER",
            TokenKind::Float => "FLOAT",
            TokenKind::Array => "ARRAY",
            TokenKind::Of => "OF",
            TokenKind::Begin => "BEGIN",
            TokenKind::End => "END",
            TokenKind::If => "IF",
            TokenKind::Then => "THEN",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Do => "DO",
            TokenKind::Read => "READ",
            TokenKind::Write => "WRITE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Mul => "MUL",
            TokenKind::Div => "DIV",
            TokenKind::Mod => "MOD",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Equal => "EQUAL",
            TokenKind::NotEqual => "NOT_EQUAL",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::Semi => "SEMI",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Dot => "DOT",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrack => "LBRACK",
            TokenKind::RBrack => "RBRACK",
            TokenKind::DotDot => "DOTDOT",
            TokenKind::Id => "ID",
            TokenKind::IntConst => "INT_CONST",
            TokenKind::FloatConst => "FLOAT_CONST",
            TokenKind::String => "STRING",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("begin"), Some(TokenKind::Begin));
        assert_eq!(TokenKind::keyword("BEGIN"), Some(TokenKind::Begin));
        assert_eq!(TokenKind::keyword("Begin"), Some(TokenKind::Begin));
        assert_eq!(TokenKind::keyword("not_a_keyword"), None);
        assert_eq!(TokenKind::keyword("int"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::NotEqual.to_string(), "NOT_EQUAL");
        let tok = Token::new(
            TokenKind::Id,
            TokenValue::Text("x".to_string()),
            2,
            7,
        );
        assert_eq!(tok.to_string(), "Token(ID, 'x', position=2:7)");
        assert_eq!(tok.position(), Position::new(2, 7));
    }
}
