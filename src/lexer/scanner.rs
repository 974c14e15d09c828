use super::token::{Token, TokenKind, TokenValue};
use crate::error::{Error, Position, Result};

/// A pull-based source of tokens consumed by the parser
pub trait TokenStream {
    /// Produce the next token; once input is exhausted, keeps returning `Eof`
    fn next_token(&mut self) -> Result<Token>;
}

/// On-demand scanner for Minipas source text
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Index of the character under examination
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
        }
    }

    /// Scans the whole source, returning every token up to and including `Eof`
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                tracing::debug!(tokens = tokens.len(), "scan finished");
                return Ok(tokens);
            }
        }
    }

    fn scan_token(&mut self) -> Result<Token> {
        loop {
            if self.is_at_end() {
                return Ok(Token::new(
                    TokenKind::Eof,
                    TokenValue::None,
                    self.line,
                    self.column,
                ));
            }

            let c = self.peek();
            let (line, column) = (self.line, self.column);

            if c.is_whitespace() {
                self.advance();
                continue;
            }

            if c == '{' {
                self.skip_comment()?;
                continue;
            }

            if c == '\'' {
                return self.scan_string();
            }

            if c.is_alphabetic() || c == '_' {
                return Ok(self.scan_identifier_or_keyword());
            }

            if c.is_ascii_digit() {
                return self.scan_number();
            }

            self.advance();
            let kind = match c {
                ':' if self.match_char('=') => TokenKind::Assign,
                '<' if self.match_char('>') => TokenKind::NotEqual,
                '<' if self.match_char('=') => TokenKind::LessEqual,
                '>' if self.match_char('=') => TokenKind::GreaterEqual,
                '.' if self.match_char('.') => TokenKind::DotDot,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Mul,
                '/' => TokenKind::Div,
                '%' => TokenKind::Mod,
                '=' => TokenKind::Equal,
                '<' => TokenKind::Less,
                '>' => TokenKind::Greater,
                ';' => TokenKind::Semi,
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                '.' => TokenKind::Dot,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBrack,
                ']' => TokenKind::RBrack,
                _ => {
                    return Err(Error::lexical(
                        format!("Unexpected character: '{}'", c),
                        Some(Position::new(line, column)),
                    ));
                }
            };

            let lexeme = match kind {
                TokenKind::Assign => ":=".to_string(),
                TokenKind::NotEqual => "<>".to_string(),
                TokenKind::LessEqual => "<=".to_string(),
                TokenKind::GreaterEqual => ">=".to_string(),
                TokenKind::DotDot => "..".to_string(),
                _ => c.to_string(),
            };
            return Ok(Token::new(kind, TokenValue::Text(lexeme), line, column));
        }
    }

    /// Skips a `{ ... }` comment; comments do not nest
    fn skip_comment(&mut self) -> Result<()> {
        let opened = Position::new(self.line, self.column);
        self.advance(); // Opening {

        while !self.is_at_end() && self.peek() != '}' {
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::lexical("Unterminated comment", Some(opened)));
        }

        self.advance(); // Closing }
        Ok(())
    }

    /// Single-quoted string, taken verbatim (no escape sequences)
    fn scan_string(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        self.advance(); // Opening '

        let mut value = String::new();
        while !self.is_at_end() && self.peek() != '\'' {
            value.push(self.advance());
        }

        if self.is_at_end() {
            return Err(Error::lexical(
                "Unterminated string",
                Some(Position::new(line, column)),
            ));
        }

        self.advance(); // Closing '
        Ok(Token::new(
            TokenKind::String,
            TokenValue::Text(value),
            line,
            column,
        ))
    }

    fn scan_number(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        let start = self.current;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }

        // A second dot means a range (`1..10`), not a fraction
        let mut is_float = false;
        if !self.is_at_end() && self.peek() == '.' && self.peek_next() != Some('.') {
            is_float = true;
            self.advance();
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }

            if !self.is_at_end() && matches!(self.peek(), 'e' | 'E') {
                self.advance();
                if !self.is_at_end() && matches!(self.peek(), '+' | '-') {
                    self.advance();
                }
                let exponent_start = self.current;
                while !self.is_at_end() && self.peek().is_ascii_digit() {
                    self.advance();
                }
                if self.current == exponent_start {
                    let text: String = self.source[start..self.current].iter().collect();
                    return Err(Error::lexical(
                        format!("Invalid float literal: {}", text),
                        Some(Position::new(line, column)),
                    ));
                }
            }
        }

        let text: String = self.source[start..self.current].iter().collect();

        if is_float {
            let value: f64 = text.parse().map_err(|_| {
                Error::lexical(
                    format!("Invalid float literal: {}", text),
                    Some(Position::new(line, column)),
                )
            })?;
            Ok(Token::new(
                TokenKind::FloatConst,
                TokenValue::Float(value),
                line,
                column,
            ))
        } else {
            let value: i64 = text.parse().map_err(|_| {
                Error::lexical(
                    format!("Integer literal {} is out of range", text),
                    Some(Position::new(line, column)),
                )
            })?;
            Ok(Token::new(
                TokenKind::IntConst,
                TokenValue::Integer(value),
                line,
                column,
            ))
        }
    }

    fn scan_identifier_or_keyword(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let start = self.current;

        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            self.advance();
        }

        let text: String = self.source[start..self.current].iter().collect();

        match TokenKind::keyword(&text) {
            Some(kind) => Token::new(
                kind,
                TokenValue::Text(text.to_ascii_uppercase()),
                line,
                column,
            ),
            None => Token::new(TokenKind::Id, TokenValue::Text(text), line, column),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Consumes the current character. A newline bumps the line and resets
    /// the column before the position moves past it.
    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        }
        self.current += 1;
        if !self.is_at_end() {
            self.column += 1;
        }
        c
    }

    fn peek(&self) -> char {
        self.source[self.current]
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }
}

impl TokenStream for Scanner {
    fn next_token(&mut self) -> Result<Token> {
        let token = self.scan_token()?;
        tracing::trace!(token = %token, "scanned");
        Ok(token)
    }
}

/// Replays an already scanned token vector as a [`TokenStream`]
pub struct TokenBuffer {
    tokens: std::vec::IntoIter<Token>,
    last: Token,
}

impl TokenBuffer {
    /// Wraps a token vector; an `Eof` token is synthesized if it is missing
    pub fn new(tokens: Vec<Token>) -> Self {
        let last = match tokens.last() {
            Some(tok) => Token::new(TokenKind::Eof, TokenValue::None, tok.line, tok.column),
            None => Token::new(TokenKind::Eof, TokenValue::None, 1, 1),
        };
        TokenBuffer {
            tokens: tokens.into_iter(),
            last,
        }
    }
}

impl TokenStream for TokenBuffer {
    fn next_token(&mut self) -> Result<Token> {
        match self.tokens.next() {
            Some(token) => {
                if token.kind == TokenKind::Eof {
                    self.last = token.clone();
                }
                Ok(token)
            }
            None => Ok(self.last.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_program() {
        let tokens = kinds("PROGRAM T; BEGIN END.");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Program,
                TokenKind::Id,
                TokenKind::Semi,
                TokenKind::Begin,
                TokenKind::End,
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let tokens = kinds(":= <> <= >= .. : < > = .");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Assign,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::DotDot,
                TokenKind::Colon,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let mut scanner = Scanner::new("begin BEGIN Begin Counter");
        let tokens = scanner.scan_tokens().unwrap();
        for tok in &tokens[..3] {
            assert_eq!(tok.kind, TokenKind::Begin);
            assert_eq!(tok.value, TokenValue::Text("BEGIN".to_string()));
        }
        assert_eq!(tokens[3].kind, TokenKind::Id);
        assert_eq!(tokens[3].value, TokenValue::Text("Counter".to_string()));
    }

    #[test]
    fn test_numbers() {
        let mut scanner = Scanner::new("42 3.5 2. 1.5e3 2.0E-2");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(tokens[0].value, TokenValue::Integer(42));
        assert_eq!(tokens[1].value, TokenValue::Float(3.5));
        assert_eq!(tokens[2].value, TokenValue::Float(2.0));
        assert_eq!(tokens[3].value, TokenValue::Float(1500.0));
        assert_eq!(tokens[4].value, TokenValue::Float(0.02));
        assert_eq!(tokens[4].kind, TokenKind::FloatConst);
    }

    #[test]
    fn test_range_is_not_a_float() {
        let tokens = kinds("[1..10]");
        assert_eq!(
            tokens,
            vec![
                TokenKind::LBrack,
                TokenKind::IntConst,
                TokenKind::DotDot,
                TokenKind::IntConst,
                TokenKind::RBrack,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bad_exponent() {
        let mut scanner = Scanner::new("1.5e+");
        let err = scanner.scan_tokens().unwrap_err();
        assert!(err.to_string().contains("Invalid float literal"));
    }

    #[test]
    fn test_integer_out_of_range() {
        let mut scanner = Scanner::new("99999999999999999999");
        assert!(scanner.scan_tokens().is_err());
    }

    #[test]
    fn test_string_verbatim() {
        let mut scanner = Scanner::new(r"'hello \n world'");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text(), r"hello \n world");
    }

    #[test]
    fn test_unterminated_string() {
        let mut scanner = Scanner::new("x := 'abc");
        let err = scanner.scan_tokens().unwrap_err();
        assert_eq!(err.message(), "Unterminated string");
        assert_eq!(err.position(), Some(Position::new(1, 6)));
    }

    #[test]
    fn test_comment_skipped() {
        let tokens = kinds("{ a comment\n spanning lines } x");
        assert_eq!(tokens, vec![TokenKind::Id, TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_comment() {
        let mut scanner = Scanner::new("BEGIN { never closed");
        let err = scanner.scan_tokens().unwrap_err();
        assert_eq!(err.message(), "Unterminated comment");
    }

    #[test]
    fn test_unexpected_character() {
        let mut scanner = Scanner::new("x := 1 # 2");
        let err = scanner.scan_tokens().unwrap_err();
        assert!(err.message().contains('#'));
        assert_eq!(err.position(), Some(Position::new(1, 8)));
    }

    #[test]
    fn test_positions_across_lines() {
        let mut scanner = Scanner::new("BEGIN\n  x := 1\nEND");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 5));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 8));
        assert_eq!((tokens[4].line, tokens[4].column), (3, 1));
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut scanner = Scanner::new("x");
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Id);
        for _ in 0..3 {
            assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn test_token_buffer_replays_eof() {
        let tokens = Scanner::new("a b").scan_tokens().unwrap();
        let mut buffer = TokenBuffer::new(tokens);
        assert_eq!(buffer.next_token().unwrap().kind, TokenKind::Id);
        assert_eq!(buffer.next_token().unwrap().kind, TokenKind::Id);
        assert_eq!(buffer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(buffer.next_token().unwrap().kind, TokenKind::Eof);
    }
}
