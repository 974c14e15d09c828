use super::ast::{
    Assign, BinOp, BinaryOperator, Block, Cast, CastTarget, Compound, Expression, If, Num,
    Number, Program, Read, Statement, StringLiteral, TypeNode, TypeSpec, UnaryOp, UnaryOperator,
    Var, VarDecl, While, Write, WriteArg,
};
use crate::error::{Error, Position, Result};
use crate::lexer::{Scanner, Token, TokenKind, TokenStream, TokenValue};

/// Recursive-descent parser with a single token of lookahead
pub struct Parser<S: TokenStream> {
    tokens: S,
    /// Lookahead token
    current: Token,
    /// Most recently consumed token
    previous: Option<Token>,
    /// Number of tokens consumed so far
    consumed: usize,
}

impl Parser<Scanner> {
    /// Creates a parser that scans `source` on demand
    pub fn from_source(source: &str) -> Result<Self> {
        Parser::new(Scanner::new(source))
    }
}

impl<S: TokenStream> Parser<S> {
    /// Creates a new parser, pulling the first lookahead token
    pub fn new(mut tokens: S) -> Result<Self> {
        let current = tokens.next_token()?;
        Ok(Parser {
            tokens,
            current,
            previous: None,
            consumed: 0,
        })
    }

    /// Number of tokens consumed; the stream has produced one more (the lookahead)
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Parses a whole program; nothing but end-of-input may follow the final `.`
    pub fn parse(&mut self) -> Result<Program> {
        let program = self.program()?;

        if !self.check(TokenKind::Eof) {
            return Err(self.syntax_error(format!(
                "Unexpected token {} after program end",
                self.current.kind
            )));
        }

        tracing::debug!(
            program = %program.name,
            declarations = program.block.declarations.len(),
            tokens = self.consumed,
            "parsed program"
        );
        Ok(program)
    }

    /// program := PROGRAM ID SEMI block DOT
    fn program(&mut self) -> Result<Program> {
        let token = self.expect(TokenKind::Program)?;
        let name = self.expect(TokenKind::Id)?.text().to_string();
        self.expect(TokenKind::Semi)?;
        let block = self.block()?;
        self.expect(TokenKind::Dot)?;

        Ok(Program { token, name, block })
    }

    /// block := declarations compound_statement
    fn block(&mut self) -> Result<Block> {
        let declarations = self.declarations()?;
        let compound = self.compound_statement()?;
        Ok(Block {
            declarations,
            compound,
        })
    }

    /// declarations := (VAR (var_decl SEMI)+)?
    fn declarations(&mut self) -> Result<Vec<VarDecl>> {
        let mut declarations = Vec::new();

        if self.check(TokenKind::Var) {
            self.advance()?;
            loop {
                declarations.extend(self.variable_declaration()?);
                self.expect(TokenKind::Semi)?;
                if !self.check(TokenKind::Id) {
                    break;
                }
            }
        }

        Ok(declarations)
    }

    /// var_decl := ID (COMMA ID)* COLON type_spec
    fn variable_declaration(&mut self) -> Result<Vec<VarDecl>> {
        let mut vars = vec![Var::new(self.expect(TokenKind::Id)?)];

        while self.check(TokenKind::Comma) {
            self.advance()?;
            vars.push(Var::new(self.expect(TokenKind::Id)?));
        }

        self.expect(TokenKind::Colon)?;
        let type_node = self.type_spec()?;

        Ok(vars
            .into_iter()
            .map(|var| VarDecl {
                token: var.token.clone(),
                var,
                type_node: type_node.clone(),
                resolved: None,
            })
            .collect())
    }

    /// type_spec := INTEGER | FLOAT | array_type
    fn type_spec(&mut self) -> Result<TypeNode> {
        match self.current.kind {
            TokenKind::Integer => Ok(TypeNode {
                token: self.advance()?,
                spec: TypeSpec::Integer,
            }),
            TokenKind::Float => Ok(TypeNode {
                token: self.advance()?,
                spec: TypeSpec::Float,
            }),
            TokenKind::Array => self.array_type(),
            other => Err(self.syntax_error(format!(
                "Expected type specifier (INTEGER, FLOAT, or ARRAY), got {}",
                other
            ))),
        }
    }

    /// array_type := ARRAY LBRACK INT_CONST DOTDOT INT_CONST RBRACK OF type_spec
    fn array_type(&mut self) -> Result<TypeNode> {
        let token = self.expect(TokenKind::Array)?;
        self.expect(TokenKind::LBrack)?;
        let start = self.integer_constant()?;
        self.expect(TokenKind::DotDot)?;
        let end = self.integer_constant()?;
        self.expect(TokenKind::RBrack)?;
        self.expect(TokenKind::Of)?;
        let element = self.type_spec()?;

        Ok(TypeNode {
            token,
            spec: TypeSpec::Array {
                start,
                end,
                element: Box::new(element),
            },
        })
    }

    fn integer_constant(&mut self) -> Result<i64> {
        let token = self.expect(TokenKind::IntConst)?;
        match token.value {
            TokenValue::Integer(n) => Ok(n),
            _ => Err(Error::syntax(
                "Integer constant carries no value",
                Some(token.position()),
            )),
        }
    }

    /// compound_stmt := BEGIN stmt_list END
    fn compound_statement(&mut self) -> Result<Compound> {
        let token = self.expect(TokenKind::Begin)?;
        let children = self.statement_list()?;
        self.expect(TokenKind::End)?;
        Ok(Compound { token, children })
    }

    /// stmt_list := statement (SEMI statement)*
    fn statement_list(&mut self) -> Result<Vec<Statement>> {
        let mut statements = vec![self.statement()?];

        while self.check(TokenKind::Semi) {
            self.advance()?;
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    fn statement(&mut self) -> Result<Statement> {
        match self.current.kind {
            TokenKind::Begin => Ok(Statement::Compound(self.compound_statement()?)),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Read => self.read_statement(),
            TokenKind::Write => self.write_statement(),
            TokenKind::Id => self.assignment_statement(),
            _ => Ok(Statement::NoOp {
                token: self.current.clone(),
            }),
        }
    }

    /// assignment := variable ASSIGN expr
    fn assignment_statement(&mut self) -> Result<Statement> {
        let target = self.variable()?;
        let token = self.expect(TokenKind::Assign)?;
        let value = self.expr()?;
        Ok(Statement::Assign(Assign {
            token,
            target,
            value,
        }))
    }

    /// if_stmt := IF expr THEN statement (ELSE statement)?
    fn if_statement(&mut self) -> Result<Statement> {
        let token = self.expect(TokenKind::If)?;
        let condition = self.expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.statement()?);

        let else_branch = if self.check(TokenKind::Else) {
            self.advance()?;
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Statement::If(If {
            token,
            condition,
            then_branch,
            else_branch,
        }))
    }

    /// while_stmt := WHILE expr DO statement
    fn while_statement(&mut self) -> Result<Statement> {
        let token = self.expect(TokenKind::While)?;
        let condition = self.expr()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.statement()?);
        Ok(Statement::While(While {
            token,
            condition,
            body,
        }))
    }

    /// read_stmt := READ LPAREN variable RPAREN
    fn read_statement(&mut self) -> Result<Statement> {
        let token = self.expect(TokenKind::Read)?;
        self.expect(TokenKind::LParen)?;
        let target = self.variable()?;
        self.expect(TokenKind::RParen)?;
        Ok(Statement::Read(Read { token, target }))
    }

    /// write_stmt := WRITE LPAREN (STRING | expr) RPAREN
    fn write_statement(&mut self) -> Result<Statement> {
        let token = self.expect(TokenKind::Write)?;
        self.expect(TokenKind::LParen)?;

        let arg = if self.check(TokenKind::String) {
            let token = self.advance()?;
            let value = token.text().to_string();
            WriteArg::String(StringLiteral { token, value })
        } else {
            WriteArg::Expr(self.expr()?)
        };

        self.expect(TokenKind::RParen)?;
        Ok(Statement::Write(Write { token, arg }))
    }

    /// variable := ID (LBRACK expr RBRACK)?
    fn variable(&mut self) -> Result<Var> {
        let token = self.expect(TokenKind::Id)?;
        self.variable_rest(token)
    }

    fn variable_rest(&mut self, token: Token) -> Result<Var> {
        let mut var = Var::new(token);

        if self.check(TokenKind::LBrack) {
            self.advance()?;
            var.index = Some(Box::new(self.expr()?));
            self.expect(TokenKind::RBrack)?;
        }

        Ok(var)
    }

    /// expr := logical_or
    fn expr(&mut self) -> Result<Expression> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expression> {
        self.binary_level(&[TokenKind::Or], Self::logical_and)
    }

    fn logical_and(&mut self) -> Result<Expression> {
        self.binary_level(&[TokenKind::And], Self::equality)
    }

    fn equality(&mut self) -> Result<Expression> {
        self.binary_level(&[TokenKind::Equal, TokenKind::NotEqual], Self::relational)
    }

    fn relational(&mut self) -> Result<Expression> {
        self.binary_level(
            &[
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expression> {
        self.binary_level(&[TokenKind::Plus, TokenKind::Minus], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expression> {
        self.binary_level(
            &[TokenKind::Mul, TokenKind::Div, TokenKind::Mod],
            Self::unary,
        )
    }

    /// One left-associative precedence level, folded iteratively
    fn binary_level(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> Result<Expression>,
    ) -> Result<Expression> {
        let mut node = operand(self)?;

        while operators.contains(&self.current.kind) {
            let token = self.advance()?;
            let op = BinaryOperator::from_token_kind(token.kind).ok_or_else(|| {
                Error::syntax(
                    format!("{} is not a binary operator", token.kind),
                    Some(token.position()),
                )
            })?;
            let right = operand(self)?;
            node = Expression::BinOp(BinOp {
                token,
                op,
                left: Box::new(node),
                right: Box::new(right),
                resolved: None,
            });
        }

        Ok(node)
    }

    /// unary := (PLUS | MINUS | NOT) unary | primary
    fn unary(&mut self) -> Result<Expression> {
        match UnaryOperator::from_token_kind(self.current.kind) {
            Some(op) => {
                let token = self.advance()?;
                let operand = self.unary()?;
                Ok(Expression::UnaryOp(UnaryOp {
                    token,
                    op,
                    operand: Box::new(operand),
                    resolved: None,
                }))
            }
            None => self.primary(),
        }
    }

    /// primary := INT_CONST | FLOAT_CONST | LPAREN expr RPAREN
    ///          | FLOAT LPAREN expr RPAREN | INT LPAREN expr RPAREN | variable
    fn primary(&mut self) -> Result<Expression> {
        match self.current.kind {
            TokenKind::IntConst => {
                let token = self.advance()?;
                match token.value {
                    TokenValue::Integer(n) => Ok(Expression::Num(Num {
                        token,
                        value: Number::Integer(n),
                    })),
                    _ => Err(Error::syntax(
                        "Integer constant carries no value",
                        Some(token.position()),
                    )),
                }
            }
            TokenKind::FloatConst => {
                let token = self.advance()?;
                match token.value {
                    TokenValue::Float(x) => Ok(Expression::Num(Num {
                        token,
                        value: Number::Float(x),
                    })),
                    _ => Err(Error::syntax(
                        "Float constant carries no value",
                        Some(token.position()),
                    )),
                }
            }
            TokenKind::LParen => {
                self.advance()?;
                let node = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::Float => {
                let token = self.advance()?;
                self.cast(token, CastTarget::Float)
            }
            TokenKind::Id => {
                let token = self.advance()?;
                if token.text().eq_ignore_ascii_case("INT") && self.check(TokenKind::LParen) {
                    self.cast(token, CastTarget::Integer)
                } else {
                    Ok(Expression::Var(self.variable_rest(token)?))
                }
            }
            other => Err(self.syntax_error(format!("Unexpected token {} in expression", other))),
        }
    }

    fn cast(&mut self, token: Token, target: CastTarget) -> Result<Expression> {
        self.expect(TokenKind::LParen)?;
        let operand = self.expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(Expression::Cast(Cast {
            token,
            target,
            operand: Box::new(operand),
            resolved: None,
        }))
    }

    // ---------------------------------------------------------------------
    // Token plumbing
    // ---------------------------------------------------------------------

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consumes the lookahead, returning it, and pulls the next token
    fn advance(&mut self) -> Result<Token> {
        let next = self.tokens.next_token()?;
        let consumed = std::mem::replace(&mut self.current, next);
        self.previous = Some(consumed.clone());
        self.consumed += 1;
        Ok(consumed)
    }

    /// Consumes the lookahead if it has the expected kind
    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.syntax_error(format!(
                "Expected token {}, got {}",
                kind, self.current.kind
            )))
        }
    }

    /// Position for diagnostics; at end of input, the last consumed token's
    fn error_position(&self) -> Position {
        match (&self.current.kind, &self.previous) {
            (TokenKind::Eof, Some(previous)) => previous.position(),
            _ => self.current.position(),
        }
    }

    fn syntax_error(&self, message: String) -> Error {
        Error::syntax(message, Some(self.error_position()))
    }
}
