use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Position;
use crate::lexer::{Token, TokenKind};
use crate::types::Type;

/// Complete Minipas program: `PROGRAM name; block .`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The PROGRAM keyword token
    pub token: Token,
    /// Program name as written
    pub name: String,
    /// Declarations and body
    pub block: Block,
}

/// Declarations followed by a compound statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Variable declarations, one per declared name
    pub declarations: Vec<VarDecl>,
    /// Program body
    pub compound: Compound,
}

/// Declaration of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    /// The variable's identifier token
    pub token: Token,
    /// Declared variable
    pub var: Var,
    /// Declared type as written
    pub type_node: TypeNode,
    /// Type resolved by the semantic analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

/// A written type: `INTEGER`, `FLOAT` or `ARRAY[lo..hi] OF type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    /// First token of the type specifier
    pub token: Token,
    /// What was written
    pub spec: TypeSpec,
}

/// Type specifier shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeSpec {
    /// INTEGER
    Integer,
    /// FLOAT
    Float,
    /// ARRAY[start..end] OF element
    Array {
        /// Lowest index
        start: i64,
        /// Highest index
        end: i64,
        /// Element type specifier
        element: Box<TypeNode>,
    },
}

impl TypeNode {
    /// Name used for symbol lookup and diagnostics
    pub fn name(&self) -> &'static str {
        match self.spec {
            TypeSpec::Integer => "INTEGER",
            TypeSpec::Float => "FLOAT",
            TypeSpec::Array { .. } => "ARRAY",
        }
    }
}

/// `BEGIN stmt; stmt; ... END`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    /// The BEGIN token
    pub token: Token,
    /// Statements in textual order
    pub children: Vec<Statement>,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Nested BEGIN ... END
    Compound(Compound),
    /// variable := expr
    Assign(Assign),
    /// IF cond THEN stmt [ELSE stmt]
    If(If),
    /// WHILE cond DO stmt
    While(While),
    /// READ(variable)
    Read(Read),
    /// WRITE(string | expr)
    Write(Write),
    /// Empty statement
    NoOp {
        /// Token at which the empty statement was recognized
        token: Token,
    },
}

/// Assignment statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    /// The := token
    pub token: Token,
    /// Target variable (possibly indexed)
    pub target: Var,
    /// Value expression
    pub value: Expression,
}

/// Conditional statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    /// The IF token
    pub token: Token,
    /// Condition; must be INTEGER
    pub condition: Expression,
    /// Executed when the condition is non-zero
    pub then_branch: Box<Statement>,
    /// Executed when the condition is zero
    pub else_branch: Option<Box<Statement>>,
}

/// Loop statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct While {
    /// The WHILE token
    pub token: Token,
    /// Loop condition; must be INTEGER
    pub condition: Expression,
    /// Loop body
    pub body: Box<Statement>,
}

/// READ(variable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Read {
    /// The READ token
    pub token: Token,
    /// Variable receiving the parsed input
    pub target: Var,
}

/// WRITE(arg)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Write {
    /// The WRITE token
    pub token: Token,
    /// What to print
    pub arg: WriteArg,
}

/// Operand of WRITE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteArg {
    /// Raw string literal, printed verbatim
    String(StringLiteral),
    /// Any expression, printed in its textual form
    Expr(Expression),
}

/// Single-quoted string literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    /// The STRING token
    pub token: Token,
    /// Text between the quotes
    pub value: String,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Variable reference, possibly indexed
    Var(Var),
    /// Binary operation
    BinOp(BinOp),
    /// Unary operation
    UnaryOp(UnaryOp),
    /// Numeric literal
    Num(Num),
    /// INT(expr) / FLOAT(expr)
    Cast(Cast),
}

impl Expression {
    /// Token the expression was built from (operator token for operations)
    pub fn token(&self) -> &Token {
        match self {
            Expression::Var(node) => &node.token,
            Expression::BinOp(node) => &node.token,
            Expression::UnaryOp(node) => &node.token,
            Expression::Num(node) => &node.token,
            Expression::Cast(node) => &node.token,
        }
    }

    /// Source position of [`Expression::token`]
    pub fn position(&self) -> Position {
        self.token().position()
    }

    /// Static type; literals always know theirs, other nodes only after analysis
    pub fn resolved_type(&self) -> Option<Type> {
        match self {
            Expression::Var(node) => node.resolved.clone(),
            Expression::BinOp(node) => node.resolved.clone(),
            Expression::UnaryOp(node) => node.resolved.clone(),
            Expression::Num(node) => Some(node.value.literal_type()),
            Expression::Cast(node) => node.resolved.clone(),
        }
    }
}

/// Variable reference: `name` or `name[index]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    /// The identifier token
    pub token: Token,
    /// Identifier text, case preserved
    pub name: String,
    /// Element index for array access
    pub index: Option<Box<Expression>>,
    /// Type resolved by the semantic analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

impl Var {
    /// Unindexed, unannotated reference built from an identifier token
    pub fn new(token: Token) -> Self {
        let name = token.text().to_string();
        Var {
            token,
            name,
            index: None,
            resolved: None,
        }
    }
}

/// Binary operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinOp {
    /// The operator token
    pub token: Token,
    /// Operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
    /// Type resolved by the semantic analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

/// Unary operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOp {
    /// The operator token
    pub token: Token,
    /// Operator
    pub op: UnaryOperator,
    /// Operand
    pub operand: Box<Expression>,
    /// Type resolved by the semantic analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

/// Numeric literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Num {
    /// The literal token
    pub token: Token,
    /// Literal value
    pub value: Number,
}

/// Literal number, tagged with its literal type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
}

impl Number {
    /// Static type of the literal
    pub fn literal_type(&self) -> Type {
        match self {
            Number::Integer(_) => Type::Integer,
            Number::Float(_) => Type::Float,
        }
    }
}

/// Explicit numeric conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    /// The INT / FLOAT token
    pub token: Token,
    /// Conversion target
    pub target: CastTarget,
    /// Converted expression
    pub operand: Box<Expression>,
    /// Type resolved by the semantic analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

/// Target of a cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastTarget {
    /// INT(expr): truncate toward zero
    Integer,
    /// FLOAT(expr): exact promotion
    Float,
}

impl CastTarget {
    /// Resulting static type
    pub fn result_type(&self) -> Type {
        match self {
            CastTarget::Integer => Type::Integer,
            CastTarget::Float => Type::Float,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    /// Addition operator (+)
    Add,
    /// Subtraction operator (-)
    Sub,
    /// Multiplication operator (*)
    Mul,
    /// True division operator (/)
    Div,
    /// Remainder operator (%)
    Mod,

    // Comparison
    /// Equality operator (=)
    Eq,
    /// Inequality operator (<>)
    NotEq,
    /// Less than operator (<)
    Lt,
    /// Less than or equal operator (<=)
    LtEq,
    /// Greater than operator (>)
    Gt,
    /// Greater than or equal operator (>=)
    GtEq,

    // Logical
    /// Logical AND operator
    And,
    /// Logical OR operator
    Or,
}

impl BinaryOperator {
    /// Map an operator token kind to its operator
    pub fn from_token_kind(kind: TokenKind) -> Option<BinaryOperator> {
        let op = match kind {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Sub,
            TokenKind::Mul => BinaryOperator::Mul,
            TokenKind::Div => BinaryOperator::Div,
            TokenKind::Mod => BinaryOperator::Mod,
            TokenKind::Equal => BinaryOperator::Eq,
            TokenKind::NotEqual => BinaryOperator::NotEq,
            TokenKind::Less => BinaryOperator::Lt,
            TokenKind::LessEqual => BinaryOperator::LtEq,
            TokenKind::Greater => BinaryOperator::Gt,
            TokenKind::GreaterEqual => BinaryOperator::GtEq,
            TokenKind::And => BinaryOperator::And,
            TokenKind::Or => BinaryOperator::Or,
            _ => return None,
        };
        Some(op)
    }

    /// `+ - * /`
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div
        )
    }

    /// `= <> < <= > >=`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }

    /// `AND OR`
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Operator as written in source
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Identity (+)
    Plus,
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
}

impl UnaryOperator {
    /// Map an operator token kind to its operator
    pub fn from_token_kind(kind: TokenKind) -> Option<UnaryOperator> {
        match kind {
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Neg),
            TokenKind::Not => Some(UnaryOperator::Not),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "NOT",
        };
        f.write_str(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenValue;

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOperator::Div.is_arithmetic());
        assert!(!BinaryOperator::Mod.is_arithmetic());
        assert!(BinaryOperator::GtEq.is_comparison());
        assert!(BinaryOperator::Or.is_logical());
        assert_eq!(
            BinaryOperator::from_token_kind(TokenKind::NotEqual),
            Some(BinaryOperator::NotEq)
        );
        assert_eq!(BinaryOperator::from_token_kind(TokenKind::Semi), None);
    }

    #[test]
    fn test_literal_types() {
        let token = Token::new(TokenKind::FloatConst, TokenValue::Float(1.5), 1, 1);
        let num = Expression::Num(Num {
            token,
            value: Number::Float(1.5),
        });
        assert_eq!(num.resolved_type(), Some(Type::Float));
    }

    #[test]
    fn test_var_is_unannotated() {
        let token = Token::new(TokenKind::Id, TokenValue::Text("Count".into()), 4, 2);
        let var = Var::new(token);
        assert_eq!(var.name, "Count");
        assert_eq!(Expression::Var(var.clone()).resolved_type(), None);
        assert_eq!(Expression::Var(var).position(), Position::new(4, 2));
    }
}
