//! Minipas Parser Module
//!
//! Builds an Abstract Syntax Tree (AST) from a token stream using recursive
//! descent with one token of lookahead.

mod ast;
mod descent;

pub use ast::{
    Assign, BinOp, BinaryOperator, Block, Cast, CastTarget, Compound, Expression, If, Num,
    Number, Program, Read, Statement, StringLiteral, TypeNode, TypeSpec, UnaryOp, UnaryOperator,
    Var, VarDecl, While, Write, WriteArg,
};
pub use descent::Parser;
