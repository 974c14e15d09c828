//! # Semantic Analyzer for Minipas Programs
//!
//! A single pass over the AST that:
//!
//! - registers the builtin types in the global scope,
//! - binds every declared variable, rejecting duplicates within one scope,
//! - resolves every variable reference through the scope chain,
//! - annotates each expression node with its static type.
//!
//! `INTEGER` and `FLOAT` never mix implicitly: `x + y` with `x: INTEGER` and
//! `y: FLOAT` is rejected. Conversions go through `INT(..)` / `FLOAT(..)`.

use super::symbols::{BuiltinTypeSymbol, ScopedSymbolTable, Symbol, VarSymbol};
use super::{ArrayType, Type, MAX_ARRAY_CELLS};
use crate::error::{Error, Result};
use crate::parser::{
    BinaryOperator, Block, CastTarget, Expression, Program, Statement, TypeNode, TypeSpec,
    UnaryOperator, Var, VarDecl, WriteArg,
};
use tracing::{debug, trace};

/// Type checker and name resolver; annotates the program in place
#[derive(Debug, Default)]
pub struct SemanticAnalyzer;

impl SemanticAnalyzer {
    pub fn new() -> Self {
        SemanticAnalyzer
    }

    /// Analyze a complete program, filling in every `resolved` field
    pub fn analyze(&mut self, program: &mut Program) -> Result<()> {
        debug!("ENTER scope: global");
        let mut global = ScopedSymbolTable::new("global", 1, None);
        for (name, ty) in [("INTEGER", Type::Integer), ("FLOAT", Type::Float)] {
            global.insert(Symbol::BuiltinType(BuiltinTypeSymbol::new(name, ty)));
        }

        self.visit_block(&mut global, &mut program.block)?;

        trace!("{}", global);
        debug!("LEAVE scope: global");
        Ok(())
    }

    fn visit_block(&self, scope: &mut ScopedSymbolTable<'_>, block: &mut Block) -> Result<()> {
        for decl in &mut block.declarations {
            self.declare_variable(scope, decl)?;
        }
        for stmt in &mut block.compound.children {
            self.visit_statement(scope, stmt)?;
        }
        Ok(())
    }

    /// Bind a declared variable in `scope`.
    ///
    /// Only `scope` itself is checked for duplicates; a name bound in an
    /// enclosing table may be shadowed.
    pub fn declare_variable(
        &self,
        scope: &mut ScopedSymbolTable<'_>,
        decl: &mut VarDecl,
    ) -> Result<()> {
        let ty = self.resolve_type(scope, &decl.type_node)?;
        let name = &decl.var.name;

        if scope.lookup_current(name).is_some() {
            return Err(Error::semantic(
                format!("Duplicate identifier {} found", name),
                Some(decl.var.token.position()),
            ));
        }

        trace!(name = %name, ty = %ty, level = scope.level(), "declare");
        scope.insert(Symbol::Var(VarSymbol::new(name.clone(), ty.clone())));
        decl.var.resolved = Some(ty.clone());
        decl.resolved = Some(ty);
        Ok(())
    }

    fn resolve_type(&self, scope: &ScopedSymbolTable<'_>, node: &TypeNode) -> Result<Type> {
        match &node.spec {
            TypeSpec::Integer | TypeSpec::Float => match scope.lookup(node.name()) {
                Some(Symbol::BuiltinType(builtin)) => Ok(builtin.ty.clone()),
                Some(Symbol::Var(_)) | None => Err(Error::semantic(
                    format!("Type {} is not declared", node.name()),
                    Some(node.token.position()),
                )),
            },
            TypeSpec::Array {
                start,
                end,
                element,
            } => {
                if start > end {
                    return Err(Error::semantic(
                        format!("Invalid array bounds [{}..{}]", start, end),
                        Some(node.token.position()),
                    ));
                }
                let element = self.resolve_type(scope, element)?;
                let ty = Type::Array(ArrayType {
                    start: *start,
                    end: *end,
                    element: Box::new(element),
                });
                match ty.cells() {
                    Some(cells) if cells <= MAX_ARRAY_CELLS => Ok(ty),
                    _ => Err(Error::semantic(
                        format!(
                            "Array type {} exceeds the limit of {} elements",
                            ty, MAX_ARRAY_CELLS
                        ),
                        Some(node.token.position()),
                    )),
                }
            }
        }
    }

    fn visit_statement(&self, scope: &ScopedSymbolTable<'_>, stmt: &mut Statement) -> Result<()> {
        match stmt {
            Statement::Compound(compound) => {
                for child in &mut compound.children {
                    self.visit_statement(scope, child)?;
                }
                Ok(())
            }
            Statement::Assign(assign) => {
                self.visit_expression(scope, &mut assign.value)?;
                self.visit_reference(scope, &mut assign.target)?;
                Ok(())
            }
            Statement::If(node) => {
                self.visit_condition(scope, &mut node.condition)?;
                self.visit_statement(scope, &mut node.then_branch)?;
                if let Some(else_branch) = &mut node.else_branch {
                    self.visit_statement(scope, else_branch)?;
                }
                Ok(())
            }
            Statement::While(node) => {
                self.visit_condition(scope, &mut node.condition)?;
                self.visit_statement(scope, &mut node.body)
            }
            Statement::Read(node) => {
                let ty = self.visit_reference(scope, &mut node.target)?;
                if !ty.is_scalar() {
                    return Err(Error::semantic(
                        format!("READ requires a scalar variable, got {}", ty),
                        Some(node.target.token.position()),
                    ));
                }
                Ok(())
            }
            Statement::Write(node) => match &mut node.arg {
                WriteArg::String(_) => Ok(()),
                WriteArg::Expr(expr) => self.visit_expression(scope, expr).map(|_| ()),
            },
            Statement::NoOp { .. } => Ok(()),
        }
    }

    fn visit_condition(&self, scope: &ScopedSymbolTable<'_>, condition: &mut Expression) -> Result<()> {
        let ty = self.visit_expression(scope, condition)?;
        if ty != Type::Integer {
            return Err(Error::semantic(
                "Condition must be an integer expression (0 for false, non-zero for true)",
                Some(condition.position()),
            ));
        }
        Ok(())
    }

    /// Resolve a variable, rejecting a bare array name
    fn visit_reference(&self, scope: &ScopedSymbolTable<'_>, var: &mut Var) -> Result<Type> {
        let ty = self.visit_var(scope, var)?;
        if var.index.is_none() && matches!(ty, Type::Array(_)) {
            return Err(Error::semantic(
                format!("Array {} must be indexed", var.name),
                Some(var.token.position()),
            ));
        }
        Ok(ty)
    }

    fn visit_var(&self, scope: &ScopedSymbolTable<'_>, var: &mut Var) -> Result<Type> {
        let declared = match scope.lookup(&var.name) {
            Some(Symbol::Var(symbol)) => symbol.ty.clone(),
            Some(Symbol::BuiltinType(_)) | None => {
                return Err(Error::semantic(
                    format!("Symbol(identifier) not found: {}", var.name),
                    Some(var.token.position()),
                ))
            }
        };

        let ty = match &mut var.index {
            None => declared,
            Some(index) => {
                let index_ty = self.visit_expression(scope, index)?;
                let element = match declared {
                    Type::Array(array) => *array.element,
                    other @ (Type::Integer | Type::Float) => {
                        return Err(Error::semantic(
                            format!("Cannot index non-array variable {} of type {}", var.name, other),
                            Some(var.token.position()),
                        ))
                    }
                };
                if index_ty != Type::Integer {
                    return Err(Error::semantic(
                        format!("Array index must be an INTEGER expression, got {}", index_ty),
                        Some(index.position()),
                    ));
                }
                element
            }
        };

        var.resolved = Some(ty.clone());
        Ok(ty)
    }

    /// Infer the type of an expression bottom-up, recording it on the node
    fn visit_expression(&self, scope: &ScopedSymbolTable<'_>, expr: &mut Expression) -> Result<Type> {
        match expr {
            Expression::Num(num) => Ok(num.value.literal_type()),

            Expression::Var(var) => self.visit_reference(scope, var),

            Expression::BinOp(node) => {
                let left = self.visit_expression(scope, &mut node.left)?;
                let right = self.visit_expression(scope, &mut node.right)?;
                let op = node.op;
                let fail = |message: String| -> Result<Type> {
                    Err(Error::semantic(message, Some(node.token.position())))
                };

                if !left.is_scalar() || !right.is_scalar() {
                    return fail(format!(
                        "Operator {} requires scalar operands, got {} and {}",
                        op, left, right
                    ));
                }

                let ty = match op {
                    BinaryOperator::Add
                    | BinaryOperator::Sub
                    | BinaryOperator::Mul
                    | BinaryOperator::Div => {
                        if left != right {
                            return fail(format!(
                                "Type mismatch in {} operation: {} and {}",
                                op, left, right
                            ));
                        }
                        left
                    }
                    BinaryOperator::Mod => {
                        if left != Type::Integer || right != Type::Integer {
                            return fail(format!(
                                "Operator {} requires integer operands, got {} and {}",
                                op, left, right
                            ));
                        }
                        Type::Integer
                    }
                    BinaryOperator::Eq
                    | BinaryOperator::NotEq
                    | BinaryOperator::Lt
                    | BinaryOperator::LtEq
                    | BinaryOperator::Gt
                    | BinaryOperator::GtEq => {
                        if left != right {
                            return fail(format!(
                                "Cannot compare {} and {} with {}",
                                left, right, op
                            ));
                        }
                        Type::Integer
                    }
                    BinaryOperator::And | BinaryOperator::Or => {
                        if left != Type::Integer || right != Type::Integer {
                            return fail(format!(
                                "Logical operators require integer operands, got {} and {}",
                                left, right
                            ));
                        }
                        Type::Integer
                    }
                };

                node.resolved = Some(ty.clone());
                Ok(ty)
            }

            Expression::UnaryOp(node) => {
                let operand = self.visit_expression(scope, &mut node.operand)?;
                let ty = match node.op {
                    UnaryOperator::Plus | UnaryOperator::Neg => {
                        if !operand.is_scalar() {
                            return Err(Error::semantic(
                                format!(
                                    "Unary operator {} requires numeric operand, got {}",
                                    node.op, operand
                                ),
                                Some(node.token.position()),
                            ));
                        }
                        operand
                    }
                    UnaryOperator::Not => {
                        if operand != Type::Integer {
                            return Err(Error::semantic(
                                format!("Logical NOT requires integer operand, got {}", operand),
                                Some(node.token.position()),
                            ));
                        }
                        Type::Integer
                    }
                };

                node.resolved = Some(ty.clone());
                Ok(ty)
            }

            Expression::Cast(node) => {
                let operand = self.visit_expression(scope, &mut node.operand)?;
                if !operand.is_scalar() {
                    let name = match node.target {
                        CastTarget::Integer => "INT",
                        CastTarget::Float => "FLOAT",
                    };
                    return Err(Error::semantic(
                        format!("{} conversion requires numeric operand, got {}", name, operand),
                        Some(node.token.position()),
                    ));
                }

                let ty = node.target.result_type();
                node.resolved = Some(ty.clone());
                Ok(ty)
            }
        }
    }
}
