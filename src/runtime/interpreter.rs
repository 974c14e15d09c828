//! Tree-walking interpreter for analyzed Minipas programs

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::lexer::Token;
use crate::parser::{
    BinaryOperator, Block, CastTarget, Expression, Number, Program, Statement, UnaryOperator, Var,
    WriteArg,
};
use crate::runtime::{Environment, Value};
use crate::types::Type;

/// Knobs for console interaction
#[derive(Debug, Clone, Default)]
pub struct InterpreterOptions {
    /// Print `Enter value for <name>: ` before every READ
    pub read_prompt: bool,
}

/// Executes a program against an input and an output stream
pub struct Interpreter<R, W> {
    input: R,
    output: W,
    options: InterpreterOptions,
}

impl Interpreter<StdinLock<'static>, Stdout> {
    /// Creates an interpreter bound to the process console
    pub fn new() -> Self {
        Interpreter::with_io(
            io::stdin().lock(),
            io::stdout(),
            InterpreterOptions::default(),
        )
    }
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    /// Creates an interpreter reading READ input from `input` and writing WRITE output to `output`
    pub fn with_io(input: R, output: W, options: InterpreterOptions) -> Self {
        Interpreter {
            input,
            output,
            options,
        }
    }

    /// Consumes the interpreter, returning its output stream
    pub fn into_output(self) -> W {
        self.output
    }

    /// Executes a program, returning the final global variable store.
    ///
    /// Every execution starts from a fresh environment.
    pub fn execute(&mut self, program: &Program) -> Result<HashMap<String, Value>> {
        debug!(program = %program.name, "execution started");
        let mut env = Environment::new();
        self.execute_block(&mut env, &program.block)?;
        debug!(program = %program.name, "execution finished");
        Ok(env.snapshot_global())
    }

    fn execute_block(&mut self, env: &mut Environment, block: &Block) -> Result<()> {
        for decl in &block.declarations {
            if env.contains_current(&decl.var.name) {
                continue;
            }
            let ty = decl.resolved.as_ref().ok_or_else(|| {
                Error::runtime(
                    format!("Declaration of {} has not been analyzed", decl.var.name),
                    Some(decl.token.position()),
                )
            })?;
            env.define(decl.var.name.clone(), Value::default_for(ty));
        }

        for stmt in &block.compound.children {
            self.execute_statement(env, stmt)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, env: &mut Environment, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::Compound(compound) => {
                for child in &compound.children {
                    self.execute_statement(env, child)?;
                }
                Ok(())
            }

            Statement::Assign(assign) => {
                let value = self.evaluate(env, &assign.value)?;
                self.store(env, &assign.target, value)
            }

            Statement::If(node) => {
                if self.evaluate(env, &node.condition)?.is_truthy() {
                    self.execute_statement(env, &node.then_branch)
                } else if let Some(else_branch) = &node.else_branch {
                    self.execute_statement(env, else_branch)
                } else {
                    Ok(())
                }
            }

            Statement::While(node) => {
                while self.evaluate(env, &node.condition)?.is_truthy() {
                    self.execute_statement(env, &node.body)?;
                }
                Ok(())
            }

            Statement::Read(node) => {
                let text = self.read_line(&node.target.name, &node.token)?;
                let value = parse_number(&text)
                    .ok_or_else(|| runtime_at(format!("Invalid number: {}", text), &node.token))?;
                trace!(name = %node.target.name, value = %value, "read");
                self.store(env, &node.target, value)
            }

            Statement::Write(node) => {
                let result = match &node.arg {
                    WriteArg::String(literal) => write!(self.output, "{}", literal.value),
                    WriteArg::Expr(expr) => {
                        let value = self.evaluate(env, expr)?;
                        write!(self.output, "{}", value)
                    }
                };
                result
                    .and_then(|_| self.output.flush())
                    .map_err(|e| runtime_at(format!("Failed to write output: {}", e), &node.token))
            }

            Statement::NoOp { .. } => Ok(()),
        }
    }

    /// Writes `value` into a variable or array element, widening INTEGER to FLOAT targets
    fn store(&self, env: &mut Environment, target: &Var, value: Value) -> Result<()> {
        let position = Some(target.token.position());
        let value = match (annotation(target.resolved.as_ref(), &target.token)?, value) {
            (Type::Float, Value::Int(n)) => Value::Float(n as f64),
            (_, value) => value,
        };

        match &target.index {
            None => env.set(&target.name, value, position),
            Some(index) => {
                let index = self.evaluate_index(env, index)?;
                let slot = env.slot_mut(&target.name, position)?;
                *element_mut(slot, index, &target.name, &target.token)? = value;
                Ok(())
            }
        }
    }

    fn read_line(&mut self, name: &str, token: &Token) -> Result<String> {
        if self.options.read_prompt {
            write!(self.output, "Enter value for {}: ", name)
                .and_then(|_| self.output.flush())
                .map_err(|e| runtime_at(format!("Failed to write output: {}", e), token))?;
        }

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| runtime_at(format!("Failed to read input: {}", e), token))?;
        if read == 0 {
            return Err(runtime_at("Unexpected end of input", token));
        }
        Ok(line.trim().to_string())
    }

    fn evaluate(&self, env: &Environment, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Num(num) => Ok(match num.value {
                Number::Integer(n) => Value::Int(n),
                Number::Float(x) => Value::Float(x),
            }),

            Expression::Var(var) => {
                annotation(var.resolved.as_ref(), &var.token)?;
                let value = env.get(&var.name, Some(var.token.position()))?;
                match &var.index {
                    None => Ok(value.clone()),
                    Some(index) => {
                        let index = self.evaluate_index(env, index)?;
                        element(value, index, &var.name, &var.token).cloned()
                    }
                }
            }

            Expression::BinOp(node) => {
                annotation(node.resolved.as_ref(), &node.token)?;
                let left = self.evaluate(env, &node.left)?;
                let right = self.evaluate(env, &node.right)?;
                binary(node.op, &left, &right, &node.token)
            }

            Expression::UnaryOp(node) => {
                annotation(node.resolved.as_ref(), &node.token)?;
                let operand = self.evaluate(env, &node.operand)?;
                match (node.op, operand) {
                    (UnaryOperator::Not, operand) => Ok(Value::from_bool(!operand.is_truthy())),
                    (UnaryOperator::Plus, operand @ (Value::Int(_) | Value::Float(_))) => {
                        Ok(operand)
                    }
                    (UnaryOperator::Neg, Value::Int(n)) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| runtime_at("integer overflow", &node.token)),
                    (UnaryOperator::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
                    (op, operand) => Err(runtime_at(
                        format!("Unary operator {} cannot be applied to {}", op, operand.type_name()),
                        &node.token,
                    )),
                }
            }

            Expression::Cast(node) => {
                annotation(node.resolved.as_ref(), &node.token)?;
                let operand = self.evaluate(env, &node.operand)?;
                match (node.target, operand) {
                    (CastTarget::Integer, Value::Int(n)) => Ok(Value::Int(n)),
                    (CastTarget::Integer, Value::Float(x)) => truncate(x)
                        .map(Value::Int)
                        .ok_or_else(|| {
                            runtime_at(format!("Cannot convert {:?} to INTEGER", x), &node.token)
                        }),
                    (CastTarget::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
                    (CastTarget::Float, Value::Float(x)) => Ok(Value::Float(x)),
                    (target, operand) => Err(runtime_at(
                        format!(
                            "Cannot convert {} to {}",
                            operand.type_name(),
                            target.result_type()
                        ),
                        &node.token,
                    )),
                }
            }
        }
    }

    fn evaluate_index(&self, env: &Environment, index: &Expression) -> Result<i64> {
        let value = self.evaluate(env, index)?;
        integral(&value).ok_or_else(|| {
            Error::runtime(
                format!("Array index must be an integer, got {}", value),
                Some(index.position()),
            )
        })
    }
}

/// Resolved type of a node; executing an unanalyzed tree is refused
fn annotation<'t>(resolved: Option<&'t Type>, token: &Token) -> Result<&'t Type> {
    resolved.ok_or_else(|| runtime_at("Cannot execute an expression that has not been analyzed", token))
}

fn runtime_at(message: impl Into<String>, token: &Token) -> Error {
    Error::runtime(message, Some(token.position()))
}

/// Integer first, then float
fn parse_number(text: &str) -> Option<Value> {
    text.parse::<i64>()
        .map(Value::Int)
        .or_else(|_| text.parse::<f64>().map(Value::Float))
        .ok()
}

/// Truncates toward zero when the result fits an `i64`
fn truncate(x: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let t = x.trunc();
    if t.is_finite() && (-LIMIT..LIMIT).contains(&t) {
        Some(t as i64)
    } else {
        None
    }
}

/// Integer view of an `Int`, or of a `Float` with no fractional part
fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Float(x) if x.fract() == 0.0 => truncate(*x),
        _ => None,
    }
}

fn offset(start: i64, len: usize, index: i64) -> Option<usize> {
    let off = usize::try_from(index.checked_sub(start)?).ok()?;
    (off < len).then_some(off)
}

fn out_of_bounds(name: &str, index: i64, start: i64, len: usize, token: &Token) -> Error {
    let end = i128::from(start) + len as i128 - 1;
    runtime_at(
        format!(
            "Index {} out of bounds for {}[{}..{}]",
            index, name, start, end
        ),
        token,
    )
}

fn element<'v>(value: &'v Value, index: i64, name: &str, token: &Token) -> Result<&'v Value> {
    match value {
        Value::Array { start, elements } => offset(*start, elements.len(), index)
            .map(|off| &elements[off])
            .ok_or_else(|| out_of_bounds(name, index, *start, elements.len(), token)),
        _ => Err(runtime_at(format!("Variable {} is not an array", name), token)),
    }
}

fn element_mut<'v>(
    value: &'v mut Value,
    index: i64,
    name: &str,
    token: &Token,
) -> Result<&'v mut Value> {
    match value {
        Value::Array { start, elements } => {
            let len = elements.len();
            match offset(*start, len, index) {
                Some(off) => Ok(&mut elements[off]),
                None => Err(out_of_bounds(name, index, *start, len, token)),
            }
        }
        _ => Err(runtime_at(format!("Variable {} is not an array", name), token)),
    }
}

fn numeric(op: BinaryOperator, value: &Value, token: &Token) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        runtime_at(
            format!("Operator {} cannot be applied to {}", op, value.type_name()),
            token,
        )
    })
}

fn compare(op: BinaryOperator, left: &Value, right: &Value, token: &Token) -> Result<Option<Ordering>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        _ => Ok(numeric(op, left, token)?.partial_cmp(&numeric(op, right, token)?)),
    }
}

fn binary(op: BinaryOperator, left: &Value, right: &Value, token: &Token) -> Result<Value> {
    let overflow = || runtime_at("integer overflow", token);

    match op {
        BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
            if let (Value::Int(a), Value::Int(b)) = (left, right) {
                let result = match op {
                    BinaryOperator::Add => a.checked_add(*b),
                    BinaryOperator::Sub => a.checked_sub(*b),
                    _ => a.checked_mul(*b),
                };
                return result.map(Value::Int).ok_or_else(overflow);
            }
            let (a, b) = (numeric(op, left, token)?, numeric(op, right, token)?);
            Ok(Value::Float(match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Sub => a - b,
                _ => a * b,
            }))
        }

        BinaryOperator::Div => {
            let (a, b) = (numeric(op, left, token)?, numeric(op, right, token)?);
            if b == 0.0 {
                return Err(runtime_at("Division by zero", token));
            }
            Ok(Value::Float(a / b))
        }

        BinaryOperator::Mod => match (integral(left), integral(right)) {
            (Some(_), Some(0)) => Err(runtime_at("Division by zero", token)),
            (Some(a), Some(b)) => a.checked_rem(b).map(Value::Int).ok_or_else(overflow),
            _ => Err(runtime_at(
                format!("Operator % requires integer operands, got {} and {}", left, right),
                token,
            )),
        },

        BinaryOperator::Eq => Ok(Value::from_bool(
            compare(op, left, right, token)? == Some(Ordering::Equal),
        )),
        BinaryOperator::NotEq => Ok(Value::from_bool(
            compare(op, left, right, token)? != Some(Ordering::Equal),
        )),
        BinaryOperator::Lt => Ok(Value::from_bool(
            compare(op, left, right, token)? == Some(Ordering::Less),
        )),
        BinaryOperator::LtEq => Ok(Value::from_bool(matches!(
            compare(op, left, right, token)?,
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOperator::Gt => Ok(Value::from_bool(
            compare(op, left, right, token)? == Some(Ordering::Greater),
        )),
        BinaryOperator::GtEq => Ok(Value::from_bool(matches!(
            compare(op, left, right, token)?,
            Some(Ordering::Greater | Ordering::Equal)
        ))),

        BinaryOperator::And => Ok(Value::from_bool(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::from_bool(left.is_truthy() || right.is_truthy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Position};
    use crate::parser::Parser;
    use crate::types::SemanticAnalyzer;
    use std::io::Cursor;

    fn analyzed(source: &str) -> Program {
        let mut program = Parser::from_source(source).unwrap().parse().unwrap();
        SemanticAnalyzer::new().analyze(&mut program).unwrap();
        program
    }

    fn run_with_input(
        source: &str,
        input: &str,
        options: InterpreterOptions,
    ) -> (Result<HashMap<String, Value>>, String) {
        let program = analyzed(source);
        let mut interpreter = Interpreter::with_io(Cursor::new(input.to_string()), Vec::new(), options);
        let result = interpreter.execute(&program);
        let output = String::from_utf8(interpreter.into_output()).unwrap();
        (result, output)
    }

    fn run(source: &str) -> (Result<HashMap<String, Value>>, String) {
        run_with_input(source, "", InterpreterOptions::default())
    }

    #[test]
    fn test_declarations_get_defaults() {
        let (store, output) =
            run("PROGRAM T; VAR i: INTEGER; f: FLOAT; a: ARRAY[1..2] OF INTEGER; BEGIN END.");
        let store = store.unwrap();
        assert_eq!(output, "");
        assert_eq!(store["i"], Value::Int(0));
        assert_eq!(store["f"], Value::Float(0.0));
        assert_eq!(
            store["a"],
            Value::Array {
                start: 1,
                elements: vec![Value::Int(0), Value::Int(0)]
            }
        );
    }

    #[test]
    fn test_assignment_and_write() {
        let (store, output) =
            run("PROGRAM T; VAR x, y: INTEGER; BEGIN x := 5; y := x + 3; WRITE(y) END.");
        let store = store.unwrap();
        assert_eq!(output, "8");
        assert_eq!(store["x"], Value::Int(5));
        assert_eq!(store["y"], Value::Int(8));
    }

    #[test]
    fn test_division_is_true_division() {
        let (store, output) = run("PROGRAM T; VAR x: INTEGER; BEGIN x := 7 / 2; WRITE(x) END.");
        assert_eq!(output, "3.5");
        assert_eq!(store.unwrap()["x"], Value::Float(3.5));
    }

    #[test]
    fn test_division_by_zero_reports_operator_position() {
        let (result, output) =
            run("PROGRAM T; VAR x: INTEGER; BEGIN x := 0; WRITE(10 / x) END.");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.message(), "Division by zero");
        assert_eq!(err.position(), Some(Position::new(1, 51)));
        assert_eq!(output, "");
    }

    #[test]
    fn test_mod_truncates_toward_zero() {
        let (store, _) = run("PROGRAM T; VAR a, b: INTEGER; BEGIN a := 7 % 3; b := -7 % 3 END.");
        let store = store.unwrap();
        assert_eq!(store["a"], Value::Int(1));
        assert_eq!(store["b"], Value::Int(-1));

        let (result, _) = run("PROGRAM T; VAR a: INTEGER; BEGIN a := 1 % 0 END.");
        assert_eq!(result.unwrap_err().message(), "Division by zero");
    }

    #[test]
    fn test_integer_overflow() {
        let (result, _) =
            run("PROGRAM T; VAR a: INTEGER; BEGIN a := 9223372036854775807 + 1 END.");
        assert_eq!(result.unwrap_err().message(), "integer overflow");
    }

    #[test]
    fn test_while_counts() {
        let (store, output) = run(
            "PROGRAM T; VAR i: INTEGER; BEGIN i := 0; WHILE i < 3 DO BEGIN WRITE(i); i := i + 1 END END.",
        );
        assert_eq!(output, "012");
        assert_eq!(store.unwrap()["i"], Value::Int(3));
    }

    #[test]
    fn test_if_else_and_logic() {
        let (_, output) = run(
            "PROGRAM T; VAR x: INTEGER; BEGIN x := 4; \
             IF (x > 3) AND NOT (x = 5) THEN WRITE('yes') ELSE WRITE('no'); \
             IF x <> 4 OR 0 THEN WRITE('!') END.",
        );
        assert_eq!(output, "yes");
    }

    #[test]
    fn test_read_parses_int_then_float() {
        let (store, output) = run_with_input(
            "PROGRAM T; VAR n: INTEGER; f: FLOAT; BEGIN READ(n); READ(f) END.",
            " 42 \n3\n",
            InterpreterOptions::default(),
        );
        let store = store.unwrap();
        assert_eq!(output, "");
        assert_eq!(store["n"], Value::Int(42));
        assert_eq!(store["f"], Value::Float(3.0));
    }

    #[test]
    fn test_read_prompt_and_errors() {
        let (_, output) = run_with_input(
            "PROGRAM T; VAR n: INTEGER; BEGIN READ(n) END.",
            "1\n",
            InterpreterOptions { read_prompt: true },
        );
        assert_eq!(output, "Enter value for n: ");

        let (result, _) = run_with_input(
            "PROGRAM T; VAR n: INTEGER; BEGIN READ(n) END.",
            "abc\n",
            InterpreterOptions::default(),
        );
        assert_eq!(result.unwrap_err().message(), "Invalid number: abc");

        let (result, _) = run("PROGRAM T; VAR n: INTEGER; BEGIN READ(n) END.");
        assert_eq!(result.unwrap_err().message(), "Unexpected end of input");
    }

    #[test]
    fn test_arrays() {
        let (store, output) = run(
            "PROGRAM T; VAR a: ARRAY[0..2] OF INTEGER; i: INTEGER; BEGIN \
             i := 0; WHILE i <= 2 DO BEGIN a[i] := i * i; i := i + 1 END; \
             WRITE(a[2]) END.",
        );
        assert_eq!(output, "4");
        assert_eq!(
            store.unwrap()["a"],
            Value::Array {
                start: 0,
                elements: vec![Value::Int(0), Value::Int(1), Value::Int(4)]
            }
        );

        let (result, _) = run("PROGRAM T; VAR a: ARRAY[1..3] OF FLOAT; BEGIN a[4] := 1.0 END.");
        assert_eq!(
            result.unwrap_err().message(),
            "Index 4 out of bounds for a[1..3]"
        );
    }

    #[test]
    fn test_integral_quotients_index_and_mod() {
        let (store, output) = run(
            "PROGRAM T; VAR n, m: INTEGER; a: ARRAY[1..3] OF INTEGER; BEGIN \
             n := 4 / 2; a[n] := 7; m := n % 2; WRITE(a[n]) END.",
        );
        let store = store.unwrap();
        assert_eq!(output, "7");
        assert_eq!(store["n"], Value::Float(2.0));
        assert_eq!(store["m"], Value::Int(0));

        let (store, _) = run("PROGRAM T; VAR n, m: INTEGER; BEGIN n := 9 / 3; m := 10 % n END.");
        assert_eq!(store.unwrap()["m"], Value::Int(1));
    }

    #[test]
    fn test_fractional_quotients_are_rejected_as_integers() {
        let (result, _) = run(
            "PROGRAM T; VAR n: INTEGER; a: ARRAY[1..3] OF INTEGER; BEGIN n := 3 / 2; a[n] := 1 END.",
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.message(), "Array index must be an integer, got 1.5");

        let (result, _) = run("PROGRAM T; VAR n, m: INTEGER; BEGIN n := 7 / 2; m := n % 2 END.");
        assert_eq!(
            result.unwrap_err().message(),
            "Operator % requires integer operands, got 3.5 and 2"
        );

        let (result, _) = run("PROGRAM T; VAR n, m: INTEGER; BEGIN n := 0 / 5; m := 3 % n END.");
        assert_eq!(result.unwrap_err().message(), "Division by zero");
    }

    #[test]
    fn test_nested_array_write() {
        let (_, output) = run(
            "PROGRAM T; VAR m: ARRAY[1..2] OF ARRAY[1..2] OF INTEGER; BEGIN WRITE(m[2]) END.",
        );
        assert_eq!(output, "[0, 0]");
    }

    #[test]
    fn test_casts_and_widening() {
        let (store, output) = run(
            "PROGRAM T; VAR i: INTEGER; f: FLOAT; BEGIN \
             i := INT(-2.9); f := FLOAT(i) * 1.5; WRITE(f) END.",
        );
        let store = store.unwrap();
        assert_eq!(store["i"], Value::Int(-2));
        assert_eq!(output, "-3.0");

        let (result, _) = run("PROGRAM T; VAR i: INTEGER; BEGIN i := INT(1.0e300) END.");
        assert!(result.unwrap_err().message().starts_with("Cannot convert"));
    }

    #[test]
    fn test_refuses_unanalyzed_tree() {
        let program = Parser::from_source("PROGRAM T; VAR x: INTEGER; BEGIN x := 1 + 2 END.")
            .unwrap()
            .parse()
            .unwrap();
        let mut interpreter =
            Interpreter::with_io(Cursor::new(String::new()), Vec::new(), InterpreterOptions::default());
        let err = interpreter.execute(&program).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(err.message().contains("has not been analyzed"));
    }

    #[test]
    fn test_fresh_environment_per_execution() {
        let program = analyzed("PROGRAM T; VAR x: INTEGER; BEGIN x := x + 1 END.");
        let mut interpreter =
            Interpreter::with_io(Cursor::new(String::new()), Vec::new(), InterpreterOptions::default());
        assert_eq!(interpreter.execute(&program).unwrap()["x"], Value::Int(1));
        assert_eq!(interpreter.execute(&program).unwrap()["x"], Value::Int(1));
    }
}
