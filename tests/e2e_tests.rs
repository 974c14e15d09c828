/// End-to-end integration tests
/// Demonstrates: Scanner → Parser → SemanticAnalyzer → Interpreter working together
use minipas::{
    analyze_source, run_source_with_io, ErrorKind, Interpreter, InterpreterOptions, Parser,
    Position, Scanner, SemanticAnalyzer, Value,
};
use std::collections::HashMap;
use std::io::Cursor;

fn run(source: &str, input: &str) -> (minipas::Result<HashMap<String, Value>>, String) {
    let mut output = Vec::new();
    let result = run_source_with_io(
        source,
        Cursor::new(input.to_string()),
        &mut output,
        InterpreterOptions::default(),
    );
    (result, String::from_utf8(output).unwrap())
}

#[test]
fn test_e2e_assign_and_write() {
    let source = "PROGRAM T; VAR x,y:INTEGER; BEGIN x:=5; y:=x+3; WRITE(y) END.";

    // Lex
    let tokens = Scanner::new(source).scan_tokens().unwrap();
    assert!(tokens.len() > 1);

    // Parse
    let mut program = Parser::from_source(source).unwrap().parse().unwrap();

    // Analyze
    SemanticAnalyzer::new().analyze(&mut program).unwrap();

    // Execute
    let mut output = Vec::new();
    let store = Interpreter::with_io(Cursor::new(""), &mut output, InterpreterOptions::default())
        .execute(&program)
        .unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), "8");
    assert_eq!(store.len(), 2);
    assert_eq!(store["x"], Value::Int(5));
    assert_eq!(store["y"], Value::Int(8));
}

#[test]
fn test_e2e_division_by_zero() {
    let (result, output) = run(
        "PROGRAM T; VAR x:INTEGER; BEGIN x:=0; WRITE(10/x) END.",
        "",
    );
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(err.message(), "Division by zero");
    assert_eq!(err.position(), Some(Position::new(1, 47)));
    assert_eq!(output, "");
}

#[test]
fn test_e2e_type_mismatch_produces_no_output() {
    let (result, output) = run(
        "PROGRAM T; VAR x:INTEGER; y:FLOAT; BEGIN x:=1; y:=2.0; WRITE(x); x:=x+y END.",
        "",
    );
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert!(err.message().contains("INTEGER"));
    assert!(err.message().contains("FLOAT"));
    assert_eq!(output, "");
}

#[test]
fn test_e2e_while_loop() {
    let (result, output) = run(
        "PROGRAM T; VAR i:INTEGER; BEGIN i:=0; WHILE i<3 DO BEGIN WRITE(i); i:=i+1 END END.",
        "",
    );
    assert_eq!(output, "012");
    assert_eq!(result.unwrap()["i"], Value::Int(3));
}

#[test]
fn test_e2e_nested_control_flow() {
    let source = r#"
        PROGRAM Primes;
        VAR n, d, isPrime: INTEGER;
        BEGIN
            n := 2;
            WHILE n <= 20 DO
            BEGIN
                d := 2;
                isPrime := 1;
                WHILE (d * d <= n) AND isPrime DO
                BEGIN
                    IF n % d = 0 THEN isPrime := 0;
                    d := d + 1
                END;
                IF isPrime THEN
                BEGIN
                    WRITE(n);
                    WRITE(' ')
                END;
                n := n + 1
            END
        END.
    "#;
    let (result, output) = run(source, "");
    result.unwrap();
    assert_eq!(output, "2 3 5 7 11 13 17 19 ");
}

#[test]
fn test_e2e_arrays_and_casts() {
    let source = r#"
        PROGRAM Avg;
        VAR a: ARRAY[1..4] OF INTEGER;
            i, sum: INTEGER;
            mean: FLOAT;
        BEGIN
            i := 1;
            WHILE i <= 4 DO BEGIN a[i] := i * 10; i := i + 1 END;
            i := 1;
            WHILE i <= 4 DO BEGIN sum := sum + a[i]; i := i + 1 END;
            mean := FLOAT(sum) / 4.0;
            WRITE(mean);
            WRITE(' ');
            WRITE(INT(mean))
        END.
    "#;
    let (result, output) = run(source, "");
    let store = result.unwrap();
    assert_eq!(output, "25.0 25");
    assert_eq!(store["sum"], Value::Int(100));
    assert_eq!(store["mean"], Value::Float(25.0));
}

#[test]
fn test_e2e_read_input() {
    let source = r#"
        PROGRAM Echo;
        VAR n: INTEGER; f: FLOAT;
        BEGIN
            READ(n);
            READ(f);
            WRITE(n * 2);
            WRITE(' ');
            WRITE(f)
        END.
    "#;
    let (result, output) = run(source, "21\n0.5\n");
    result.unwrap();
    assert_eq!(output, "42 0.5");
}

#[test]
fn test_e2e_comments_and_case_insensitive_keywords() {
    let source = "program T; { a comment } var x: integer; begin x := 1; Write(x) end.";
    let (result, output) = run(source, "");
    result.unwrap();
    assert_eq!(output, "1");
}

#[test]
fn test_e2e_error_stages() {
    let lexical = analyze_source("PROGRAM T; BEGIN x := 1 # END.").unwrap_err();
    assert_eq!(lexical.kind(), ErrorKind::Lexical);

    let syntax = analyze_source("PROGRAM T; BEGIN x := END.").unwrap_err();
    assert_eq!(syntax.kind(), ErrorKind::Syntax);

    let semantic = analyze_source("PROGRAM T; BEGIN x := 1 END.").unwrap_err();
    assert_eq!(semantic.kind(), ErrorKind::Semantic);
    assert_eq!(
        semantic.to_string(),
        "Semantic error at line 1, column 18: Symbol(identifier) not found: x"
    );

    let (runtime, _) = run(
        "PROGRAM T; VAR a: ARRAY[1..2] OF INTEGER; BEGIN a[0] := 1 END.",
        "",
    );
    assert_eq!(runtime.unwrap_err().kind(), ErrorKind::Runtime);
}

#[test]
fn test_e2e_empty_statements() {
    let (result, output) = run("PROGRAM T; BEGIN ; ; WRITE('ok'); END.", "");
    assert!(result.unwrap().is_empty());
    assert_eq!(output, "ok");
}

#[test]
fn test_e2e_oversized_array_fails_before_execution() {
    let (result, output) = run(
        "PROGRAM T; VAR a: ARRAY[0..9223372036854775807] OF INTEGER; BEGIN WRITE('x') END.",
        "",
    );
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert!(err.message().contains("exceeds the limit"));
    assert_eq!(output, "");
}

#[test]
fn test_e2e_quotient_used_as_index() {
    let (result, output) = run(
        "PROGRAM T; VAR n: INTEGER; a: ARRAY[1..4] OF INTEGER; BEGIN \
         n := 8 / 4; a[n] := n % 2 + 5; WRITE(a[2]) END.",
        "",
    );
    result.unwrap();
    assert_eq!(output, "5");
}
