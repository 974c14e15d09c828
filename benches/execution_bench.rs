use criterion::{black_box, criterion_group, criterion_main, Criterion};
use minipas::{analyze_source, Interpreter, InterpreterOptions, Parser, Scanner, SemanticAnalyzer};
use std::io::{sink, Cursor};

const SOURCE: &str = r#"
    PROGRAM Bench;
    VAR a: ARRAY[1..100] OF INTEGER;
        i, j, sum: INTEGER;
        mean: FLOAT;
    BEGIN
        i := 1;
        WHILE i <= 100 DO BEGIN a[i] := (i * 7) % 13; i := i + 1 END;
        j := 0;
        WHILE j < 20 DO
        BEGIN
            i := 1;
            WHILE i <= 100 DO BEGIN sum := sum + a[i]; i := i + 1 END;
            j := j + 1
        END;
        mean := FLOAT(sum) / 2000.0;
        WRITE(mean)
    END.
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize program", |b| {
        b.iter(|| Scanner::new(black_box(SOURCE)).scan_tokens().unwrap())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    c.bench_function("parse program", |b| {
        b.iter(|| Parser::from_source(black_box(SOURCE)).unwrap().parse().unwrap())
    });
}

fn analyzer_benchmark(c: &mut Criterion) {
    let program = Parser::from_source(SOURCE).unwrap().parse().unwrap();
    c.bench_function("analyze program", |b| {
        b.iter(|| {
            let mut program = program.clone();
            SemanticAnalyzer::new().analyze(black_box(&mut program)).unwrap();
            program
        })
    });
}

fn interpreter_benchmark(c: &mut Criterion) {
    let program = analyze_source(SOURCE).unwrap();
    c.bench_function("execute program", |b| {
        b.iter(|| {
            Interpreter::with_io(Cursor::new(""), sink(), InterpreterOptions::default())
                .execute(black_box(&program))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    lexer_benchmark,
    parser_benchmark,
    analyzer_benchmark,
    interpreter_benchmark
);
criterion_main!(benches);
