use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use minipas::{analyze_source, Interpreter, InterpreterOptions, Scanner};
use tracing_subscriber::EnvFilter;

/// What to produce from the source file
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Print the token stream, one JSON object per line
    Tokens,
    /// Print the analyzed syntax tree as JSON
    Ast,
    /// Execute the program
    Run,
}

/// minipas runs programs written in a small, statically-typed Pascal-like
/// language.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file to run
    file: PathBuf,

    /// Stop after the given stage and print its result
    #[arg(long, value_enum, default_value_t = Emit::Run)]
    emit: Emit,

    /// Print `Enter value for <name>: ` before every READ
    #[arg(long)]
    prompt: bool,

    /// After a successful run, print the final variables to stderr
    #[arg(long)]
    dump_vars: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<minipas::Error>() {
                Some(diagnostic) => eprintln!("error: {}", diagnostic),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let source = read_source(&args.file)?;

    match args.emit {
        Emit::Tokens => {
            let tokens = Scanner::new(&source).scan_tokens()?;
            let mut stdout = io::stdout().lock();
            for token in &tokens {
                writeln!(stdout, "{}", serde_json::to_string(token)?)?;
            }
        }
        Emit::Ast => {
            let program = analyze_source(&source)?;
            println!("{}", serde_json::to_string_pretty(&program)?);
        }
        Emit::Run => {
            let program = analyze_source(&source)?;
            let options = InterpreterOptions {
                read_prompt: args.prompt,
            };
            let mut interpreter =
                Interpreter::with_io(io::stdin().lock(), io::stdout().lock(), options);
            let store = interpreter.execute(&program)?;

            if args.dump_vars {
                let mut vars: Vec<_> = store.into_iter().collect();
                vars.sort_by(|a, b| a.0.cmp(&b.0));
                for (name, value) in vars {
                    eprintln!("{} = {}", name, value);
                }
            }
        }
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            bail!("file '{}' not found", path.display())
        }
        result => result.with_context(|| format!("failed to read '{}'", path.display())),
    }
}
