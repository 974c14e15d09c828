//! Runtime execution for analyzed Minipas programs

mod environment;
mod interpreter;
mod value;

pub use environment::Environment;
pub use interpreter::{Interpreter, InterpreterOptions};
pub use value::Value;
