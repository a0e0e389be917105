//! A small expression language: a lexer, a recursive-descent parser and a
//! tree-walking evaluator over lexically scoped bindings.

pub mod ast;
pub mod builtins;
pub mod common;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod scope;
pub mod token;
pub mod value;

pub use error::{Error, Result, RuntimeError};
pub use scope::Scope;
pub use value::RuntimeValue;

/// Intermediate stages to print to stderr while running source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dump {
    pub tokens: bool,
    pub ast: bool,
}

/// Tokenizes, parses and evaluates `source` in `scope`, returning the value
/// of the last statement.
pub fn run(source: &str, scope: &Scope) -> Result<RuntimeValue> {
    run_with(source, scope, Dump::default())
}

pub fn run_with(source: &str, scope: &Scope, dump: Dump) -> Result<RuntimeValue> {
    let tokens = lexer::tokenize(source)?;
    if dump.tokens {
        for token in &tokens {
            eprintln!("{:?} {:?} @ {:?}", token.kind, token.value, token.span);
        }
    }

    let program = parser::parse(&tokens)?;
    if dump.ast {
        eprintln!("{:#?}", program);
    }

    interpreter::evaluate_program(&program, scope)
}
