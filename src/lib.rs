mod callable;
mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod stmt;
pub mod token;
mod value;

use std::io::Write;

pub use crate::error::{Error, Result};
pub use crate::value::Literal;

use crate::{
    interpreter::Interpreter,
    parser::Parser,
    scanner::Scanner,
    stmt::Stmt,
};

/// Scans and parses `source`. Every lexical error is returned; otherwise the
/// single syntax error that stopped the parser, if there was one.
pub fn parse(source: &str) -> std::result::Result<Vec<Stmt>, Vec<Error>> {
    let (tokens, errors): (Vec<_>, Vec<_>) = Scanner::new(source)
        .scan_tokens()
        .into_iter()
        .partition(Result::is_ok);

    let errors: Vec<_> = errors.into_iter().filter_map(Result::err).collect();
    if !errors.is_empty() {
        return Err(errors)
    }

    let tokens = tokens.into_iter().filter_map(Result::ok);
    Parser::new(tokens)
        .parse()
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .map_err(|e| vec![e])
}

/// Runs `source` against `interpreter`. Nothing executes unless the whole
/// source scans and parses.
pub fn run<W: Write>(source: &str, interpreter: &mut Interpreter<W>) -> std::result::Result<(), Vec<Error>> {
    let statements = parse(source)?;
    interpreter.interpret(&statements).map_err(|e| vec![e])
}
