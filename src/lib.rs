//! The Veery language: scanner, parser, resolver, and tree-walking
//! interpreter, plus the [`run`] pipeline that threads them together.

pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use crate::error::VeeryError;
use crate::interpreter::Interpreter;
use crate::parser::{Parser, Stmt};
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

use log::info;

/// Run `source` through the full pipeline against `interpreter`.
///
/// Stages are strictly ordered: lex errors accumulate and veto parsing,
/// parse errors accumulate and veto resolution, resolve errors accumulate
/// and veto execution, and a
/// runtime error is singular and aborts the remaining top-level statements.
/// Error state lives entirely in the returned value, so callers (REPL, file
/// runner, tests) may invoke this repeatedly against one interpreter: the
/// global environment persists between runs, errors do not.
pub fn run(source: &[u8], interpreter: &mut Interpreter) -> Result<(), Vec<VeeryError>> {
    let mut errors: Vec<VeeryError> = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    // A broken token stream would only produce echo errors downstream, so
    // lex errors veto the parse outright.
    if !errors.is_empty() {
        return Err(errors);
    }

    let statements: Vec<Stmt> = Parser::new(&tokens).parse()?;

    Resolver::new().resolve(&statements)?;

    interpreter
        .interpret(&statements)
        .map_err(|e| vec![e])?;

    info!("Run completed without errors");

    Ok(())
}
