//! Centralised error hierarchy for the **Veery interpreter**.
//!
//! Every pipeline stage (scanner, parser, resolver, runtime, CLI) converts its
//! failure modes into one of the variants defined here, giving the crate a
//! uniform `Result<T>` alias and ergonomic inter-operation with `anyhow` in
//! the driver while preserving line-level diagnostic detail.
//!
//! The module **does not** print diagnostics itself; formatting happens where
//! the errors are consumed.

use std::io;
use thiserror::Error;

use log::debug;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VeeryError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static-analysis failure from the resolver pass.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error. Aborts the remaining statements of a run.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF-8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl VeeryError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Lex error: line={}, msg={}", line, message);

        VeeryError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Parse error: line={}, msg={}", line, message);

        VeeryError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Resolve error: line={}, msg={}", line, message);

        VeeryError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Runtime error: line={}, msg={}", line, message);

        VeeryError::Runtime { message, line }
    }

    /// True for errors raised while the program was executing, as opposed to
    /// static (lex/parse/resolve) diagnostics. Drivers use this to pick an
    /// exit code.
    pub fn is_runtime(&self) -> bool {
        matches!(self, VeeryError::Runtime { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VeeryError>;
