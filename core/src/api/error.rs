//! Public error types for the plea API.
//!
//! Internal errors are converted to these types at the API boundary.

use core::fmt;

use crate::compiler::CompileError;
use crate::lexer::Span;
use crate::vm::RuntimeError;

/// Public error type for all plea operations.
#[derive(Debug)]
pub enum Error {
    /// The program did not compile.
    ///
    /// Carries the source so the diagnostics can be rendered against it.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        source: String,
    },

    /// The program stopped with a fatal error while running.
    Runtime(RuntimeError),
}

impl Error {
    pub(crate) fn compilation(err: CompileError, source: &str) -> Self {
        Error::Compilation {
            diagnostics: vec![err.to_diagnostic()],
            source: source.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Compilation { diagnostics, .. } => {
                let error_count = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Compilation failed with {} error(s)", error_count)
            }
            Error::Runtime(err) => write!(f, "Runtime error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Compilation { .. } => None,
            Error::Runtime(err) => Some(err),
        }
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Error::Runtime(err)
    }
}

/// A diagnostic message with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the issue.
    pub span: Span,

    /// Suggestions on how to fix the issue.
    pub help: Vec<String>,

    /// Stable error code: `L…` from the lexer, `E…` from the compiler.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation cannot succeed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}
