//! Compilation errors.

use thiserror::Error;

use crate::api::{Diagnostic, Severity};
use crate::lexer::{LexError, LexErrorKind, Span, Token};
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error(transparent)]
    Lex(LexErrorKind),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: Token },

    #[error("{0} is reserved")]
    Reserved(Token),

    #[error("unknown type {0}")]
    UnknownType(Token),

    #[error("undeclared variable `{0}`")]
    UndeclaredVariable(String),

    #[error("undeclared function `{0}`")]
    UndeclaredFunction(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Type, found: Type },

    #[error("`{0}` is not an array")]
    NotAnArray(String),

    #[error("cannot print a value of type {0}")]
    NotPrintable(Type),

    #[error("`{function}` takes {expected} argument(s), found {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("function `{0}` is already declared")]
    DuplicateFunction(String),

    #[error("variable `{0}` is already declared")]
    DuplicateVariable(String),

    #[error("too many variables in `{0}`")]
    TooManyVariables(String),

    #[error("too many constants")]
    TooManyConstants,

    #[error("jump target {target} is outside the function")]
    JumpOutOfRange { target: i64 },

    #[error("the return type of `{0}` is not known yet")]
    UnknownReturnType(String),

    #[error("`.x` must follow a `+` or `-`")]
    DanglingRepeat,

    #[error("invalid length {0}")]
    InvalidLength(i32),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub span: Span,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn code(&self) -> &'static str {
        use CompileErrorKind::*;
        match &self.kind {
            Lex(LexErrorKind::InvalidCharacter) => "L001",
            Lex(LexErrorKind::UnterminatedString) => "L002",
            Lex(LexErrorKind::IdentifierTooLong) => "L003",
            Lex(LexErrorKind::StringTooLong) => "L004",
            Lex(LexErrorKind::NumberTooBig) => "L005",
            UnexpectedToken { .. } => "E001",
            Reserved(_) => "E002",
            UnknownType(_) => "E003",
            UndeclaredVariable(_) => "E004",
            UndeclaredFunction(_) => "E005",
            TypeMismatch { .. } => "E006",
            NotAnArray(_) => "E007",
            NotPrintable(_) => "E008",
            ArgumentCount { .. } => "E009",
            DuplicateFunction(_) => "E010",
            DuplicateVariable(_) => "E011",
            TooManyVariables(_) => "E012",
            TooManyConstants => "E013",
            JumpOutOfRange { .. } => "E014",
            UnknownReturnType(_) => "E015",
            DanglingRepeat => "E016",
            InvalidLength(_) => "E017",
        }
    }

    fn help(&self) -> Vec<String> {
        use CompileErrorKind::*;
        let help = match &self.kind {
            UndeclaredFunction(name) if name == "main" => "every program needs a `main` function",
            UnknownReturnType(_) => "annotate the return value, e.g. `returns x : int`",
            NotPrintable(_) => "`print` accepts int, char, [int] and [char]",
            UnknownType(_) => "types are int, char, float, void or [scalar]",
            _ => return Vec::new(),
        };
        vec![help.to_string()]
    }

    /// Convert to a Diagnostic for API boundary.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            message: self.kind.to_string(),
            span: self.span.clone(),
            help: self.help(),
            code: Some(self.code().to_string()),
        }
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        Self::new(CompileErrorKind::Lex(err.kind), err.span)
    }
}
