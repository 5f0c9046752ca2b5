//! Tokenizer for plea source text.
//!
//! The scanner itself is generated by `logos`; this module wraps it into a flat
//! token list terminated by a single [`Token::Eof`], and provides the cursor the
//! single-pass compiler reads from.

mod stream;
mod token;

#[cfg(test)]
mod lexer_test;

use core::ops::Range;

use logos::Logos;
use thiserror::Error;

pub use stream::TokenStream;
pub use token::{MAX_NAME_LEN, Token};

/// Byte range of a token in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }
    pub fn combine(a: &Span, b: &Span) -> Span {
        Span::new(a.0.start, b.0.end)
    }
    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }
}

/// A token together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidCharacter,
    #[error("premature end of line in string literal")]
    UnterminatedString,
    #[error("identifier is longer than {MAX_NAME_LEN} bytes")]
    IdentifierTooLong,
    #[error("string literal is longer than {MAX_NAME_LEN} bytes")]
    StringTooLong,
    #[error("number is too big")]
    NumberTooBig,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Scan `source` into tokens. The result always ends with exactly one `Eof`.
pub fn lex(source: &str) -> Result<Vec<Lexeme>, LexError> {
    let mut lexemes = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span(lexer.span());
        match result {
            Ok(token) => lexemes.push(Lexeme { token, span }),
            Err(kind) => {
                // An opening quote that never matched the string rule has no
                // closing quote before the end of the line.
                let kind = match kind {
                    LexErrorKind::InvalidCharacter if span.str_of(source).starts_with('"') => {
                        LexErrorKind::UnterminatedString
                    }
                    other => other,
                };
                return Err(LexError { kind, span });
            }
        }
    }

    lexemes.push(Lexeme {
        token: Token::Eof,
        span: Span::new(source.len(), source.len()),
    });
    tracing::trace!(count = lexemes.len(), "lexed source");
    Ok(lexemes)
}
