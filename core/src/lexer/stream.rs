use super::{Lexeme, Span, Token};

/// Index-based cursor over a lexed token list.
///
/// The list always ends with [`Token::Eof`]; reading past the end keeps
/// returning that final token, so lookahead never has to check bounds.
#[derive(Debug, Clone)]
pub struct TokenStream {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl TokenStream {
    pub fn new(mut lexemes: Vec<Lexeme>) -> Self {
        if !matches!(lexemes.last(), Some(Lexeme { token: Token::Eof, .. })) {
            let end = lexemes.last().map(|l| l.span.0.end).unwrap_or(0);
            lexemes.push(Lexeme {
                token: Token::Eof,
                span: Span::new(end, end),
            });
        }
        Self { lexemes, pos: 0 }
    }

    fn at(&self, index: usize) -> &Lexeme {
        let last = self.lexemes.len() - 1;
        &self.lexemes[index.min(last)]
    }

    /// The next token, without consuming it.
    pub fn peek(&self) -> &Token {
        &self.at(self.pos).token
    }

    /// The token `n` places after the next one (`peek_nth(0) == peek()`).
    pub fn peek_nth(&self, n: usize) -> &Token {
        &self.at(self.pos + n).token
    }

    pub fn peek_span(&self) -> Span {
        self.at(self.pos).span.clone()
    }

    /// Consume the next token and return it.
    pub fn next(&mut self) -> Lexeme {
        let lexeme = self.at(self.pos).clone();
        if self.pos < self.lexemes.len() {
            self.pos += 1;
        }
        lexeme
    }

    /// Consume the next token if it is `token`.
    pub fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.next();
            true
        } else {
            false
        }
    }

    /// Span of the most recently consumed token.
    pub fn last_span(&self) -> Span {
        self.at(self.pos.saturating_sub(1)).span.clone()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.lexemes.len());
    }

    pub fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }
}
