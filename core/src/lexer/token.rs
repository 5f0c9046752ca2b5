use core::fmt;

use logos::{Filter, Lexer, Logos};

use super::LexErrorKind;

/// Longest identifier or string literal the language accepts, in bytes.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = LexErrorKind)]
pub enum Token {
    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token("-")]
    Minus,

    #[token("+")]
    Plus,

    #[token(";")]
    Semicolon,

    #[token("*")]
    Star,

    /// `_` only counts when it introduces a jump offset (`_+`, `_-`).
    #[token("_", under)]
    Under,

    /// The repeat marker `.x`.
    #[token(".x")]
    Times,

    #[token("@")]
    At,

    #[token("=")]
    Equals,

    #[token(":")]
    Colon,

    #[token(".")]
    Dot,

    // ========================================================================
    // Keywords
    // ========================================================================
    #[token("is")]
    Is,
    #[token("not")]
    Not,

    #[token("i", priority = 5)]
    ShInt,
    #[token("c", priority = 5)]
    ShChar,
    #[token("f", priority = 5)]
    ShFloat,
    #[token("void")]
    Void,

    #[token("int")]
    Int,
    #[token("char")]
    Char,
    #[token("float")]
    Float,

    #[token("fnctn")]
    Fnctn,
    #[token("when")]
    When,
    #[token("returns")]
    Returns,
    #[token("return")]
    Return,
    #[token("calls")]
    Calls,
    #[token("call")]
    Call,
    #[token("let")]
    Let,
    #[token("chg")]
    Chg,
    #[token("args")]
    Args,
    #[token("nm")]
    Nm,
    #[token("beg")]
    Beg,
    #[token("in")]
    In,
    #[token("out")]
    Out,
    #[token("endin")]
    EndIn,
    #[token("endout")]
    EndOut,
    #[token("then")]
    Then,
    #[token("lng")]
    Lng,
    #[token("of")]
    Of,
    #[token("jmp")]
    Jmp,
    #[token("catch")]
    Catch,
    #[token("error")]
    Error,
    #[token("defl")]
    Defl,

    // ========================================================================
    // Literals
    // ========================================================================
    #[regex("[A-Za-z][A-Za-z0-9]*", name)]
    Ident(String),

    #[regex(r#""[^"\n\x00]*""#, string)]
    Str(String),

    #[regex("-?[0-9]+", integer)]
    Integer(i32),

    #[regex(r"-?[0-9]+\.[0-9]*", real)]
    Real(f32),

    /// Appended once by [`super::lex`]; never produced by the scanner itself.
    Eof,
}

fn under(lex: &mut Lexer<Token>) -> Filter<()> {
    if lex.remainder().starts_with(['+', '-']) {
        Filter::Emit(())
    } else {
        Filter::Skip
    }
}

fn name(lex: &mut Lexer<Token>) -> Result<String, LexErrorKind> {
    let slice = lex.slice();
    if slice.len() > MAX_NAME_LEN {
        return Err(LexErrorKind::IdentifierTooLong);
    }
    Ok(slice.to_string())
}

fn string(lex: &mut Lexer<Token>) -> Result<String, LexErrorKind> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    if inner.len() > MAX_NAME_LEN {
        return Err(LexErrorKind::StringTooLong);
    }
    Ok(inner.to_string())
}

fn integer(lex: &mut Lexer<Token>) -> Result<i32, LexErrorKind> {
    lex.slice()
        .parse()
        .map_err(|_| LexErrorKind::NumberTooBig)
}

fn real(lex: &mut Lexer<Token>) -> Result<f32, LexErrorKind> {
    lex.slice()
        .parse()
        .map_err(|_| LexErrorKind::NumberTooBig)
}

impl Token {
    /// Human readable name used in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> &'static str {
        use Token::*;
        match self {
            LBracket => "'['",
            RBracket => "']'",
            Comma => "','",
            Minus => "'-'",
            Plus => "'+'",
            Semicolon => "';'",
            Star => "'*'",
            Under => "'_'",
            Times => "'.x'",
            At => "'@'",
            Equals => "'='",
            Colon => "':'",
            Dot => "'.'",
            Is => "'is'",
            Not => "'not'",
            ShInt => "'i'",
            ShChar => "'c'",
            ShFloat => "'f'",
            Void => "'void'",
            Int => "'int'",
            Char => "'char'",
            Float => "'float'",
            Fnctn => "'fnctn'",
            When => "'when'",
            Returns => "'returns'",
            Return => "'return'",
            Calls => "'calls'",
            Call => "'call'",
            Let => "'let'",
            Chg => "'chg'",
            Args => "'args'",
            Nm => "'nm'",
            Beg => "'beg'",
            In => "'in'",
            Out => "'out'",
            EndIn => "'endin'",
            EndOut => "'endout'",
            Then => "'then'",
            Lng => "'lng'",
            Of => "'of'",
            Jmp => "'jmp'",
            Catch => "'catch'",
            Error => "'error'",
            Defl => "'defl'",
            Ident(_) => "identifier",
            Str(_) => "string",
            Integer(_) => "integer number",
            Real(_) => "real number",
            Eof => "end of input",
        }
    }

    /// True for the tokens that end a statement inside a function body.
    pub fn is_statement_boundary(&self) -> bool {
        matches!(self, Token::Then | Token::Semicolon | Token::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Str(text) => write!(f, "string \"{}\"", text),
            Token::Integer(value) => write!(f, "integer {}", value),
            Token::Real(value) => write!(f, "real {}", value),
            other => f.write_str(other.describe()),
        }
    }
}
