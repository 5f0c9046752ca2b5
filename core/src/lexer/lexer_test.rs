use pretty_assertions::assert_eq;

use super::{LexErrorKind, Span, Token, TokenStream, lex};

fn tokens(source: &str) -> Vec<Token> {
    lex(source)
        .unwrap()
        .into_iter()
        .map(|lexeme| lexeme.token)
        .collect()
}

fn ident(name: &str) -> Token {
    Token::Ident(name.to_string())
}

#[test]
fn test_let_statement() {
    assert_eq!(
        tokens("let x = 5;"),
        vec![
            Token::Let,
            ident("x"),
            Token::Equals,
            Token::Integer(5),
            Token::Semicolon,
            Token::Eof,
        ]
    );
}

#[test]
fn test_keywords_are_not_prefixes_of_identifiers() {
    assert_eq!(
        tokens("in input int i letter"),
        vec![
            Token::In,
            ident("input"),
            Token::Int,
            Token::ShInt,
            ident("letter"),
            Token::Eof,
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("-5 - 5 3.5 300"),
        vec![
            Token::Integer(-5),
            Token::Minus,
            Token::Integer(5),
            Token::Real(3.5),
            Token::Integer(300),
            Token::Eof,
        ]
    );
}

#[test]
fn test_string_payload_drops_quotes() {
    assert_eq!(
        tokens(r#"beg "please, oh great one""#),
        vec![
            Token::Beg,
            Token::Str("please, oh great one".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_underscore_only_before_offset() {
    assert_eq!(
        tokens("jmp _+- a _ b"),
        vec![
            Token::Jmp,
            Token::Under,
            Token::Plus,
            Token::Minus,
            ident("a"),
            ident("b"),
            Token::Eof,
        ]
    );
}

#[test]
fn test_repeat_marker_and_dot() {
    assert_eq!(
        tokens("+ .x 3 ."),
        vec![
            Token::Plus,
            Token::Times,
            Token::Integer(3),
            Token::Dot,
            Token::Eof,
        ]
    );
}

#[test]
fn test_spans_point_into_source() {
    let source = "chg  total, *";
    let lexemes = lex(source).unwrap();
    assert_eq!(lexemes[1].span, Span::new(5, 10));
    assert_eq!(lexemes[1].span.str_of(source), "total");
    let eof = lexemes.last().unwrap();
    assert_eq!(eof.token, Token::Eof);
    assert_eq!(eof.span, Span::new(source.len(), source.len()));
}

#[test]
fn test_single_eof_on_empty_input() {
    assert_eq!(tokens(""), vec![Token::Eof]);
    assert_eq!(tokens(" \n\t "), vec![Token::Eof]);
}

#[test]
fn test_invalid_character() {
    let err = lex("let x = $").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InvalidCharacter);
    assert_eq!(err.span.0.start, 8);
}

#[test]
fn test_unterminated_string() {
    let err = lex("let s = \"abc\nlet").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    assert_eq!(err.span.0.start, 8);
}

#[test]
fn test_identifier_too_long() {
    let name = "a".repeat(256);
    let err = lex(&name).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::IdentifierTooLong);

    let name = "a".repeat(255);
    assert_eq!(tokens(&name), vec![ident(&name), Token::Eof]);
}

#[test]
fn test_integer_out_of_range() {
    let err = lex("let x = 99999999999").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::NumberTooBig);
}

#[test]
fn test_single_letter_shorthands_are_keywords() {
    assert_eq!(
        tokens("let x = i 5 then [c 4] f g"),
        vec![
            Token::Let,
            ident("x"),
            Token::Equals,
            Token::ShInt,
            Token::Integer(5),
            Token::Then,
            Token::LBracket,
            Token::ShChar,
            Token::Integer(4),
            Token::RBracket,
            Token::ShFloat,
            ident("g"),
            Token::Eof,
        ]
    );
    assert_eq!(tokens("ix cf"), vec![ident("ix"), ident("cf"), Token::Eof]);
}

#[test]
fn test_stream_lookahead_and_rewind() {
    let mut stream = TokenStream::new(lex("call g in endin").unwrap());
    assert_eq!(stream.peek(), &Token::Call);
    assert_eq!(stream.peek_nth(1), &ident("g"));
    assert_eq!(stream.peek_nth(10), &Token::Eof);

    let start = stream.position();
    assert_eq!(stream.next().token, Token::Call);
    assert!(stream.eat(&ident("g")));
    assert!(!stream.eat(&Token::Comma));
    assert_eq!(stream.last_span(), Span::new(5, 6));

    stream.seek(start);
    assert_eq!(stream.peek(), &Token::Call);

    while !stream.at_end() {
        stream.next();
    }
    assert_eq!(stream.next().token, Token::Eof);
    assert_eq!(stream.next().token, Token::Eof);
}
