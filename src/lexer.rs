use std::{fmt::Display, ops::Range};

use tracing::trace;
use winnow::{
    ascii::{digit0, digit1},
    combinator::{alt, delimited, opt},
    error::{ErrMode, ErrorKind, ParserError},
    prelude::*,
    stream::{AsChar, Location, Stream},
    token::{any, one_of, take_till, take_while},
    Located,
};

use crate::{value::write_string, LexError, LexErrorKind};

type Input<'a> = Located<&'a str>;
type PResult<T> = winnow::PResult<T, LexFailure>;

/// A single token, with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Identifier(String),
    Number { literal: String, value: f64 },
    Boolean(bool),
    String(String),
    OpenBrace,
    CloseBrace,
    Colon,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Identifier(id) => write!(f, "identifier '{}'", id),
            TokenKind::Number { literal, .. } => write!(f, "number {}", literal),
            TokenKind::Boolean(value) => write!(f, "'{}'", value),
            TokenKind::String(value) => {
                write!(f, "string ")?;
                write_string(f, value)
            }
            TokenKind::OpenBrace => write!(f, "'{{'"),
            TokenKind::CloseBrace => write!(f, "'}}'"),
            TokenKind::Colon => write!(f, "':'"),
        }
    }
}

/// Carries the exact failure location for errors we can classify. Plain
/// backtracking failures carry nothing and end up reported as an unexpected
/// character at the start of the token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LexFailure {
    cause: Option<(usize, LexErrorKind)>,
}

impl LexFailure {
    fn cut(position: usize, kind: LexErrorKind) -> ErrMode<Self> {
        ErrMode::Cut(LexFailure {
            cause: Some((position, kind)),
        })
    }
}

impl<I: Stream> ParserError<I> for LexFailure {
    fn from_error_kind(_input: &I, _kind: ErrorKind) -> Self {
        Self::default()
    }

    fn append(
        self,
        _input: &I,
        _token_start: &<I as Stream>::Checkpoint,
        _kind: ErrorKind,
    ) -> Self {
        self
    }
}

/// Splits `source` into tokens, dropping whitespace and comments.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut input = Located::new(source);
    let mut tokens = Vec::new();
    // Only whitespace seen since the last newline (or the start of input).
    let mut line_start = true;
    loop {
        skip_trivia(&mut input, &mut line_start)
            .map_err(|e| lex_error(source, input.location(), e))?;
        if input.eof_offset() == 0 {
            break;
        }
        let start = input.location();
        let kind = token
            .parse_next(&mut input)
            .map_err(|e| lex_error(source, start, e))?;
        line_start = false;
        tokens.push(Token {
            kind,
            span: start..input.location(),
        });
    }
    trace!(count = tokens.len(), "tokenized input");
    Ok(tokens)
}

fn lex_error(source: &str, start: usize, err: ErrMode<LexFailure>) -> LexError {
    let cause = match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.cause,
        ErrMode::Incomplete(_) => None,
    };
    let (position, kind) = cause.unwrap_or((start, LexErrorKind::UnexpectedCharacter));
    let character = source
        .get(position..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or('\0');
    LexError::new(source, position, character, kind)
}

/// Whitespace, and `#` comments running to the end of the line. A `#` only
/// opens a comment when nothing but whitespace precedes it on its line.
fn skip_trivia(input: &mut Input<'_>, line_start: &mut bool) -> PResult<()> {
    loop {
        let blank = take_while(0.., char::is_whitespace).parse_next(input)?;
        if blank.contains('\n') {
            *line_start = true;
        }
        if !*line_start || opt('#').parse_next(input)?.is_none() {
            return Ok(());
        }
        take_till(0.., ['\n']).void().parse_next(input)?;
    }
}

fn token(input: &mut Input<'_>) -> PResult<TokenKind> {
    alt((
        quoted_string.map(TokenKind::String),
        number,
        word,
        punctuation,
    ))
    .parse_next(input)
}

/// ```text
/// number := [-+]? (digit* '.' digit+ | digit+) ([eE] [-+]? digit+)?
/// ```
fn number(input: &mut Input<'_>) -> PResult<TokenKind> {
    let literal = (
        opt(one_of(['+', '-'])),
        alt(((digit0, '.', digit1).void(), digit1.void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)?;
    let value = literal
        .parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(LexFailure::default()))?;
    Ok(TokenKind::Number {
        literal: literal.into(),
        value,
    })
}

/// Identifiers and the `true`/`false` keywords.
///
/// ```text
/// word := letter (letter | digit | '-' | '_')*
/// ```
fn word(input: &mut Input<'_>) -> PResult<TokenKind> {
    let word = (
        one_of(|c: char| c.is_alphabetic()),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '-' || c == '_'),
    )
        .take()
        .parse_next(input)?;
    Ok(match word {
        "true" => TokenKind::Boolean(true),
        "false" => TokenKind::Boolean(false),
        _ => TokenKind::Identifier(word.into()),
    })
}

fn punctuation(input: &mut Input<'_>) -> PResult<TokenKind> {
    alt((
        '{'.value(TokenKind::OpenBrace),
        '}'.value(TokenKind::CloseBrace),
        ':'.value(TokenKind::Colon),
    ))
    .parse_next(input)
}

/// A double-quoted string, returned unescaped. Strings can't span lines.
fn quoted_string(input: &mut Input<'_>) -> PResult<String> {
    let open = input.location();
    '"'.parse_next(input)?;
    let mut value = String::new();
    loop {
        let run = take_till(0.., ['"', '\\', '\n', '\r']).parse_next(input)?;
        value.push_str(run);
        match opt(any).parse_next(input)? {
            Some('"') => return Ok(value),
            Some('\\') => value.push(escape(input, open)?),
            _ => return Err(LexFailure::cut(open, LexErrorKind::UnterminatedString)),
        }
    }
}

/// ```text
/// escape := ["\\/nrtbf0] | 'u{' hex-digit{1, 6} '}'
/// ```
fn escape(input: &mut Input<'_>, open: usize) -> PResult<char> {
    let at = input.location();
    let Some(c) = opt(any).parse_next(input)? else {
        return Err(LexFailure::cut(open, LexErrorKind::UnterminatedString));
    };
    let unescaped = match c {
        '"' => '"',
        '\\' => '\\',
        '/' => '/',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        '0' => '\0',
        'u' => opt(delimited('{', take_while(1..=6, AsChar::is_hex_digit), '}'))
            .parse_next(input)?
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32)
            .ok_or_else(|| LexFailure::cut(at, LexErrorKind::InvalidEscape))?,
        '\n' | '\r' => return Err(LexFailure::cut(open, LexErrorKind::UnterminatedString)),
        _ => return Err(LexFailure::cut(at, LexErrorKind::InvalidEscape)),
    };
    Ok(unescaped)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenizing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn number(literal: &str, value: f64) -> TokenKind {
        TokenKind::Number {
            literal: literal.into(),
            value,
        }
    }

    #[test]
    fn punctuation_and_words() {
        assert_eq!(
            kinds("server-1_a: { on: true trueish false }"),
            vec![
                TokenKind::Identifier("server-1_a".into()),
                TokenKind::Colon,
                TokenKind::OpenBrace,
                TokenKind::Identifier("on".into()),
                TokenKind::Colon,
                TokenKind::Boolean(true),
                TokenKind::Identifier("trueish".into()),
                TokenKind::Boolean(false),
                TokenKind::CloseBrace,
            ]
        );
        assert_eq!(kinds("üñí: 1")[0], TokenKind::Identifier("üñí".into()));
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 -1.5 +1.50e3 .5 2E-2 007"),
            vec![
                number("42", 42.0),
                number("-1.5", -1.5),
                number("+1.50e3", 1500.0),
                number(".5", 0.5),
                number("2E-2", 0.02),
                number("007", 7.0),
            ]
        );
        // A dangling exponent marker is left for the next token.
        assert_eq!(
            kinds("1e"),
            vec![number("1", 1.0), TokenKind::Identifier("e".into())]
        );
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds(r#""" "a\"b\\c\/d\n\r\t\b\f\0" "\u{48}\u{1F600}""#),
            vec![
                TokenKind::String(String::new()),
                TokenKind::String("a\"b\\c/d\n\r\t\u{08}\u{0C}\0".into()),
                TokenKind::String("H😀".into()),
            ]
        );
    }

    #[test]
    fn spans() {
        let tokens = tokenize("a: \"ü\"").expect("tokenizing should succeed");
        let spans: Vec<_> = tokens.into_iter().map(|t| t.span).collect();
        assert_eq!(spans, vec![0..1, 1..2, 3..7]);
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("# leading\n  # indented\na: 1\n\t# last"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Colon,
                number("1", 1.0),
            ]
        );
        assert!(kinds("# only a comment").is_empty());
        assert_eq!(
            kinds("a: {\r\n  # inside\n}"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Colon,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn long_single_line() {
        let leaves = 80_000;
        let source = (0..leaves).map(|i| format!("k{i}: {i} ")).collect::<String>();
        let started = std::time::Instant::now();
        let tokens = tokenize(&source).expect("tokenizing should succeed");
        assert_eq!(tokens.len(), leaves * 3);
        assert_eq!(tokens[3].kind, TokenKind::Identifier("k1".into()));
        assert!(
            started.elapsed() < std::time::Duration::from_secs(5),
            "lexing took {:?}",
            started.elapsed()
        );

        let err = tokenize(&format!("{source}#")).expect_err("tokenizing should fail");
        assert_eq!(err.position, source.len());
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter);
    }

    #[test]
    fn errors() {
        let err = |source: &str| {
            let e = tokenize(source).expect_err("tokenizing should fail");
            (e.position, e.character, e.kind)
        };
        assert_eq!(
            err("a: \"abc"),
            (3, '"', LexErrorKind::UnterminatedString)
        );
        assert_eq!(
            err("a: \"ab\nc\""),
            (3, '"', LexErrorKind::UnterminatedString)
        );
        assert_eq!(err(r#""a\qb""#), (3, 'q', LexErrorKind::InvalidEscape));
        assert_eq!(err(r#""\u{110000}""#), (2, 'u', LexErrorKind::InvalidEscape));
        assert_eq!(err(r#""\u{}""#), (2, 'u', LexErrorKind::InvalidEscape));
        assert_eq!(err("a: 1 ; b: 2"), (5, ';', LexErrorKind::UnexpectedCharacter));
        assert_eq!(err("a: -x"), (3, '-', LexErrorKind::UnexpectedCharacter));
        assert_eq!(
            err("a: 1 # trailing"),
            (5, '#', LexErrorKind::UnexpectedCharacter)
        );
    }
}
