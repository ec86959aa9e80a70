use std::sync::Arc;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::NodeId;

/// The toplevel `Error` type for shor: this is returned when a document
/// failed to parse entirely. No partial tree is ever produced alongside it.
///
/// This diagnostic implements [`miette::Diagnostic`] and can be used to
/// display detailed, pretty-printed diagnostic messages when using
/// [`miette::Result`] and the `"fancy"` feature flag for `miette`:
///
/// ```no_run
/// fn main() -> miette::Result<()> {
///     "server: {".parse::<shor::ShorTree>()?;
///     Ok(())
/// }
/// ```
///
/// This will display a message like:
/// ```text
/// Error:
///   × Expected '}', found end of input
///    ╭────
///  1 │ server: {
///    ·          ▲
///    ·          ╰── here
///    ╰────
///   help: Every '{' needs a matching '}'.
/// ```
#[derive(Debug, Diagnostic, Error, Clone, Eq, PartialEq)]
pub enum ShorError {
    /// The input contained text that is not a valid token.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    /// The tokens did not form a valid document.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

impl ShorError {
    /// Byte offset into the input where the failure was detected.
    pub fn position(&self) -> usize {
        match self {
            ShorError::Lex(e) => e.position,
            ShorError::Parse(e) => e.position,
        }
    }

    /// 1-based line and column (in chars) of [`ShorError::position`].
    pub fn line_col(&self) -> (usize, usize) {
        match self {
            ShorError::Lex(e) => e.line_col(),
            ShorError::Parse(e) => e.line_col(),
        }
    }
}

/// What went wrong while tokenizing.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum LexErrorKind {
    /// A string was still open at a raw newline or at the end of input.
    #[error("Unterminated string")]
    UnterminatedString,

    /// A backslash was followed by something that isn't a known escape.
    #[error("Invalid escape sequence")]
    InvalidEscape,

    /// A character that can't start any token, outside of a comment.
    #[error("Unexpected character")]
    UnexpectedCharacter,
}

/// A tokenization failure.
#[derive(Debug, Diagnostic, Error, Clone, Eq, PartialEq)]
#[error("{kind} {character:?}")]
pub struct LexError {
    /// Original input that this failure came from.
    #[source_code]
    pub input: Arc<String>,

    /// Location of the offending character.
    #[label("here")]
    pub span: SourceSpan,

    /// Byte offset of the offending character.
    pub position: usize,

    /// The offending character. For unterminated strings, this is the
    /// opening quote.
    pub character: char,

    /// Classification of the failure.
    pub kind: LexErrorKind,

    /// Suggestion for fixing the failure.
    #[help]
    pub help: Option<String>,
}

impl LexError {
    pub(crate) fn new(input: &str, position: usize, character: char, kind: LexErrorKind) -> Self {
        let help = match kind {
            LexErrorKind::UnterminatedString => {
                Some("Strings must be closed with '\"' on the line they start on.".into())
            }
            LexErrorKind::InvalidEscape => Some(
                "Valid escapes are \\\" \\\\ \\/ \\n \\r \\t \\b \\f \\0 and \\u{XXXX}.".into(),
            ),
            LexErrorKind::UnexpectedCharacter if character == '#' => {
                Some("Comments must start at the beginning of a line.".into())
            }
            LexErrorKind::UnexpectedCharacter => None,
        };
        LexError {
            input: Arc::new(input.into()),
            span: (position..position + character.len_utf8()).into(),
            position,
            character,
            kind,
            help,
        }
    }

    /// 1-based line and column (in chars) of the offending character.
    pub fn line_col(&self) -> (usize, usize) {
        line_col(&self.input, self.position)
    }
}

/// A grammar violation: an unexpected token, a missing token, or unconsumed
/// trailing input.
#[derive(Debug, Diagnostic, Error, Clone, Eq, PartialEq)]
#[error("Expected {expected}, found {found}")]
pub struct ParseError {
    /// Original input that this failure came from.
    #[source_code]
    pub input: Arc<String>,

    /// Location of the token that was found instead.
    #[label("here")]
    pub span: SourceSpan,

    /// Byte offset of the token that was found instead.
    pub position: usize,

    /// Description of what the grammar allowed at this point.
    pub expected: String,

    /// Description of what was actually there.
    pub found: String,

    /// Suggestion for fixing the failure.
    #[help]
    pub help: Option<String>,
}

impl ParseError {
    pub(crate) fn new(
        input: &str,
        span: std::ops::Range<usize>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        ParseError {
            input: Arc::new(input.into()),
            position: span.start,
            span: span.into(),
            expected: expected.into(),
            found: found.into(),
            help: None,
        }
    }

    pub(crate) fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// 1-based line and column (in chars) of the unexpected token.
    pub fn line_col(&self) -> (usize, usize) {
        line_col(&self.input, self.position)
    }
}

/// Failure of a structural edit (`append`/`insert`/`set_key`/node creation).
#[derive(Debug, Diagnostic, Error, Clone, Eq, PartialEq)]
pub enum EditError {
    /// Children can only be attached to Table nodes.
    #[error("Node {0} is not a table")]
    NotATable(NodeId),

    /// Insertion position past the end of the children list.
    #[error("Position {pos} is out of bounds for a table with {len} children")]
    IndexOutOfBounds {
        /// Requested position.
        pos: usize,
        /// Number of children at the time of the call.
        len: usize,
    },

    /// The child must be detached before it can be attached elsewhere.
    #[error("Node {0} already has a parent")]
    AlreadyAttached(NodeId),

    /// The root can never become a child, be renamed or be discarded.
    #[error("The root node can't be attached, renamed or discarded")]
    RootNode,

    /// The parent lies inside the child's own subtree.
    #[error("Attaching node {0} would create a cycle")]
    Cycle(NodeId),

    /// The id doesn't refer to a live node of this tree.
    #[error("Node {0} does not exist in this tree")]
    StaleNode(NodeId),

    /// Keys must be empty or a letter followed by letters, digits, `-` or `_`.
    #[error("{0:?} is not a valid key")]
    #[diagnostic(help("Keys start with a letter, followed by letters, digits, '-' or '_'."))]
    InvalidKey(String),

    /// NaN and infinities have no literal form.
    #[error("Numbers must be finite")]
    NonFiniteNumber,
}

pub(crate) fn line_col(input: &str, offset: usize) -> (usize, usize) {
    let before = input.get(..offset).unwrap_or(input);
    let line = before.matches('\n').count() + 1;
    let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, col)
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn parse_error() {
        let err = ParseError::new("a: {", 4..4, "'}'", "end of input");

        assert_eq!(err.to_string(), "Expected '}', found end of input");
        assert_eq!(err.position, 4);
        assert_eq!(err.line_col(), (1, 5));
        assert!(err.source().is_none());
    }

    #[test]
    fn lex_error() {
        let err = LexError::new("a: 1\nb: \"abc", 8, '"', LexErrorKind::UnterminatedString);

        assert_eq!(err.to_string(), "Unterminated string '\"'");
        assert_eq!(err.line_col(), (2, 4));
        assert!(err.help.is_some());

        let wrapped = ShorError::from(err);
        assert_eq!(wrapped.position(), 8);
        assert_eq!(wrapped.line_col(), (2, 4));
    }

    #[test]
    fn line_col_counts_chars() {
        assert_eq!(line_col("", 0), (1, 1));
        assert_eq!(line_col("ü: ?", 4), (1, 4));
        assert_eq!(line_col("a\n\nb", 3), (3, 1));
    }
}
