use std::{ops::Range, vec};

use tracing::debug;

use crate::{
    lexer::{Token, TokenKind},
    node::{NodeContent, NodeData},
    NodeId, ParseError, ShorTree, ShorValue,
};

/// Parser over the output of [`tokenize`](crate::lexer::tokenize).
///
/// ```text
/// Document := Node*
/// Node     := (Identifier ':')? Value
/// Value    := '{' Node* '}' | Number | Boolean | String
/// ```
///
/// Open tables live on an explicit stack rather than the call stack, so
/// nesting depth is bounded only by memory.
pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: vec::IntoIter<Token>,
    tree: ShorTree,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Parser {
            source,
            tokens: tokens.into_iter(),
            tree: ShorTree::new(),
        }
    }

    /// Consumes every token, returning the whole tree or the first error.
    pub(crate) fn parse_document(mut self) -> Result<ShorTree, ParseError> {
        let root = self.tree.root();
        // Tables whose '}' hasn't been seen yet, with their start offsets.
        let mut open: Vec<(NodeId, usize)> = Vec::new();
        while let Some(token) = self.tokens.next() {
            match (token, open.last().copied()) {
                (
                    Token {
                        kind: TokenKind::CloseBrace,
                        span,
                    },
                    Some((table, start)),
                ) => {
                    open.pop();
                    self.set_span(table, start..span.end);
                }
                (token, innermost) => {
                    let parent = innermost.map_or(root, |(table, _)| table);
                    if let Some(table) = self.parse_node(parent, token)? {
                        open.push(table);
                    }
                }
            }
        }
        if !open.is_empty() {
            return Err(self
                .unexpected(None, "'}'")
                .with_help("Every '{' needs a matching '}'."));
        }
        self.set_span(root, 0..self.source.len());
        debug!(nodes = self.tree.len(), "parsed document");
        Ok(self.tree)
    }

    /// Parses one node into `parent`. A table comes back with its start
    /// offset, still open.
    fn parse_node(
        &mut self,
        parent: NodeId,
        first: Token,
    ) -> Result<Option<(NodeId, usize)>, ParseError> {
        let start = first.span.start;
        let (key, token) = match first.kind {
            TokenKind::Identifier(key) => {
                match self.tokens.next() {
                    Some(Token {
                        kind: TokenKind::Colon,
                        ..
                    }) => {}
                    other => return Err(self.unexpected(other.as_ref(), "':'")),
                }
                let Some(token) = self.tokens.next() else {
                    return Err(self.unexpected(None, "a value"));
                };
                (Some(key), token)
            }
            kind => (
                None,
                Token {
                    kind,
                    span: first.span,
                },
            ),
        };
        let expected = if key.is_some() {
            "a value"
        } else {
            "a key or value"
        };
        let key = key.unwrap_or_default();

        let span = start..token.span.end;
        let data = match token.kind {
            TokenKind::OpenBrace => {
                let id = self.push(parent, NodeData::table(key), start..start);
                return Ok(Some((id, start)));
            }
            TokenKind::Number { literal, value } => {
                NodeData::leaf(key, ShorValue::Number(value), Some(literal))
            }
            TokenKind::Boolean(value) => NodeData::leaf(key, ShorValue::Boolean(value), None),
            TokenKind::String(value) => NodeData::leaf(key, ShorValue::String(value), None),
            kind => {
                let token = Token {
                    kind,
                    span: token.span,
                };
                return Err(self.unexpected(Some(&token), expected));
            }
        };
        self.push(parent, data, span);
        Ok(None)
    }

    fn push(&mut self, parent: NodeId, mut data: NodeData, span: Range<usize>) -> NodeId {
        data.parent = Some(parent);
        let id = self.tree.alloc(data);
        if let Some(NodeData {
            content: NodeContent::Table(children),
            ..
        }) = self.tree.data_mut(parent)
        {
            children.push(id);
        }
        self.set_span(id, span);
        id
    }

    #[cfg(feature = "span")]
    fn set_span(&mut self, id: NodeId, span: Range<usize>) {
        if let Some(data) = self.tree.data_mut(id) {
            data.span = span.into();
        }
    }

    #[cfg(not(feature = "span"))]
    fn set_span(&mut self, _id: NodeId, _span: Range<usize>) {}

    fn unexpected(&self, token: Option<&Token>, expected: &str) -> ParseError {
        match token {
            Some(token) => ParseError::new(
                self.source,
                token.span.clone(),
                expected,
                token.kind.to_string(),
            ),
            None => {
                let end = self.source.len();
                ParseError::new(self.source, end..end, expected, "end of input")
            }
        }
    }
}
