use std::{borrow::Cow, fmt::Display};

#[cfg(feature = "span")]
use miette::SourceSpan;

use crate::{FormatConfig, FromShorValue, ShorKind, ShorQuery, ShorTree, ShorValue};

/// Handle to a node inside a [`ShorTree`].
///
/// An id is an arena slot index plus the generation of that slot. Freed
/// slots are reused, but reuse bumps the generation, so an id never becomes
/// valid again once its node has been removed. Using a stale id is never a
/// panic, it just yields `None`/`false`/an [`EditError`](crate::EditError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            generation => write!(f, "#{}.{}", self.index, generation),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeContent {
    Leaf {
        value: ShorValue,
        // Source text for parsed numbers, so `+1.50e3` formats as written.
        repr: Option<String>,
    },
    Table(Vec<NodeId>),
}

/// An arena slot. `data` is `None` while the slot sits on the free list.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) data: Option<NodeData>,
}

/// A single node's contents.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    // Empty for keyless nodes.
    pub(crate) key: String,
    pub(crate) content: NodeContent,
    pub(crate) parent: Option<NodeId>,
    #[cfg(feature = "span")]
    pub(crate) span: SourceSpan,
}

impl NodeData {
    pub(crate) fn table(key: impl Into<String>) -> Self {
        NodeData {
            key: key.into(),
            content: NodeContent::Table(Vec::new()),
            parent: None,
            #[cfg(feature = "span")]
            span: (0..0).into(),
        }
    }

    pub(crate) fn leaf(key: impl Into<String>, value: ShorValue, repr: Option<String>) -> Self {
        NodeData {
            key: key.into(),
            content: NodeContent::Leaf { value, repr },
            parent: None,
            #[cfg(feature = "span")]
            span: (0..0).into(),
        }
    }

    pub(crate) fn kind(&self) -> ShorKind {
        match &self.content {
            NodeContent::Leaf { value, .. } => value.kind(),
            NodeContent::Table(_) => ShorKind::Table,
        }
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.content {
            NodeContent::Table(children) => children,
            NodeContent::Leaf { .. } => &[],
        }
    }
}

/// A borrowed view of a single node in a [`ShorTree`].
///
/// Views are cheap to copy. They are what [`ShorQuery`] iterates over, and
/// their [`Display`] implementation renders the node in single-line form.
#[derive(Debug, Clone, Copy)]
pub struct ShorNode<'a> {
    pub(crate) tree: &'a ShorTree,
    pub(crate) id: NodeId,
    pub(crate) data: &'a NodeData,
}

impl<'a> ShorNode<'a> {
    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this node lives in.
    pub fn tree(&self) -> &'a ShorTree {
        self.tree
    }

    /// This node's key, or `""` for a keyless node (and for the root).
    pub fn key(&self) -> &'a str {
        &self.data.key
    }

    /// Whether this node is its tree's root.
    pub fn is_root(&self) -> bool {
        self.id == self.tree.root()
    }

    /// The kind of this node.
    pub fn kind(&self) -> ShorKind {
        self.data.kind()
    }

    /// Whether this node is a table.
    pub fn is_table(&self) -> bool {
        self.kind() == ShorKind::Table
    }

    /// The typed value of a leaf, or `None` for a table.
    pub fn value(&self) -> Option<&'a ShorValue> {
        match &self.data.content {
            NodeContent::Leaf { value, .. } => Some(value),
            NodeContent::Table(_) => None,
        }
    }

    /// Reads the leaf's value as `T`. See [`ShorTree::get`].
    pub fn get<T: FromShorValue>(&self) -> Option<T> {
        self.value().and_then(T::from_shor_value)
    }

    /// The canonical text of a leaf's value: numbers as written (or as
    /// last set), `true`/`false`, and unescaped string content. `None` for
    /// a table.
    pub fn literal(&self) -> Option<Cow<'a, str>> {
        match &self.data.content {
            NodeContent::Leaf {
                repr: Some(repr), ..
            } => Some(Cow::Borrowed(repr)),
            NodeContent::Leaf {
                value: ShorValue::String(s),
                ..
            } => Some(Cow::Borrowed(s)),
            NodeContent::Leaf { value, .. } => Some(Cow::Owned(value.to_string())),
            NodeContent::Table(_) => None,
        }
    }

    /// The parent of this node, if it's attached to one.
    pub fn parent(&self) -> Option<ShorNode<'a>> {
        self.data.parent.and_then(|id| self.tree.node(id))
    }

    /// Ids of this node's children. Empty for leaves.
    pub fn child_ids(&self) -> &'a [NodeId] {
        self.data.children()
    }

    /// Iterates over this node's children in document order.
    pub fn children(&self) -> impl Iterator<Item = ShorNode<'a>> + 'a {
        let tree = self.tree;
        self.data
            .children()
            .iter()
            .filter_map(move |id| tree.node(*id))
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.data.children().len()
    }

    /// Returns true if this node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A query seeded with just this node.
    pub fn query(&self) -> ShorQuery<'a> {
        self.tree.query_from(self.id)
    }

    /// Renders this node. See [`ShorTree::format`].
    pub fn format(&self, depth: isize, indent: &str) -> String {
        self.tree.format(self.id, depth, indent)
    }

    /// Renders this node with an explicit [`FormatConfig`].
    pub fn format_with(&self, config: &FormatConfig<'_>) -> String {
        self.tree.format_with(self.id, config)
    }

    /// Gets this node's span in the text it was parsed from.
    ///
    /// This value will be properly initialized when created via
    /// [`ShorTree::parse`] but is empty for nodes created programmatically,
    /// and isn't updated by edits.
    #[cfg(feature = "span")]
    pub fn span(&self) -> SourceSpan {
        self.data.span
    }
}

/// Structural equality: same keys, kinds, leaf values and child order. Ids,
/// spans and number spellings (`1` vs `1.0`) are ignored.
impl PartialEq for ShorNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(*self, *other)];
        while let Some((a, b)) = pending.pop() {
            if a.key() != b.key() {
                return false;
            }
            match (&a.data.content, &b.data.content) {
                (NodeContent::Leaf { value: x, .. }, NodeContent::Leaf { value: y, .. }) => {
                    if x != y {
                        return false;
                    }
                }
                (NodeContent::Table(x), NodeContent::Table(y)) if x.len() == y.len() => {
                    pending.extend(a.children().zip(b.children()));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Display for ShorNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.tree.stringify(f, self.id, &FormatConfig::compact())
    }
}
