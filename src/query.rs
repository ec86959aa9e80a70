use std::fmt::Display;

use crate::{NodeId, ShorNode, ShorTree};

/// Query key that matches every child, whatever its key.
pub const WILDCARD: &str = "*";

/// An ordered selection of nodes from a single [`ShorTree`].
///
/// Queries are built by chaining combinators, each of which looks at the
/// direct children of every node in the current selection:
///
/// ```rust
/// use shor::ShorTree;
///
/// let tree: ShorTree = r#"
/// http: {
///     include: "mime.types"
///     server: { listen: 80 }
///     include: "proxy.conf"
///     include: "fastcgi.conf"
/// }
/// "#.parse().unwrap();
///
/// let includes = tree.query().all("http").last_n("include", 2);
/// assert_eq!(includes.to_string(), r#"[include:"proxy.conf" include:"fastcgi.conf"]"#);
///
/// let listen = tree.query().first("http").at("*", 1).first("listen");
/// assert_eq!(listen.nodes().next().and_then(|n| n.get::<f64>()), Some(80.0));
/// ```
///
/// A key of [`WILDCARD`] (`"*"`) matches every child; the empty key `""`
/// matches keyless children. Positions may be negative, counting back from
/// the last match (`-1` is the last one). No match, an out-of-range position
/// or an empty selection all simply produce an empty query.
///
/// Queries borrow the tree, so collect [`ShorQuery::ids`] before editing it.
#[derive(Debug, Clone)]
pub struct ShorQuery<'a> {
    tree: &'a ShorTree,
    nodes: Vec<NodeId>,
}

impl<'a> ShorQuery<'a> {
    pub(crate) fn new(tree: &'a ShorTree, nodes: Vec<NodeId>) -> Self {
        Self { tree, nodes }
    }

    /// For every node in this query, selects the matches of `key` among its
    /// children from `start` to `end`, both inclusive and both allowed to be
    /// negative. See [`calc_range`].
    pub fn range(&self, key: &str, start: isize, end: isize) -> Self {
        self.select(key, |len| calc_range(start, end, len))
    }

    /// All children matching `key`.
    pub fn all(&self, key: &str) -> Self {
        self.range(key, 0, -1)
    }

    /// The `n`th child matching `key`; negative `n` counts from the end.
    pub fn at(&self, key: &str, n: isize) -> Self {
        self.range(key, n, n)
    }

    /// The first child matching `key`.
    pub fn first(&self, key: &str) -> Self {
        self.at(key, 0)
    }

    /// The last child matching `key`.
    pub fn last(&self, key: &str) -> Self {
        self.at(key, -1)
    }

    /// The first `n` children matching `key`, or all of them if there are
    /// fewer. Empty for `n <= 0`.
    pub fn first_n(&self, key: &str, n: isize) -> Self {
        if n <= 0 {
            return self.empty();
        }
        self.range(key, 0, n - 1)
    }

    /// The last `n` children matching `key`, or all of them if there are
    /// fewer. Empty for `n <= 0`.
    pub fn last_n(&self, key: &str, n: isize) -> Self {
        if n <= 0 {
            return self.empty();
        }
        self.select(key, |len| {
            let len_i = isize::try_from(len).unwrap_or(isize::MAX);
            calc_range(-(n.min(len_i)), -1, len)
        })
    }

    /// Number of selected nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The selected node ids, in order.
    pub fn ids(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Consumes the query, keeping only the ids. Useful to release the
    /// borrow on the tree before editing the selected nodes.
    pub fn into_ids(self) -> Vec<NodeId> {
        self.nodes
    }

    /// The `idx`th selected node.
    pub fn get(&self, idx: usize) -> Option<ShorNode<'a>> {
        self.nodes.get(idx).and_then(|id| self.tree.node(*id))
    }

    /// Iterates over the selected nodes.
    pub fn nodes(&self) -> impl Iterator<Item = ShorNode<'a>> + '_ {
        self.nodes.iter().filter_map(|id| self.tree.node(*id))
    }

    /// Same as [`ShorQuery::nodes`].
    pub fn iter(&self) -> impl Iterator<Item = ShorNode<'a>> + '_ {
        self.nodes()
    }

    fn empty(&self) -> Self {
        Self::new(self.tree, Vec::new())
    }

    fn select(&self, key: &str, bounds: impl Fn(usize) -> (usize, usize)) -> Self {
        let mut matched = Vec::new();
        for id in &self.nodes {
            let children = self.tree.children(*id);
            if key == WILDCARD {
                let (start, end) = bounds(children.len());
                matched.extend_from_slice(&children[start..end]);
            } else {
                let submatch: Vec<NodeId> = children
                    .iter()
                    .copied()
                    .filter(|child| self.tree.key(*child) == Some(key))
                    .collect();
                let (start, end) = bounds(submatch.len());
                matched.extend_from_slice(&submatch[start..end]);
            }
        }
        Self::new(self.tree, matched)
    }
}

/// Converts an inclusive, possibly end-relative `start..=end` into a
/// half-open range within `0..max`.
///
/// Negative bounds have `max` added to them, so `-1` is the last element.
/// If the adjusted range is empty or still reaches below zero, the result
/// is `(0, 0)`; otherwise both bounds are clamped to `max`.
///
/// ```rust
/// use shor::calc_range;
///
/// assert_eq!(calc_range(-4, -1, 5), (1, 5));
/// assert_eq!(calc_range(0, -1, 5), (0, 5));
/// assert_eq!(calc_range(2, 1, 5), (0, 0));
/// assert_eq!(calc_range(10, 10, 5), (5, 5));
/// ```
pub fn calc_range(start: isize, end: isize, max: usize) -> (usize, usize) {
    let max_i = isize::try_from(max).unwrap_or(isize::MAX);
    let start = if start < 0 { start + max_i } else { start };
    let end = if end < 0 { end + max_i } else { end };
    let end = end.saturating_add(1);
    if end <= start || start < 0 || end < 0 {
        return (0, 0);
    }
    // Both are non-negative here.
    let clamp = |bound: isize| usize::try_from(bound).map_or(max, |b| b.min(max));
    (clamp(start), clamp(end))
}

/// Renders as `[node node ...]`, each node in single-line form.
impl Display for ShorQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, node) in self.nodes().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, "]")
    }
}

impl<'q> IntoIterator for &'q ShorQuery<'_> {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'q, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}
