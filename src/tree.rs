use std::{fmt::Display, str::FromStr};

use tracing::{debug, trace};

use crate::{
    node::{NodeContent, NodeData, Slot},
    EditError, FromShorValue, NodeId, ShorError, ShorKind, ShorNode, ShorQuery, ShorValue,
};

/// A parsed (or programmatically built) shor document.
///
/// All nodes live in an arena owned by the tree and are addressed by
/// [`NodeId`]. The root is a Table that is never rendered itself: the
/// document's top-level nodes are its children.
///
/// Reads go through `&self` and may be shared freely (queries borrow the
/// tree); edits need `&mut self`, so no query can be alive while the tree
/// changes.
///
/// Slots freed by [`ShorTree::remove`], [`ShorTree::set`] and
/// [`ShorTree::discard`] are reused by later allocations, so the arena only
/// grows to the peak number of live nodes. Detached nodes that are never
/// attached stay alive until discarded or until the tree is dropped.
#[derive(Debug, Clone)]
pub struct ShorTree {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
    pub(crate) root: NodeId,
}

impl Default for ShorTree {
    fn default() -> Self {
        let mut tree = ShorTree {
            nodes: Vec::new(),
            free: Vec::new(),
            live: 0,
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(NodeData::table(""));
        tree
    }
}

impl ShorTree {
    /// Creates a new, empty tree.
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse a shor document from a string into a [`ShorTree`].
    pub fn parse(input: &str) -> Result<Self, ShorError> {
        crate::parse(input)
    }

    /// The root node's id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// A view of the root node.
    pub fn root_node(&self) -> ShorNode<'_> {
        self.node(self.root).expect("the root slot is never freed")
    }

    /// A view of a node, or `None` if the id is stale.
    pub fn node(&self, id: NodeId) -> Option<ShorNode<'_>> {
        self.data(id).map(|data| ShorNode {
            tree: self,
            id,
            data,
        })
    }

    /// Whether `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// Number of live nodes, including the root and detached nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if the document has no top-level nodes.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// A node's key (`""` for keyless nodes), or `None` if the id is stale.
    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.data(id).map(|data| data.key.as_str())
    }

    /// A node's kind, or `None` if the id is stale.
    pub fn kind(&self, id: NodeId) -> Option<ShorKind> {
        self.data(id).map(NodeData::kind)
    }

    /// A node's parent. `None` for the root, detached nodes and stale ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|data| data.parent)
    }

    /// A node's children, in document order. Empty for leaves and stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(NodeData::children).unwrap_or_default()
    }

    /// A leaf's typed value. `None` for tables and stale ids.
    pub fn value(&self, id: NodeId) -> Option<&ShorValue> {
        match &self.data(id)?.content {
            NodeContent::Leaf { value, .. } => Some(value),
            NodeContent::Table(_) => None,
        }
    }

    /// Reads a leaf's value as `f64`, `bool` or `String`.
    ///
    /// Returns `None` when the node's kind doesn't match the requested type:
    /// a type mismatch is a negative answer, not an error.
    ///
    /// ```rust
    /// # use shor::ShorTree;
    /// let tree: ShorTree = "port: 8080 tls: false".parse().unwrap();
    /// let port = tree.query().first("port").ids()[0];
    /// assert_eq!(tree.get::<f64>(port), Some(8080.0));
    /// assert_eq!(tree.get::<bool>(port), None);
    /// ```
    pub fn get<T: FromShorValue>(&self, id: NodeId) -> Option<T> {
        self.value(id).and_then(T::from_shor_value)
    }

    /// Replaces a node's content with a scalar value.
    ///
    /// The node's kind follows the value's type (any integer or float type
    /// becomes a Number). If the node was a table, its whole child subtree
    /// is destroyed. Returns `false`, leaving the node untouched, if the id
    /// is stale, if the node is the root (which must stay a table), or if the
    /// value is a non-finite number.
    pub fn set(&mut self, id: NodeId, value: impl Into<ShorValue>) -> bool {
        let value = value.into();
        if id == self.root || !value.is_representable() {
            trace!(%id, "rejected set");
            return false;
        }
        let Some(data) = self.data_mut(id) else {
            return false;
        };
        let leaf = NodeContent::Leaf { value, repr: None };
        let previous = std::mem::replace(&mut data.content, leaf);
        if let NodeContent::Table(children) = previous {
            for child in children {
                self.destroy(child);
            }
        }
        true
    }

    /// Creates a detached leaf node. Attach it with [`ShorTree::append`] or
    /// [`ShorTree::insert`].
    ///
    /// `key` must be empty (keyless) or a valid identifier.
    pub fn new_leaf(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ShorValue>,
    ) -> Result<NodeId, EditError> {
        let key = validate_key(key.into())?;
        let value = value.into();
        if !value.is_representable() {
            return Err(EditError::NonFiniteNumber);
        }
        Ok(self.alloc(NodeData::leaf(key, value, None)))
    }

    /// Creates a detached, empty table node.
    ///
    /// `key` must be empty (keyless) or a valid identifier.
    pub fn new_table(&mut self, key: impl Into<String>) -> Result<NodeId, EditError> {
        let key = validate_key(key.into())?;
        Ok(self.alloc(NodeData::table(key)))
    }

    /// Renames a node. An empty key makes it keyless.
    pub fn set_key(&mut self, id: NodeId, key: impl Into<String>) -> Result<(), EditError> {
        let key = validate_key(key.into())?;
        if id == self.root {
            return Err(EditError::RootNode);
        }
        let data = self.data_mut(id).ok_or(EditError::StaleNode(id))?;
        data.key = key;
        Ok(())
    }

    /// Adds `child` after `parent`'s last child.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), EditError> {
        let len = self.check_attach(parent, child)?;
        self.attach(parent, child, len);
        Ok(())
    }

    /// Inserts `child` at `pos` among `parent`'s children, `pos` being in
    /// `0..=len`.
    pub fn insert(&mut self, parent: NodeId, child: NodeId, pos: usize) -> Result<(), EditError> {
        let len = self.check_attach(parent, child)?;
        if pos > len {
            return Err(EditError::IndexOutOfBounds { pos, len });
        }
        self.attach(parent, child, pos);
        Ok(())
    }

    /// Removes `child` from `parent`'s children and destroys its subtree.
    ///
    /// Returns `false` if `child` isn't one of `parent`'s children.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(NodeData {
            content: NodeContent::Table(children),
            ..
        }) = self.data_mut(parent)
        else {
            return false;
        };
        let Some(idx) = children.iter().position(|c| *c == child) else {
            return false;
        };
        children.remove(idx);
        self.destroy(child);
        debug!(%parent, %child, "removed node");
        true
    }

    /// Destroys a detached node and its subtree, freeing their slots.
    ///
    /// Use this for nodes built with [`ShorTree::new_leaf`] or
    /// [`ShorTree::new_table`] that end up unused. Attached nodes go through
    /// [`ShorTree::remove`] instead.
    pub fn discard(&mut self, id: NodeId) -> Result<(), EditError> {
        let data = self.data(id).ok_or(EditError::StaleNode(id))?;
        if id == self.root {
            return Err(EditError::RootNode);
        }
        if data.parent.is_some() {
            return Err(EditError::AlreadyAttached(id));
        }
        self.destroy(id);
        debug!(%id, "discarded node");
        Ok(())
    }

    /// A query seeded with the root node.
    pub fn query(&self) -> ShorQuery<'_> {
        self.query_from(self.root)
    }

    /// A query seeded with a single node. Empty if the id is stale.
    pub fn query_from(&self, id: NodeId) -> ShorQuery<'_> {
        let nodes = if self.contains(id) { vec![id] } else { vec![] };
        ShorQuery::new(self, nodes)
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.nodes.get_mut(index) {
                slot.data = Some(data);
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        self.nodes.push(Slot {
            generation: 0,
            data: Some(data),
        });
        NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    /// Empties a live slot. The slot goes back on the free list under a new
    /// generation; one whose generation is exhausted is never reused.
    fn release(&mut self, id: NodeId) -> Option<NodeData> {
        let slot = self
            .nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let data = slot.data.take()?;
        self.live -= 1;
        if let Some(generation) = slot.generation.checked_add(1) {
            slot.generation = generation;
            self.free.push(id.index);
        }
        Some(data)
    }

    /// Validates an attach and returns the parent's current child count.
    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<usize, EditError> {
        let parent_data = self.data(parent).ok_or(EditError::StaleNode(parent))?;
        let NodeContent::Table(children) = &parent_data.content else {
            return Err(EditError::NotATable(parent));
        };
        let child_data = self.data(child).ok_or(EditError::StaleNode(child))?;
        if child == self.root {
            return Err(EditError::RootNode);
        }
        if child_data.parent.is_some() {
            return Err(EditError::AlreadyAttached(child));
        }
        // A detached child can still own the parent through its subtree.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(EditError::Cycle(child));
            }
            cursor = self.parent(id);
        }
        Ok(children.len())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, pos: usize) {
        if let Some(NodeData {
            content: NodeContent::Table(children),
            ..
        }) = self.data_mut(parent)
        {
            children.insert(pos, child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = Some(parent);
        }
        trace!(%parent, %child, pos, "attached node");
    }

    /// Frees `id` and everything below it.
    fn destroy(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.release(id) {
                if let NodeContent::Table(children) = data.content {
                    stack.extend(children);
                }
            }
        }
    }
}

/// Keys are empty, or a letter followed by letters, digits, `-` and `_`.
pub(crate) fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        None => true,
        Some(first) => {
            first.is_alphabetic()
                && chars.all(|c| c.is_alphanumeric() || c == '-' || c == '_')
                && key != "true"
                && key != "false"
        }
    }
}

fn validate_key(key: String) -> Result<String, EditError> {
    if is_valid_key(&key) {
        Ok(key)
    } else {
        Err(EditError::InvalidKey(key))
    }
}

/// Structural equality of the two documents. See [`ShorNode`]'s `PartialEq`.
impl PartialEq for ShorTree {
    fn eq(&self, other: &Self) -> bool {
        self.root_node() == other.root_node()
    }
}

/// Single-line rendering of the whole document.
impl Display for ShorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.root_node(), f)
    }
}

impl FromStr for ShorTree {
    type Err = ShorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ShorTree::parse(input)
    }
}
