//! Base types shared across the AST: node ids and node sequences.

use std::sync::Arc;

/// A reference to a node within the arena. Stable for the arena's lifetime,
/// including for nodes synthesized after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Sentinel for an absent node (optional child links).
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// An ordered sequence of nodes with positional identity.
///
/// Backed by `Arc<[NodeIndex]>`: cloning is cheap, and `same` reports whether
/// two lists are the same underlying sequence object. The visit engine
/// returns the original list when no element was rewritten, so callers can
/// detect "nothing changed" by identity instead of comparing contents.
#[derive(Debug, Clone)]
pub struct NodeList {
    nodes: Arc<[NodeIndex]>,
}

impl NodeList {
    pub fn new(nodes: Vec<NodeIndex>) -> NodeList {
        NodeList {
            nodes: Arc::from(nodes),
        }
    }

    pub fn empty() -> NodeList {
        NodeList {
            nodes: Arc::from(Vec::new()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<NodeIndex> {
        self.nodes.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().copied()
    }

    /// Identity comparison: true when both lists share the same storage.
    #[inline]
    pub fn same(&self, other: &NodeList) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }
}

impl From<Vec<NodeIndex>> for NodeList {
    fn from(nodes: Vec<NodeIndex>) -> NodeList {
        NodeList::new(nodes)
    }
}

impl FromIterator<NodeIndex> for NodeList {
    fn from_iter<T: IntoIterator<Item = NodeIndex>>(iter: T) -> NodeList {
        NodeList {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = NodeIndex;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeIndex>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}
