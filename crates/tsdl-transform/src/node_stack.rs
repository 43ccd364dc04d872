//! Ancestor stack maintained by the pipeline driver.
//!
//! The stack always reads root-to-current; the driver pushes before
//! descending into a node's rules and pops (or restores the saved entry)
//! on the way out. Lookups walk from the top toward the root.

use tsdl_ast::NodeIndex;

#[derive(Debug, Default)]
pub struct NodeStack {
    nodes: Vec<NodeIndex>,
}

impl NodeStack {
    pub fn new() -> NodeStack {
        NodeStack { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node whose rules are currently running, if any.
    pub fn current(&self) -> Option<NodeIndex> {
        self.nodes.last().copied()
    }

    /// Parent of the current node, if any.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.nodes.len().checked_sub(2).map(|at| self.nodes[at])
    }

    pub fn push(&mut self, node: NodeIndex) {
        self.nodes.push(node);
    }

    /// Push `node` unless it is already on top. Returns whether a push
    /// happened, so the caller knows whether to pop afterwards. Used when a
    /// rule re-enters the driver for the node it is already processing.
    pub fn try_push(&mut self, node: NodeIndex) -> bool {
        if self.current() == Some(node) {
            false
        } else {
            self.nodes.push(node);
            true
        }
    }

    pub fn pop(&mut self) -> Option<NodeIndex> {
        self.nodes.pop()
    }

    /// Replace the top entry. The array driver pushes a placeholder once
    /// and rewrites it per element instead of popping and pushing in a loop.
    pub fn set_top(&mut self, node: NodeIndex) {
        match self.nodes.last_mut() {
            Some(top) => *top = node,
            None => self.nodes.push(node),
        }
    }

    /// Nearest enclosing node (current included) matching the predicate.
    pub fn find_ancestor(&self, mut matches: impl FnMut(NodeIndex) -> bool) -> Option<NodeIndex> {
        self.nodes.iter().rev().copied().find(|&node| matches(node))
    }

    /// Root-to-current snapshot of the stack.
    pub fn snapshot(&self) -> Vec<NodeIndex> {
        self.nodes.clone()
    }
}

/// An owned copy of the ancestor chain at a point in time.
///
/// Rules that need to consult ancestry after the driver has moved on (for
/// example from a deferred emit callback) capture one of these; it stays
/// valid however the live stack changes afterwards.
#[derive(Debug, Clone)]
pub struct ParentNavigator {
    chain: Vec<NodeIndex>,
    at: usize,
}

impl ParentNavigator {
    pub(crate) fn from_stack(stack: &NodeStack) -> ParentNavigator {
        let chain = stack.snapshot();
        let at = chain.len().saturating_sub(1);
        ParentNavigator { chain, at }
    }

    pub fn current(&self) -> Option<NodeIndex> {
        self.chain.get(self.at).copied()
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.at.checked_sub(1).and_then(|at| self.chain.get(at).copied())
    }

    /// Move toward the root. Returns the new current node, or `None` at the
    /// root.
    pub fn move_up(&mut self) -> Option<NodeIndex> {
        let at = self.at.checked_sub(1)?;
        self.at = at;
        self.chain.get(at).copied()
    }

    /// Move toward the original snapshot position.
    pub fn move_down(&mut self) -> Option<NodeIndex> {
        if self.at + 1 < self.chain.len() {
            self.at += 1;
            self.chain.get(self.at).copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_and_parent() {
        let mut stack = NodeStack::new();
        stack.push(NodeIndex(0));
        stack.push(NodeIndex(1));
        stack.push(NodeIndex(2));
        assert_eq!(stack.current(), Some(NodeIndex(2)));
        assert_eq!(stack.parent(), Some(NodeIndex(1)));
        assert_eq!(stack.pop(), Some(NodeIndex(2)));
        assert_eq!(stack.current(), Some(NodeIndex(1)));
    }

    #[test]
    fn try_push_skips_the_node_already_on_top() {
        let mut stack = NodeStack::new();
        assert!(stack.try_push(NodeIndex(5)));
        assert!(!stack.try_push(NodeIndex(5)));
        assert_eq!(stack.len(), 1);
        assert!(stack.try_push(NodeIndex(6)));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn set_top_rewrites_in_place() {
        let mut stack = NodeStack::new();
        stack.push(NodeIndex(1));
        stack.push(NodeIndex(2));
        stack.set_top(NodeIndex(9));
        assert_eq!(stack.current(), Some(NodeIndex(9)));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn find_ancestor_walks_toward_the_root() {
        let mut stack = NodeStack::new();
        stack.push(NodeIndex(10));
        stack.push(NodeIndex(20));
        stack.push(NodeIndex(30));
        // Nearest match wins.
        assert_eq!(
            stack.find_ancestor(|node| node.0 >= 20),
            Some(NodeIndex(30))
        );
        // Skips non-matching entries on the way up.
        assert_eq!(
            stack.find_ancestor(|node| node.0 == 10),
            Some(NodeIndex(10))
        );
        assert_eq!(stack.find_ancestor(|node| node.0 == 99), None);
    }

    #[test]
    fn navigator_is_detached_from_the_live_stack() {
        let mut stack = NodeStack::new();
        stack.push(NodeIndex(1));
        stack.push(NodeIndex(2));
        let mut nav = ParentNavigator::from_stack(&stack);
        stack.pop();
        stack.pop();

        assert_eq!(nav.current(), Some(NodeIndex(2)));
        assert_eq!(nav.parent(), Some(NodeIndex(1)));
        assert_eq!(nav.move_up(), Some(NodeIndex(1)));
        assert_eq!(nav.move_up(), None);
        assert_eq!(nav.move_down(), Some(NodeIndex(2)));
        assert_eq!(nav.move_down(), None);
    }
}
