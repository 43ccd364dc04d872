//! Node arena for AST storage, plus the synthesis factory used by lowering.

use crate::base::{NodeIndex, NodeList};
use crate::node::{
    AccessData, DeclarationData, IdentifierData, ListData, Node, NodeData, NodeFlags, WrappedData,
};
use crate::syntax_kind::SyntaxKind;

/// Arena-based storage for AST nodes. Nodes are stored contiguously and
/// referenced by index; indices are stable for the arena's lifetime,
/// including for nodes synthesized after parsing.
#[derive(Debug, Default)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node to the arena and return its index.
    pub fn add(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    /// Get a node by index.
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    pub fn kind(&self, index: NodeIndex) -> Option<SyntaxKind> {
        self.get(index).map(|node| node.kind)
    }

    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        self.get(index).and_then(|node| node.identifier_text())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True for `a = b` shapes whose target is an array or object literal
    /// pattern.
    pub fn is_destructuring_assignment(&self, index: NodeIndex) -> bool {
        let Some(node) = self.get(index) else {
            return false;
        };
        let NodeData::Binary(binary) = &node.data else {
            return false;
        };
        if binary.operator_token != SyntaxKind::EqualsToken {
            return false;
        }
        matches!(
            self.kind(binary.left),
            Some(SyntaxKind::ArrayLiteralExpression | SyntaxKind::ObjectLiteralExpression)
        )
    }
}

/// Synthesis factory: the node shapes the engine itself manufactures.
/// Every synthesized node carries [`NodeFlags::SYNTHESIZED`].
impl NodeArena {
    fn add_synthesized(&mut self, kind: SyntaxKind, data: NodeData) -> NodeIndex {
        self.add(Node::with_flags(kind, NodeFlags::SYNTHESIZED, data))
    }

    pub fn create_identifier(&mut self, text: impl Into<String>) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::Identifier,
            NodeData::Ident(IdentifierData { text: text.into() }),
        )
    }

    pub fn create_variable_declaration(&mut self, name: NodeIndex) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::VariableDeclaration,
            NodeData::Declaration(DeclarationData {
                name,
                type_annotation: NodeIndex::NONE,
                initializer: NodeIndex::NONE,
            }),
        )
    }

    pub fn create_variable_declaration_list(
        &mut self,
        declarations: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::VariableDeclarationList,
            NodeData::ListOf(ListData {
                elements: NodeList::new(declarations),
            }),
        )
    }

    pub fn create_variable_statement(&mut self, declaration_list: NodeIndex) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::VariableStatement,
            NodeData::Wrapped(WrappedData {
                expression: declaration_list,
            }),
        )
    }

    pub fn create_block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::Block,
            NodeData::ListOf(ListData {
                elements: NodeList::new(statements),
            }),
        )
    }

    pub fn create_block_from_list(&mut self, statements: NodeList) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::Block,
            NodeData::ListOf(ListData {
                elements: statements,
            }),
        )
    }

    pub fn create_module_block(&mut self, statements: NodeList) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::ModuleBlock,
            NodeData::ListOf(ListData {
                elements: statements,
            }),
        )
    }

    pub fn create_return_statement(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::ReturnStatement,
            NodeData::Wrapped(WrappedData { expression }),
        )
    }

    pub fn create_expression_statement(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::ExpressionStatement,
            NodeData::Wrapped(WrappedData { expression }),
        )
    }

    pub fn create_property_access_expression(
        &mut self,
        expression: NodeIndex,
        name: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(
            SyntaxKind::PropertyAccessExpression,
            NodeData::Access(AccessData { expression, name }),
        )
    }

    /// Clone an existing node into a fresh synthesized node.
    pub fn clone_node(&mut self, index: NodeIndex) -> NodeIndex {
        let Some(node) = self.get(index) else {
            return NodeIndex::NONE;
        };
        let mut clone = node.clone();
        clone.flags |= NodeFlags::SYNTHESIZED;
        self.add(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_stable_and_sequential() {
        let mut arena = NodeArena::new();
        let a = arena.create_identifier("a");
        let b = arena.create_identifier("b");
        assert_eq!(a, NodeIndex(0));
        assert_eq!(b, NodeIndex(1));
        assert_eq!(arena.identifier_text(a), Some("a"));
        assert_eq!(arena.identifier_text(b), Some("b"));
    }

    #[test]
    fn synthesized_nodes_are_flagged() {
        let mut arena = NodeArena::new();
        let name = arena.create_identifier("x");
        let decl = arena.create_variable_declaration(name);
        assert!(arena.get(decl).unwrap().is_synthesized());
    }

    #[test]
    fn clone_node_copies_shape() {
        let mut arena = NodeArena::new();
        let name = arena.create_identifier("value");
        let copy = arena.clone_node(name);
        assert_ne!(name, copy);
        assert_eq!(arena.identifier_text(copy), Some("value"));
        assert!(arena.get(copy).unwrap().is_synthesized());
    }

    #[test]
    fn destructuring_assignment_shape() {
        use crate::node::BinaryData;

        let mut arena = NodeArena::new();
        let target = arena.add(Node::new(
            SyntaxKind::ArrayLiteralExpression,
            NodeData::ListOf(ListData {
                elements: NodeList::empty(),
            }),
        ));
        let value = arena.create_identifier("value");
        let assignment = arena.add(Node::new(
            SyntaxKind::BinaryExpression,
            NodeData::Binary(BinaryData {
                left: target,
                operator_token: SyntaxKind::EqualsToken,
                right: value,
            }),
        ));
        assert!(arena.is_destructuring_assignment(assignment));

        let plain = arena.add(Node::new(
            SyntaxKind::BinaryExpression,
            NodeData::Binary(BinaryData {
                left: value,
                operator_token: SyntaxKind::EqualsToken,
                right: value,
            }),
        ));
        assert!(!arena.is_destructuring_assignment(plain));
    }
}
