//! Node representation: a kind tag, modifier flags, and a per-kind payload.
//!
//! Common data (kind, flags, modifier list) lives inline on every node; the
//! kind-specific child links live in [`NodeData`]. Several kinds share a
//! payload shape (for example `AwaitExpression`, `SpreadElementExpression`
//! and `ExpressionStatement` all wrap a single child), so the payload is
//! organized by shape rather than one variant per kind.

use crate::base::{NodeIndex, NodeList};
use crate::syntax_kind::SyntaxKind;
use bitflags::bitflags;
use rustc_hash::FxHashSet;

bitflags! {
    /// Declared modifier and construction flags, cached on the node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u16 {
        const EXPORT      = 1 << 0;
        /// `declare` contexts: the node has no executable body.
        const AMBIENT     = 1 << 1;
        const ASYNC       = 1 << 2;
        const LET         = 1 << 3;
        const CONST       = 1 << 4;
        const STATIC      = 1 << 5;
        const DEFAULT     = 1 << 6;
        /// Node was manufactured during lowering rather than parsed.
        const SYNTHESIZED = 1 << 7;
    }
}

/// A single AST node. Structurally immutable once constructed; the engine
/// stores its per-run caches outside the node, keyed by [`NodeIndex`].
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: SyntaxKind,
    pub flags: NodeFlags,
    /// Declared modifier tokens, visited as ordinary children.
    pub modifiers: Option<NodeList>,
    pub data: NodeData,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    /// Tokens and other leaf kinds.
    None,
    Ident(IdentifierData),
    Literal(LiteralData),
    /// Single-child kinds: await/yield/spread expressions, decorators,
    /// computed property names, parenthesized expressions, expression and
    /// throw statements, variable statements (child is the declaration
    /// list), return statements (child may be `NONE`).
    Wrapped(WrappedData),
    Binary(BinaryData),
    Call(CallData),
    TaggedTemplate(TaggedTemplateData),
    Access(AccessData),
    /// Pure element lists: array/object literals, blocks, module blocks,
    /// binding patterns, variable declaration lists, template spans.
    ListOf(ListData),
    /// Functions, arrows, methods, constructors, accessors, and the
    /// signature kinds (which carry no body).
    FunctionLike(FunctionLikeData),
    Parameter(ParameterData),
    ClassLike(ClassLikeData),
    HeritageClause(HeritageClauseData),
    /// `ExpressionWithTypeArguments` and `TypeReference`.
    WithTypeArguments(WithTypeArgumentsData),
    /// Name/type/initializer triples: variable declarations, property
    /// declarations and signatures, property assignments, binding elements,
    /// enum members, type parameters.
    Declaration(DeclarationData),
    /// Namespace/module declarations and import-equals (body is the
    /// module reference).
    ModuleLike(ModuleLikeData),
    Enum(EnumData),
    ImportExport(ImportExportData),
    ExportAssignment(ExportAssignmentData),
    If(IfData),
    /// `for`, `for..in`, `for..of` heads plus body.
    ForLike(ForLikeData),
    SourceFile(SourceFileData),
    /// Fallback for kinds with no dedicated shape (conditional expressions,
    /// qualified names, try statements, remaining type nodes): an ordered
    /// child list.
    Children(ListData),
}

#[derive(Debug, Clone)]
pub struct IdentifierData {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LiteralData {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct WrappedData {
    pub expression: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct BinaryData {
    pub left: NodeIndex,
    pub operator_token: SyntaxKind,
    pub right: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct CallData {
    pub expression: NodeIndex,
    pub type_arguments: Option<NodeList>,
    pub arguments: NodeList,
}

#[derive(Debug, Clone)]
pub struct TaggedTemplateData {
    pub tag: NodeIndex,
    pub template: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct AccessData {
    pub expression: NodeIndex,
    /// Property name identifier, or the argument expression for element
    /// access.
    pub name: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct ListData {
    pub elements: NodeList,
}

#[derive(Debug, Clone)]
pub struct FunctionLikeData {
    pub name: NodeIndex,
    pub parameters: NodeList,
    pub type_annotation: NodeIndex,
    /// `NONE` for overload signatures and ambient/abstract members.
    pub body: NodeIndex,
    pub asterisk_token: bool,
}

#[derive(Debug, Clone)]
pub struct ParameterData {
    pub name: NodeIndex,
    pub dot_dot_dot_token: bool,
    pub question_token: bool,
    pub type_annotation: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct ClassLikeData {
    pub name: NodeIndex,
    pub heritage_clauses: NodeList,
    pub members: NodeList,
}

#[derive(Debug, Clone)]
pub struct HeritageClauseData {
    /// `ExtendsKeyword` or `ImplementsKeyword`.
    pub token: SyntaxKind,
    pub types: NodeList,
}

#[derive(Debug, Clone)]
pub struct WithTypeArgumentsData {
    pub expression: NodeIndex,
    pub type_arguments: Option<NodeList>,
}

#[derive(Debug, Clone)]
pub struct DeclarationData {
    pub name: NodeIndex,
    pub type_annotation: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct ModuleLikeData {
    pub name: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct EnumData {
    pub name: NodeIndex,
    pub members: NodeList,
}

#[derive(Debug, Clone)]
pub struct ImportExportData {
    /// String literal naming the external module, or `NONE`.
    pub module_specifier: NodeIndex,
    /// Import clause / named exports, or `NONE`.
    pub clause: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct ExportAssignmentData {
    pub expression: NodeIndex,
    pub is_export_equals: bool,
}

#[derive(Debug, Clone)]
pub struct IfData {
    pub expression: NodeIndex,
    pub then_statement: NodeIndex,
    pub else_statement: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct ForLikeData {
    pub initializer: NodeIndex,
    pub condition: NodeIndex,
    pub incrementor: NodeIndex,
    pub expression: NodeIndex,
    pub statement: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct SourceFileData {
    pub file_name: String,
    pub statements: NodeList,
    /// Identifier texts physically present in this unit; consulted by the
    /// name generator for collision avoidance.
    pub identifiers: FxHashSet<String>,
}

impl Node {
    pub fn new(kind: SyntaxKind, data: NodeData) -> Node {
        Node {
            kind,
            flags: NodeFlags::empty(),
            modifiers: None,
            data,
        }
    }

    pub fn with_flags(kind: SyntaxKind, flags: NodeFlags, data: NodeData) -> Node {
        Node {
            kind,
            flags,
            modifiers: None,
            data,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.flags.contains(NodeFlags::SYNTHESIZED)
    }

    pub fn identifier_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Ident(ident) => Some(&ident.text),
            _ => None,
        }
    }

    pub fn literal_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Literal(lit) => Some(&lit.text),
            _ => None,
        }
    }

    pub fn as_function_like(&self) -> Option<&FunctionLikeData> {
        match &self.data {
            NodeData::FunctionLike(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_source_file(&self) -> Option<&SourceFileData> {
        match &self.data {
            NodeData::SourceFile(sf) => Some(sf),
            _ => None,
        }
    }

    /// Name child for declaration-shaped nodes, `NONE` when anonymous.
    pub fn declaration_name(&self) -> NodeIndex {
        match &self.data {
            NodeData::FunctionLike(func) => func.name,
            NodeData::ClassLike(class) => class.name,
            NodeData::Declaration(decl) => decl.name,
            NodeData::ModuleLike(module) => module.name,
            NodeData::Enum(enum_decl) => enum_decl.name,
            NodeData::Parameter(param) => param.name,
            _ => NodeIndex::NONE,
        }
    }

    /// Invoke `f` for every present child, modifiers first, then payload
    /// children in source order.
    pub fn for_each_child(&self, mut f: impl FnMut(NodeIndex)) {
        let mut one = |idx: NodeIndex| {
            if idx.is_some() {
                f(idx);
            }
        };

        if let Some(modifiers) = &self.modifiers {
            for modifier in modifiers {
                one(modifier);
            }
        }

        match &self.data {
            NodeData::None | NodeData::Ident(_) | NodeData::Literal(_) => {}
            NodeData::Wrapped(node) => one(node.expression),
            NodeData::Binary(node) => {
                one(node.left);
                one(node.right);
            }
            NodeData::Call(node) => {
                one(node.expression);
                if let Some(type_arguments) = &node.type_arguments {
                    for arg in type_arguments {
                        one(arg);
                    }
                }
                for arg in &node.arguments {
                    one(arg);
                }
            }
            NodeData::TaggedTemplate(node) => {
                one(node.tag);
                one(node.template);
            }
            NodeData::Access(node) => {
                one(node.expression);
                one(node.name);
            }
            NodeData::ListOf(node) | NodeData::Children(node) => {
                for element in &node.elements {
                    one(element);
                }
            }
            NodeData::FunctionLike(node) => {
                one(node.name);
                for parameter in &node.parameters {
                    one(parameter);
                }
                one(node.type_annotation);
                one(node.body);
            }
            NodeData::Parameter(node) => {
                one(node.name);
                one(node.type_annotation);
                one(node.initializer);
            }
            NodeData::ClassLike(node) => {
                one(node.name);
                for clause in &node.heritage_clauses {
                    one(clause);
                }
                for member in &node.members {
                    one(member);
                }
            }
            NodeData::HeritageClause(node) => {
                for ty in &node.types {
                    one(ty);
                }
            }
            NodeData::WithTypeArguments(node) => {
                one(node.expression);
                if let Some(type_arguments) = &node.type_arguments {
                    for arg in type_arguments {
                        one(arg);
                    }
                }
            }
            NodeData::Declaration(node) => {
                one(node.name);
                one(node.type_annotation);
                one(node.initializer);
            }
            NodeData::ModuleLike(node) => {
                one(node.name);
                one(node.body);
            }
            NodeData::Enum(node) => {
                one(node.name);
                for member in &node.members {
                    one(member);
                }
            }
            NodeData::ImportExport(node) => {
                one(node.clause);
                one(node.module_specifier);
            }
            NodeData::ExportAssignment(node) => one(node.expression),
            NodeData::If(node) => {
                one(node.expression);
                one(node.then_statement);
                one(node.else_statement);
            }
            NodeData::ForLike(node) => {
                one(node.initializer);
                one(node.condition);
                one(node.incrementor);
                one(node.expression);
                one(node.statement);
            }
            NodeData::SourceFile(node) => {
                for statement in &node.statements {
                    one(statement);
                }
            }
        }
    }

    /// Collect present children in visit order.
    pub fn children(&self) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        self.for_each_child(|child| children.push(child));
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_each_child_visits_modifiers_first() {
        let mut node = Node::new(
            SyntaxKind::VariableStatement,
            NodeData::Wrapped(WrappedData {
                expression: NodeIndex(7),
            }),
        );
        node.modifiers = Some(NodeList::new(vec![NodeIndex(3)]));

        assert_eq!(node.children(), vec![NodeIndex(3), NodeIndex(7)]);
    }

    #[test]
    fn for_each_child_skips_absent_links() {
        let node = Node::new(
            SyntaxKind::ReturnStatement,
            NodeData::Wrapped(WrappedData {
                expression: NodeIndex::NONE,
            }),
        );
        assert!(node.children().is_empty());
    }

    #[test]
    fn function_like_child_order_is_source_order() {
        let node = Node::new(
            SyntaxKind::FunctionDeclaration,
            NodeData::FunctionLike(FunctionLikeData {
                name: NodeIndex(1),
                parameters: NodeList::new(vec![NodeIndex(2), NodeIndex(3)]),
                type_annotation: NodeIndex::NONE,
                body: NodeIndex(4),
                asterisk_token: false,
            }),
        );
        assert_eq!(
            node.children(),
            vec![NodeIndex(1), NodeIndex(2), NodeIndex(3), NodeIndex(4)]
        );
    }
}
