//! Transform flag classification and aggregation.
//!
//! Every node is classified exactly once per run with a [`TransformFlags`]
//! bitset describing which downlevel features the node or its subtree uses.
//! Flags come in pairs: a node-local bit (`TYPESCRIPT`, `ES2015`, ...) that
//! describes the node itself, and a containment bit (`CONTAINS_*`) that
//! propagates up the tree. When a child's flags are folded into its parent's
//! subtree aggregate, the node-local bits are stripped ([`NODE_EXCLUDES`]),
//! so only containment facts travel upward.
//!
//! Scope-defining kinds additionally declare an exclude mask: containment
//! bits fully handled at that boundary (for example, a rest parameter is
//! rewritten when its own function is lowered), subtracted from the cached
//! value before it propagates to the boundary's parent.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use tsdl_ast::{NodeArena, NodeData, NodeFlags, NodeIndex, SyntaxKind};

bitflags! {
    /// Per-node feature bitset driving whether lowering is needed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransformFlags: u32 {
        const TYPESCRIPT                       = 1 << 0;
        const CONTAINS_TYPESCRIPT              = 1 << 1;
        const ES2015                           = 1 << 2;
        const CONTAINS_ES2015                  = 1 << 3;
        const GENERATOR                        = 1 << 4;
        const CONTAINS_GENERATOR               = 1 << 5;
        const LEXICAL_THIS                     = 1 << 6;
        const CONTAINS_LEXICAL_THIS            = 1 << 7;
        const CAPTURES_LEXICAL_THIS            = 1 << 8;
        const CONTAINS_CAPTURED_LEXICAL_THIS   = 1 << 9;
        const COMPLETION_STATEMENT             = 1 << 10;
        const CONTAINS_COMPLETION_STATEMENT    = 1 << 11;
        const HOISTED_DECLARATION              = 1 << 12;
        const CONTAINS_HOISTED_DECLARATION     = 1 << 13;
        const LET_OR_CONST                     = 1 << 14;
        const CONTAINS_LET_OR_CONST            = 1 << 15;
        const PARAMETER_INITIALIZER            = 1 << 16;
        const CONTAINS_PARAMETER_INITIALIZER   = 1 << 17;
        const REST_PARAMETER                   = 1 << 18;
        const CONTAINS_REST_PARAMETER          = 1 << 19;
        const SPREAD_ELEMENT                   = 1 << 20;
        const CONTAINS_SPREAD_ELEMENT          = 1 << 21;
        const BINDING_PATTERN                  = 1 << 22;
        const CONTAINS_BINDING_PATTERN         = 1 << 23;
        const DECORATOR                        = 1 << 24;
        const CONTAINS_DECORATOR               = 1 << 25;
        const TYPESCRIPT_CLASS_SYNTAX          = 1 << 26;
        const CONTAINS_TYPESCRIPT_CLASS_SYNTAX = 1 << 27;
        const TYPESCRIPT_MODIFIER              = 1 << 28;
        const CONTAINS_TYPESCRIPT_MODIFIER     = 1 << 29;

        // Node-local + containment pairs, OR-ed into classifier results.
        const THIS_NODE_IS_TYPESCRIPT = Self::TYPESCRIPT.bits() | Self::CONTAINS_TYPESCRIPT.bits();
        const THIS_NODE_IS_TYPESCRIPT_MODIFIER = Self::THIS_NODE_IS_TYPESCRIPT.bits()
            | Self::TYPESCRIPT_MODIFIER.bits()
            | Self::CONTAINS_TYPESCRIPT_MODIFIER.bits();
        const THIS_NODE_IS_ES2015 = Self::ES2015.bits() | Self::CONTAINS_ES2015.bits();
        const THIS_NODE_IS_ES2015_YIELD = Self::THIS_NODE_IS_ES2015.bits()
            | Self::GENERATOR.bits()
            | Self::CONTAINS_GENERATOR.bits();
        const THIS_NODE_IS_THIS_KEYWORD =
            Self::LEXICAL_THIS.bits() | Self::CONTAINS_LEXICAL_THIS.bits();
        const THIS_NODE_CAPTURES_LEXICAL_THIS =
            Self::CAPTURES_LEXICAL_THIS.bits() | Self::CONTAINS_CAPTURED_LEXICAL_THIS.bits();
        const THIS_NODE_IS_COMPLETION_STATEMENT =
            Self::COMPLETION_STATEMENT.bits() | Self::CONTAINS_COMPLETION_STATEMENT.bits();
        const THIS_NODE_IS_HOISTED_DECLARATION =
            Self::HOISTED_DECLARATION.bits() | Self::CONTAINS_HOISTED_DECLARATION.bits();
        const THIS_NODE_IS_ES2015_LET_OR_CONST = Self::THIS_NODE_IS_ES2015.bits()
            | Self::LET_OR_CONST.bits()
            | Self::CONTAINS_LET_OR_CONST.bits();
        const THIS_NODE_IS_ES2015_PARAMETER_INITIALIZER = Self::THIS_NODE_IS_ES2015.bits()
            | Self::PARAMETER_INITIALIZER.bits()
            | Self::CONTAINS_PARAMETER_INITIALIZER.bits();
        const THIS_NODE_IS_ES2015_REST_PARAMETER = Self::THIS_NODE_IS_ES2015.bits()
            | Self::REST_PARAMETER.bits()
            | Self::CONTAINS_REST_PARAMETER.bits();
        const THIS_NODE_IS_ES2015_SPREAD_ELEMENT = Self::THIS_NODE_IS_ES2015.bits()
            | Self::SPREAD_ELEMENT.bits()
            | Self::CONTAINS_SPREAD_ELEMENT.bits();
        const THIS_NODE_IS_ES2015_BINDING_PATTERN = Self::THIS_NODE_IS_ES2015.bits()
            | Self::BINDING_PATTERN.bits()
            | Self::CONTAINS_BINDING_PATTERN.bits();
        const THIS_NODE_IS_TYPESCRIPT_DECORATOR = Self::THIS_NODE_IS_TYPESCRIPT.bits()
            | Self::DECORATOR.bits()
            | Self::CONTAINS_DECORATOR.bits();
        const THIS_NODE_IS_TYPESCRIPT_CLASS_SYNTAX = Self::THIS_NODE_IS_TYPESCRIPT.bits()
            | Self::TYPESCRIPT_CLASS_SYNTAX.bits()
            | Self::CONTAINS_TYPESCRIPT_CLASS_SYNTAX.bits();

        /// Node-local bits; stripped when a child's flags fold into the
        /// parent's subtree aggregate.
        const NODE_EXCLUDES = Self::TYPESCRIPT.bits()
            | Self::ES2015.bits()
            | Self::GENERATOR.bits()
            | Self::LEXICAL_THIS.bits()
            | Self::CAPTURES_LEXICAL_THIS.bits()
            | Self::COMPLETION_STATEMENT.bits()
            | Self::HOISTED_DECLARATION.bits()
            | Self::LET_OR_CONST.bits()
            | Self::PARAMETER_INITIALIZER.bits()
            | Self::REST_PARAMETER.bits()
            | Self::SPREAD_ELEMENT.bits()
            | Self::BINDING_PATTERN.bits()
            | Self::DECORATOR.bits()
            | Self::TYPESCRIPT_CLASS_SYNTAX.bits()
            | Self::TYPESCRIPT_MODIFIER.bits();

        /// ES2015 parameter features or a captured `this` somewhere in the
        /// subtree; forces the enclosing function into ES2015 lowering.
        const CONTAINS_ES2015_PARAMETER_OR_CAPTURED_THIS =
            Self::CONTAINS_PARAMETER_INITIALIZER.bits()
                | Self::CONTAINS_REST_PARAMETER.bits()
                | Self::CONTAINS_CAPTURED_LEXICAL_THIS.bits();

        const ALL_CONTAINS = Self::CONTAINS_TYPESCRIPT.bits()
            | Self::CONTAINS_ES2015.bits()
            | Self::CONTAINS_GENERATOR.bits()
            | Self::CONTAINS_LEXICAL_THIS.bits()
            | Self::CONTAINS_CAPTURED_LEXICAL_THIS.bits()
            | Self::CONTAINS_COMPLETION_STATEMENT.bits()
            | Self::CONTAINS_HOISTED_DECLARATION.bits()
            | Self::CONTAINS_LET_OR_CONST.bits()
            | Self::CONTAINS_PARAMETER_INITIALIZER.bits()
            | Self::CONTAINS_REST_PARAMETER.bits()
            | Self::CONTAINS_SPREAD_ELEMENT.bits()
            | Self::CONTAINS_BINDING_PATTERN.bits()
            | Self::CONTAINS_DECORATOR.bits()
            | Self::CONTAINS_TYPESCRIPT_CLASS_SYNTAX.bits()
            | Self::CONTAINS_TYPESCRIPT_MODIFIER.bits();

        // Scope exclude masks. Applied as `flags & !mask` when a cached
        // value crosses the boundary toward its parent.

        /// Everything under a type node is erased wholesale; only the fact
        /// that the subtree is TypeScript syntax escapes.
        const TYPE_EXCLUDES = Self::ALL_CONTAINS.bits() & !Self::CONTAINS_TYPESCRIPT.bits();
        const PARAMETER_SCOPE_EXCLUDES = Self::CONTAINS_TYPESCRIPT_MODIFIER.bits()
            | Self::CONTAINS_BINDING_PATTERN.bits();
        const FUNCTION_SCOPE_EXCLUDES = Self::CONTAINS_LEXICAL_THIS.bits()
            | Self::CONTAINS_CAPTURED_LEXICAL_THIS.bits()
            | Self::CONTAINS_PARAMETER_INITIALIZER.bits()
            | Self::CONTAINS_REST_PARAMETER.bits()
            | Self::CONTAINS_LET_OR_CONST.bits()
            | Self::CONTAINS_COMPLETION_STATEMENT.bits()
            | Self::CONTAINS_HOISTED_DECLARATION.bits()
            | Self::CONTAINS_GENERATOR.bits()
            | Self::CONTAINS_BINDING_PATTERN.bits();
        /// Arrows do not establish `this`: a capture inside must still reach
        /// the enclosing function, so that bit passes through.
        const ARROW_FUNCTION_SCOPE_EXCLUDES = Self::FUNCTION_SCOPE_EXCLUDES.bits()
            & !Self::CONTAINS_CAPTURED_LEXICAL_THIS.bits();
        /// Module bodies lower into a function scope.
        const MODULE_SCOPE_EXCLUDES = Self::FUNCTION_SCOPE_EXCLUDES.bits();
        const CLASS_SCOPE_EXCLUDES = Self::CONTAINS_TYPESCRIPT_CLASS_SYNTAX.bits()
            | Self::CONTAINS_DECORATOR.bits()
            | Self::CONTAINS_TYPESCRIPT_MODIFIER.bits();
        /// Spread elements are rewritten where the call/literal is lowered.
        const CALL_OR_ARRAY_LITERAL_EXCLUDES = Self::CONTAINS_SPREAD_ELEMENT.bits();
    }
}

/// Write-once cache of classified flags, keyed by stable node id.
///
/// A node's flags are computed at most once per run; a second write for the
/// same node is a programming defect in the driving engine and panics.
#[derive(Debug, Default)]
pub struct FlagCache {
    entries: FxHashMap<NodeIndex, (TransformFlags, TransformFlags)>,
}

impl FlagCache {
    pub fn new() -> FlagCache {
        FlagCache::default()
    }

    /// Cached (flags, exclude mask) for a node, if classified.
    pub fn get(&self, node: NodeIndex) -> Option<(TransformFlags, TransformFlags)> {
        self.entries.get(&node).copied()
    }

    pub fn is_cached(&self, node: NodeIndex) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn insert(&mut self, node: NodeIndex, flags: TransformFlags, excludes: TransformFlags) {
        let previous = self.entries.insert(node, (flags, excludes));
        if previous.is_some() {
            panic!("transform flags already computed for node {}", node.0);
        }
    }
}

/// Computes the transform flags for a node, given the already-aggregated
/// (and node-excludes-stripped) flags of its subtree. Pure: the caller caches
/// the result. Returns the flags plus the node's scope exclude mask.
pub fn compute_transform_flags(
    arena: &NodeArena,
    index: NodeIndex,
    subtree_flags: TransformFlags,
) -> (TransformFlags, TransformFlags) {
    debug_assert!(
        (subtree_flags & TransformFlags::NODE_EXCLUDES).is_empty(),
        "subtree aggregate includes a node-local flag"
    );

    let Some(node) = arena.get(index) else {
        return (subtree_flags, TransformFlags::empty());
    };

    let none = TransformFlags::empty();
    match node.kind {
        SyntaxKind::PublicKeyword
        | SyntaxKind::PrivateKeyword
        | SyntaxKind::ProtectedKeyword
        | SyntaxKind::AbstractKeyword
        | SyntaxKind::DeclareKeyword
        | SyntaxKind::AsyncKeyword
        | SyntaxKind::ConstKeyword => (TransformFlags::THIS_NODE_IS_TYPESCRIPT_MODIFIER, none),

        SyntaxKind::AwaitExpression
        | SyntaxKind::EnumDeclaration
        | SyntaxKind::ImportEqualsDeclaration => {
            (subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT, none)
        }

        SyntaxKind::ImportDeclaration
        | SyntaxKind::ExportDeclaration
        | SyntaxKind::ComputedPropertyName
        | SyntaxKind::TemplateExpression
        | SyntaxKind::NoSubstitutionTemplateLiteral
        | SyntaxKind::TaggedTemplateExpression
        | SyntaxKind::ShorthandPropertyAssignment
        | SyntaxKind::ForOfStatement => {
            (subtree_flags | TransformFlags::THIS_NODE_IS_ES2015, none)
        }

        SyntaxKind::YieldExpression => {
            (subtree_flags | TransformFlags::THIS_NODE_IS_ES2015_YIELD, none)
        }

        SyntaxKind::ThisKeyword => (TransformFlags::THIS_NODE_IS_THIS_KEYWORD, none),

        SyntaxKind::SpreadElementExpression => (
            subtree_flags | TransformFlags::THIS_NODE_IS_ES2015_SPREAD_ELEMENT,
            none,
        ),

        SyntaxKind::BreakStatement | SyntaxKind::ContinueStatement | SyntaxKind::ReturnStatement => (
            subtree_flags | TransformFlags::THIS_NODE_IS_COMPLETION_STATEMENT,
            none,
        ),

        SyntaxKind::ObjectBindingPattern | SyntaxKind::ArrayBindingPattern => (
            subtree_flags | TransformFlags::THIS_NODE_IS_ES2015_BINDING_PATTERN,
            none,
        ),

        SyntaxKind::Decorator => (
            subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT_DECORATOR,
            none,
        ),

        SyntaxKind::ModuleDeclaration => (
            subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT,
            TransformFlags::MODULE_SCOPE_EXCLUDES,
        ),

        SyntaxKind::ArrayLiteralExpression | SyntaxKind::CallExpression => (
            subtree_flags,
            TransformFlags::CALL_OR_ARRAY_LITERAL_EXCLUDES,
        ),

        SyntaxKind::PropertyDeclaration => (
            subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT_CLASS_SYNTAX,
            none,
        ),

        SyntaxKind::BinaryExpression => {
            if arena.is_destructuring_assignment(index) {
                (subtree_flags | TransformFlags::THIS_NODE_IS_ES2015, none)
            } else {
                (subtree_flags, none)
            }
        }

        SyntaxKind::AnyKeyword
        | SyntaxKind::NumberKeyword
        | SyntaxKind::StringKeyword
        | SyntaxKind::BooleanKeyword
        | SyntaxKind::SymbolKeyword
        | SyntaxKind::VoidKeyword
        | SyntaxKind::TypeParameter
        | SyntaxKind::CallSignature
        | SyntaxKind::ConstructSignature
        | SyntaxKind::IndexSignature
        | SyntaxKind::MethodSignature
        | SyntaxKind::PropertySignature => (
            subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT,
            TransformFlags::TYPE_EXCLUDES,
        ),

        SyntaxKind::Parameter => {
            let mut flags = TransformFlags::empty();
            let param = match &node.data {
                NodeData::Parameter(param) => param,
                _ => return (subtree_flags, none),
            };
            if param.question_token {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            if subtree_flags.intersects(TransformFlags::CONTAINS_TYPESCRIPT_MODIFIER) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT_CLASS_SYNTAX;
            }
            if param.initializer.is_some() {
                flags |= TransformFlags::THIS_NODE_IS_ES2015_PARAMETER_INITIALIZER;
            }
            if param.dot_dot_dot_token {
                flags |= TransformFlags::THIS_NODE_IS_ES2015_REST_PARAMETER;
            }
            (
                subtree_flags | flags,
                TransformFlags::PARAMETER_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::ArrowFunction => {
            let mut flags = TransformFlags::THIS_NODE_IS_ES2015;
            if subtree_flags.intersects(TransformFlags::CONTAINS_LEXICAL_THIS) {
                flags |= TransformFlags::THIS_NODE_CAPTURES_LEXICAL_THIS;
            }
            if node.flags.contains(NodeFlags::ASYNC) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            (
                subtree_flags | flags,
                TransformFlags::ARROW_FUNCTION_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::FunctionExpression => {
            let mut flags = TransformFlags::empty();
            let is_generator = node
                .as_function_like()
                .is_some_and(|func| func.asterisk_token);
            if is_generator
                || subtree_flags
                    .intersects(TransformFlags::CONTAINS_ES2015_PARAMETER_OR_CAPTURED_THIS)
            {
                flags |= TransformFlags::THIS_NODE_IS_ES2015;
            }
            if node.flags.contains(NodeFlags::ASYNC) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            (
                subtree_flags | flags,
                TransformFlags::FUNCTION_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::FunctionDeclaration => {
            let Some(func) = node.as_function_like() else {
                return (subtree_flags, none);
            };
            if func.body.is_none() {
                // Overload signature: TypeScript-only, children not live.
                return (TransformFlags::THIS_NODE_IS_TYPESCRIPT, none);
            }

            let mut flags = TransformFlags::THIS_NODE_IS_HOISTED_DECLARATION;
            if node.flags.contains(NodeFlags::ASYNC) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            if func.asterisk_token
                || node.flags.contains(NodeFlags::EXPORT)
                || subtree_flags
                    .intersects(TransformFlags::CONTAINS_ES2015_PARAMETER_OR_CAPTURED_THIS)
            {
                flags |= TransformFlags::THIS_NODE_IS_ES2015;
            }
            (
                subtree_flags | flags,
                TransformFlags::FUNCTION_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::VariableDeclarationList => {
            let mut flags = TransformFlags::THIS_NODE_IS_HOISTED_DECLARATION;
            if node.flags.intersects(NodeFlags::LET | NodeFlags::CONST) {
                flags |= TransformFlags::THIS_NODE_IS_ES2015_LET_OR_CONST;
            }
            (subtree_flags | flags, none)
        }

        SyntaxKind::VariableStatement => {
            if node.flags.contains(NodeFlags::EXPORT) {
                (subtree_flags | TransformFlags::THIS_NODE_IS_ES2015, none)
            } else {
                (subtree_flags, none)
            }
        }

        SyntaxKind::ClassDeclaration | SyntaxKind::ClassExpression => {
            let mut flags = TransformFlags::THIS_NODE_IS_ES2015;
            if subtree_flags.intersects(TransformFlags::CONTAINS_TYPESCRIPT_CLASS_SYNTAX) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            (subtree_flags | flags, TransformFlags::CLASS_SCOPE_EXCLUDES)
        }

        SyntaxKind::HeritageClause => {
            let is_extends = matches!(
                &node.data,
                NodeData::HeritageClause(clause) if clause.token == SyntaxKind::ExtendsKeyword
            );
            if is_extends {
                (subtree_flags, none)
            } else {
                (
                    subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT_CLASS_SYNTAX,
                    none,
                )
            }
        }

        SyntaxKind::ExpressionWithTypeArguments => {
            let has_type_arguments = matches!(
                &node.data,
                NodeData::WithTypeArguments(with) if with.type_arguments.is_some()
            );
            if has_type_arguments {
                (subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT, none)
            } else {
                (subtree_flags, none)
            }
        }

        SyntaxKind::Constructor => {
            let has_body = node.as_function_like().is_some_and(|func| func.body.is_some());
            if !has_body {
                return (TransformFlags::THIS_NODE_IS_TYPESCRIPT, none);
            }
            // Parameter properties make the constructor TypeScript syntax.
            let mut flags = TransformFlags::empty();
            if subtree_flags.intersects(TransformFlags::CONTAINS_TYPESCRIPT_CLASS_SYNTAX) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            (
                subtree_flags | flags,
                TransformFlags::FUNCTION_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::MethodDeclaration => {
            let Some(func) = node.as_function_like() else {
                return (subtree_flags, none);
            };
            if func.body.is_none() {
                return (TransformFlags::THIS_NODE_IS_TYPESCRIPT, none);
            }

            let mut flags = TransformFlags::THIS_NODE_IS_ES2015;
            if node.flags.contains(NodeFlags::ASYNC) {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT;
            }
            if subtree_flags.intersects(TransformFlags::CONTAINS_DECORATOR)
                && arena.kind(func.name) == Some(SyntaxKind::ComputedPropertyName)
            {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT_CLASS_SYNTAX;
            }
            (
                subtree_flags | flags,
                TransformFlags::FUNCTION_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::GetAccessor | SyntaxKind::SetAccessor => {
            let mut flags = TransformFlags::empty();
            let name = node
                .as_function_like()
                .map_or(NodeIndex::NONE, |func| func.name);
            if subtree_flags.intersects(TransformFlags::CONTAINS_DECORATOR)
                && arena.kind(name) == Some(SyntaxKind::ComputedPropertyName)
            {
                flags |= TransformFlags::THIS_NODE_IS_TYPESCRIPT_CLASS_SYNTAX;
            }
            (
                subtree_flags | flags,
                TransformFlags::FUNCTION_SCOPE_EXCLUDES,
            )
        }

        SyntaxKind::ExportAssignment => {
            let is_export_equals = matches!(
                &node.data,
                NodeData::ExportAssignment(assignment) if assignment.is_export_equals
            );
            if is_export_equals {
                (subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT, none)
            } else {
                (subtree_flags | TransformFlags::THIS_NODE_IS_ES2015, none)
            }
        }

        kind if kind.is_type_node() => (
            subtree_flags | TransformFlags::THIS_NODE_IS_TYPESCRIPT,
            TransformFlags::TYPE_EXCLUDES,
        ),

        _ => (subtree_flags, none),
    }
}

/// Post-order flag aggregation over a subtree.
///
/// Returns the node's cached flags masked by its own exclude mask — the
/// value a parent folds into its subtree aggregate. Already-classified
/// nodes short-circuit; ambient nodes cache a single TypeScript flag without
/// descending (their content is erased wholesale, so finer-grained
/// computation is pointless).
pub fn aggregate_transform_flags(
    arena: &NodeArena,
    cache: &mut FlagCache,
    node: NodeIndex,
) -> TransformFlags {
    if node.is_none() {
        return TransformFlags::empty();
    }
    if let Some((flags, excludes)) = cache.get(node) {
        return flags & !excludes;
    }

    let Some(current) = arena.get(node) else {
        return TransformFlags::empty();
    };

    if current.flags.contains(NodeFlags::AMBIENT) {
        let flags = TransformFlags::THIS_NODE_IS_TYPESCRIPT;
        cache.insert(node, flags, TransformFlags::empty());
        return flags;
    }

    let children = current.children();
    let mut subtree = TransformFlags::empty();
    for child in children {
        subtree |= aggregate_transform_flags(arena, cache, child);
    }
    subtree &= !TransformFlags::NODE_EXCLUDES;

    let (flags, excludes) = compute_transform_flags(arena, node, subtree);
    cache.insert(node, flags, excludes);
    flags & !excludes
}
