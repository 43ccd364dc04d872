//! The transformation run: per-run state, the rule facade, and the chain
//! entry point.
//!
//! A [`Transformer`] exists for the duration of one run over a source file.
//! It owns the run's caches (classified flags, the ancestor stack, the
//! active lexical environment) and borrows the arena and the caller's
//! [`NameGenerator`] mutably, so a run cannot be entered twice and all
//! run-scoped state is torn down when the entry point returns.

use tsdl_ast::{NodeArena, NodeFlags, NodeIndex, NodeList, SyntaxKind};
use tsdl_common::CompilerOptions;

use rustc_hash::FxHashSet;

use crate::flags::{FlagCache, TransformFlags, aggregate_transform_flags};
use crate::lexical_environment::LexicalEnvironment;
use crate::name_generator::{NameGenerator, TempFlags};
use crate::node_stack::{NodeStack, ParentNavigator};

/// Name facts the engine needs from whichever binder/checker drives it.
pub trait EmitResolver {
    /// Is `name` bound in the global scope?
    fn has_global_name(&self, name: &str) -> bool;

    /// Does any value declaration inside `container` bind `name`?
    fn has_local_name(&self, container: NodeIndex, name: &str) -> bool;
}

/// Resolver with no name information. Every name is reported free, so
/// generated names are only checked against the file's own identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl EmitResolver for NullResolver {
    fn has_global_name(&self, _name: &str) -> bool {
        false
    }

    fn has_local_name(&self, _container: NodeIndex, _name: &str) -> bool {
        false
    }
}

/// State for one run over one source file. Handed to the chain function by
/// [`run_transformation_chain`]; lowering rules reach every engine
/// operation through it.
pub struct Transformer<'a> {
    pub(crate) arena: &'a mut NodeArena,
    options: &'a CompilerOptions,
    resolver: &'a dyn EmitResolver,
    source_file: NodeIndex,
    /// Identifier texts present in the file, snapshotted at run start.
    file_identifiers: FxHashSet<String>,
    names: &'a mut NameGenerator,
    flag_cache: FlagCache,
    pub(crate) env: LexicalEnvironment,
    pub(crate) node_stack: NodeStack,
}

impl<'a> Transformer<'a> {
    pub fn new(
        arena: &'a mut NodeArena,
        options: &'a CompilerOptions,
        resolver: &'a dyn EmitResolver,
        names: &'a mut NameGenerator,
        source_file: NodeIndex,
    ) -> Transformer<'a> {
        let file_identifiers = arena
            .get(source_file)
            .and_then(|node| node.as_source_file())
            .map(|sf| sf.identifiers.clone())
            .unwrap_or_default();
        Transformer {
            arena,
            options,
            resolver,
            source_file,
            file_identifiers,
            names,
            flag_cache: FlagCache::new(),
            env: LexicalEnvironment::new(),
            node_stack: NodeStack::new(),
        }
    }

    pub fn arena(&self) -> &NodeArena {
        self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        self.arena
    }

    pub fn compiler_options(&self) -> &CompilerOptions {
        self.options
    }

    pub fn resolver(&self) -> &dyn EmitResolver {
        self.resolver
    }

    /// The source file this run is lowering.
    pub fn root_node(&self) -> NodeIndex {
        self.source_file
    }

    pub fn current_node(&self) -> Option<NodeIndex> {
        self.node_stack.current()
    }

    pub fn parent_node(&self) -> Option<NodeIndex> {
        self.node_stack.parent()
    }

    /// Nearest enclosing node (current included) matching the predicate.
    pub fn find_ancestor_node(
        &self,
        matches: impl FnMut(NodeIndex) -> bool,
    ) -> Option<NodeIndex> {
        self.node_stack.find_ancestor(matches)
    }

    /// Detached copy of the ancestor chain at this point.
    pub fn create_parent_navigator(&self) -> ParentNavigator {
        ParentNavigator::from_stack(&self.node_stack)
    }

    /// Classified flags for a node, computing and caching the whole subtree
    /// on first request. The returned value has the node's own scope
    /// excludes already applied.
    pub fn transform_flags(&mut self, node: NodeIndex) -> TransformFlags {
        aggregate_transform_flags(self.arena, &mut self.flag_cache, node)
    }

    /// Fresh temp variable identifier for the current scope.
    pub fn create_temp_variable(&mut self, requested: TempFlags) -> NodeIndex {
        let text = self.names.make_temp_variable_name(
            &mut self.env.temp_flags,
            requested,
            self.resolver,
            &self.file_identifiers,
        );
        self.arena.create_identifier(text)
    }

    /// Unique identifier derived from `base_name`.
    pub fn create_unique_name(&mut self, base_name: &str) -> NodeIndex {
        let text = self
            .names
            .make_unique_name(base_name, self.resolver, &self.file_identifiers);
        self.arena.create_identifier(text)
    }

    /// Stable generated identifier for a declaration. Repeated requests for
    /// the same node return the same identifier node, run-wide.
    pub fn generated_name_for_node(&mut self, node: NodeIndex) -> NodeIndex {
        if let Some(ident) = self.names.cached_identifier(node) {
            return ident;
        }
        let ident = match self.arena.kind(node) {
            // Anonymous positions take whatever temp name is next.
            Some(SyntaxKind::ComputedPropertyName | SyntaxKind::Parameter) => {
                self.create_temp_variable(TempFlags::AUTO)
            }
            _ => {
                let text = self.names.name_for_node(
                    self.arena,
                    node,
                    self.resolver,
                    &self.file_identifiers,
                );
                self.arena.create_identifier(text)
            }
        };
        self.names.cache_identifier(node, ident);
        ident
    }

    /// Whether a generated name has already been manufactured for a node.
    pub fn node_has_generated_name(&self, node: NodeIndex) -> bool {
        self.names.has_generated_name(node)
    }

    /// A declaration's name: a synthesized clone of the explicit name node,
    /// or a generated name when the declaration is anonymous.
    pub fn declaration_name(&mut self, node: NodeIndex) -> NodeIndex {
        let name = self
            .arena
            .get(node)
            .map_or(NodeIndex::NONE, |n| n.declaration_name());
        if name.is_some() {
            self.arena.clone_node(name)
        } else {
            self.generated_name_for_node(node)
        }
    }

    /// Receiver expression for a class member: the class name for statics,
    /// `<class name>.prototype` otherwise.
    pub fn class_member_prefix(&mut self, class: NodeIndex, member: NodeIndex) -> NodeIndex {
        let class_name = self.declaration_name(class);
        let is_static = self
            .arena
            .get(member)
            .is_some_and(|n| n.flags.contains(NodeFlags::STATIC));
        if is_static {
            class_name
        } else {
            let prototype = self.arena.create_identifier("prototype");
            self.arena
                .create_property_access_expression(class_name, prototype)
        }
    }

    /// Hoist a local into the current scope and return the identifier to
    /// reference it with: a unique name derived from `base_name`, or the
    /// next temp name.
    pub fn declare_local(&mut self, base_name: Option<&str>) -> NodeIndex {
        let name = match base_name {
            Some(base) => self.create_unique_name(base),
            None => self.create_temp_variable(TempFlags::AUTO),
        };
        self.hoist_variable_declaration(name);
        name
    }

    /// Record a variable name to declare in the current scope.
    pub fn hoist_variable_declaration(&mut self, name: NodeIndex) {
        self.env.hoist_variable_declaration(self.arena, name);
    }

    /// Record a function declaration to relocate into the current scope's
    /// declaration block.
    pub fn hoist_function_declaration(&mut self, declaration: NodeIndex) {
        self.env.hoist_function_declaration(declaration);
    }

    /// Scope guard for the lexical-environment protocol: runs `scope` with
    /// an empty environment and returns its value together with whatever
    /// the scope hoisted, restoring the caller's environment on the way
    /// out. Callers append the hoisted statements to the scope's output.
    pub(crate) fn with_fresh_environment<T>(
        &mut self,
        scope: impl FnOnce(&mut Self) -> T,
    ) -> (T, Vec<NodeIndex>) {
        let saved = std::mem::take(&mut self.env);
        let result = scope(self);
        let hoisted = self.env.take_declarations(self.arena);
        self.env = saved;
        (result, hoisted)
    }
}

/// Entry point: run a chain of lowering stages over a source file.
///
/// The chain function receives the run's [`Transformer`] and the file's
/// top-level statements, and is invoked exactly once; whatever it returns
/// is the run's result, with any file-scope hoisted declarations appended.
/// All run state lives on the `Transformer` constructed here and is torn
/// down unconditionally on return; a second concurrent run over the same
/// arena is impossible because the arena is borrowed mutably. The caller
/// owns `names`, so generated names stay unique across runs that share it.
pub fn run_transformation_chain<R>(
    arena: &mut NodeArena,
    source_file: NodeIndex,
    options: &CompilerOptions,
    resolver: &dyn EmitResolver,
    names: &mut NameGenerator,
    chain: R,
) -> NodeList
where
    R: FnOnce(&mut Transformer<'_>, NodeList) -> NodeList,
{
    let statements = arena
        .get(source_file)
        .and_then(|node| node.as_source_file())
        .map(|sf| sf.statements.clone())
        .unwrap_or_else(NodeList::empty);

    tracing::debug!(
        script_target = ?options.target,
        statements = statements.len(),
        "transformation run start"
    );

    let mut tx = Transformer::new(arena, options, resolver, names, source_file);
    tx.node_stack.push(source_file);
    let result = chain(&mut tx, statements);
    let hoisted = tx.env.take_declarations(tx.arena);
    tx.node_stack.pop();
    drop(tx);

    let result = if hoisted.is_empty() {
        result
    } else {
        tracing::debug!(hoisted = hoisted.len(), "splicing file-scope hoists");
        let mut combined: Vec<NodeIndex> = result.iter().collect();
        combined.extend(hoisted);
        NodeList::new(combined)
    };

    tracing::debug!(statements = result.len(), "transformation run done");
    result
}
