//! Unique name generation for synthesized declarations.
//!
//! Three uniqueness sources are consulted: globals (via the resolver),
//! identifiers physically present in the current source file, and names
//! this generator has already handed out. Temp variable names additionally
//! use a per-scope counter carried by the lexical environment, so sibling
//! scopes can both use `_a` without clashing.

use rustc_hash::{FxHashMap, FxHashSet};
use tsdl_ast::{NodeArena, NodeData, NodeIndex, SyntaxKind};

use crate::transformer::EmitResolver;

/// Per-scope temp name state: a loop counter in the low bits plus bits
/// recording that the well-known `_i` / `_n` names were handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TempFlags(pub u32);

impl TempFlags {
    pub const AUTO: TempFlags = TempFlags(0);
    pub const RESERVED_I: TempFlags = TempFlags(1 << 28);
    pub const RESERVED_N: TempFlags = TempFlags(1 << 29);

    const COUNT_MASK: u32 = 0x0FFF_FFFF;

    fn count(self) -> u32 {
        self.0 & Self::COUNT_MASK
    }

    fn contains(self, other: TempFlags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

/// Run-scoped name state, owned by the caller of a transformation run so a
/// name manufactured for a node stays stable for the whole run. Only the
/// temp counter is scope-local; everything here persists across lexical
/// environments and chain stages.
#[derive(Debug, Default)]
pub struct NameGenerator {
    /// Names already handed out during this run.
    generated_names: FxHashSet<String>,
    /// Stable name per node: asking twice for the same declaration yields
    /// the same string.
    node_to_generated_name: FxHashMap<NodeIndex, String>,
    /// Identifier node per named declaration, so repeated requests hand
    /// back the same node.
    node_to_generated_identifier: FxHashMap<NodeIndex, NodeIndex>,
}

impl NameGenerator {
    pub fn new() -> NameGenerator {
        NameGenerator::default()
    }

    /// Whether a name has already been manufactured for this node.
    pub fn has_generated_name(&self, node: NodeIndex) -> bool {
        self.node_to_generated_name.contains_key(&node)
            || self.node_to_generated_identifier.contains_key(&node)
    }

    pub(crate) fn cached_identifier(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.node_to_generated_identifier.get(&node).copied()
    }

    pub(crate) fn cache_identifier(&mut self, node: NodeIndex, identifier: NodeIndex) {
        self.node_to_generated_identifier.insert(node, identifier);
    }

    fn is_unique_name(
        &self,
        name: &str,
        resolver: &dyn EmitResolver,
        file_identifiers: &FxHashSet<String>,
    ) -> bool {
        !resolver.has_global_name(name)
            && !file_identifiers.contains(name)
            && !self.generated_names.contains(name)
    }

    /// Next temp variable name for the scope owning `temp_flags`.
    ///
    /// A reserved request (`RESERVED_I` / `RESERVED_N`) yields the friendly
    /// name once per scope if it is still free; otherwise the automatic
    /// sequence runs `_a` through `_z` (skipping the letters reserved names
    /// would produce) and then `_0`, `_1`, ...
    pub fn make_temp_variable_name(
        &mut self,
        temp_flags: &mut TempFlags,
        requested: TempFlags,
        resolver: &dyn EmitResolver,
        file_identifiers: &FxHashSet<String>,
    ) -> String {
        if requested != TempFlags::AUTO && !temp_flags.contains(requested) {
            let name = if requested == TempFlags::RESERVED_I {
                "_i"
            } else {
                "_n"
            };
            if self.is_unique_name(name, resolver, file_identifiers) {
                temp_flags.0 |= requested.0;
                return name.to_string();
            }
        }

        loop {
            let count = temp_flags.count();
            temp_flags.0 += 1;
            // 8 and 13 would produce "_i" and "_n"; those are only handed
            // out through a reserved request.
            if count == 8 || count == 13 {
                continue;
            }
            let name = if count < 26 {
                format!("_{}", (b'a' + count as u8) as char)
            } else {
                format!("_{}", count - 26)
            };
            if self.is_unique_name(&name, resolver, file_identifiers) {
                return name;
            }
        }
    }

    /// Derive a unique name from `base_name` by appending an underscore (if
    /// not already present) and the first free ordinal.
    pub fn make_unique_name(
        &mut self,
        base_name: &str,
        resolver: &dyn EmitResolver,
        file_identifiers: &FxHashSet<String>,
    ) -> String {
        let mut base = base_name.to_string();
        if !base.ends_with('_') {
            base.push('_');
        }
        let mut ordinal = 1u32;
        loop {
            let name = format!("{base}{ordinal}");
            if self.is_unique_name(&name, resolver, file_identifiers) {
                self.generated_names.insert(name.clone());
                return name;
            }
            ordinal += 1;
        }
    }

    /// Stable generated name for a declaration. The first request derives
    /// and caches the name; later requests return the cached string.
    pub fn name_for_node(
        &mut self,
        arena: &NodeArena,
        node: NodeIndex,
        resolver: &dyn EmitResolver,
        file_identifiers: &FxHashSet<String>,
    ) -> String {
        if let Some(name) = self.node_to_generated_name.get(&node) {
            return name.clone();
        }
        let name = self.generate_name_for_node(arena, node, resolver, file_identifiers);
        self.node_to_generated_name.insert(node, name.clone());
        name
    }

    fn generate_name_for_node(
        &mut self,
        arena: &NodeArena,
        node: NodeIndex,
        resolver: &dyn EmitResolver,
        file_identifiers: &FxHashSet<String>,
    ) -> String {
        let Some(current) = arena.get(node) else {
            return self.make_unique_name("generated", resolver, file_identifiers);
        };
        match current.kind {
            SyntaxKind::Identifier => {
                let text = current.identifier_text().unwrap_or("generated");
                self.make_unique_name(text, resolver, file_identifiers)
            }
            SyntaxKind::ModuleDeclaration | SyntaxKind::EnumDeclaration => {
                let name = arena
                    .identifier_text(current.declaration_name())
                    .unwrap_or("container")
                    .to_string();
                // The declared name itself is reusable when nothing inside
                // the container shadows it.
                if !resolver.has_local_name(node, &name)
                    && self.is_unique_name(&name, resolver, file_identifiers)
                {
                    name
                } else {
                    self.make_unique_name(&name, resolver, file_identifiers)
                }
            }
            SyntaxKind::ImportDeclaration | SyntaxKind::ExportDeclaration => {
                let specifier = match &current.data {
                    NodeData::ImportExport(decl) => decl.module_specifier,
                    _ => NodeIndex::NONE,
                };
                let module_name = arena
                    .get(specifier)
                    .and_then(|node| node.literal_text())
                    .unwrap_or("module");
                let base = make_identifier_from_module_name(module_name);
                self.make_unique_name(&base, resolver, file_identifiers)
            }
            SyntaxKind::FunctionDeclaration
            | SyntaxKind::ClassDeclaration
            | SyntaxKind::ExportAssignment => {
                self.make_unique_name("default", resolver, file_identifiers)
            }
            SyntaxKind::ClassExpression => {
                self.make_unique_name("class", resolver, file_identifiers)
            }
            _ => self.make_unique_name("generated", resolver, file_identifiers),
        }
    }
}

/// Turn a module specifier into identifier shape: a leading digit gets an
/// underscore prefix, every other non-word character becomes an underscore.
pub fn make_identifier_from_module_name(module_name: &str) -> String {
    let mut out = String::with_capacity(module_name.len() + 1);
    for (at, ch) in module_name.chars().enumerate() {
        if at == 0 && ch.is_ascii_digit() {
            out.push('_');
        }
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out
}
