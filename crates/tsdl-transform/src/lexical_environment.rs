//! Lexical environments: per-scope hoisting state for lowering rules.
//!
//! Rules that flatten scoped constructs (destructuring, loop captures,
//! namespace bodies) need somewhere to put the declarations they lift out.
//! Each function-like or module scope gets a fresh environment; when the
//! scope's statements have been rewritten, [`LexicalEnvironment::take_declarations`]
//! turns whatever was hoisted into statements appended at the end of the
//! scope's output.

use tsdl_ast::{NodeArena, NodeIndex};

use crate::name_generator::TempFlags;

/// Hoisting state for one scope. Created empty at scope entry; the previous
/// scope's environment is saved by the driver and restored on exit.
#[derive(Debug, Default)]
pub struct LexicalEnvironment {
    pub temp_flags: TempFlags,
    hoisted_variables: Option<Vec<NodeIndex>>,
    hoisted_functions: Option<Vec<NodeIndex>>,
}

impl LexicalEnvironment {
    pub fn new() -> LexicalEnvironment {
        LexicalEnvironment::default()
    }

    /// Record a variable name (an identifier node) to be declared at the
    /// top of the current scope.
    pub fn hoist_variable_declaration(&mut self, arena: &mut NodeArena, name: NodeIndex) {
        let declaration = arena.create_variable_declaration(name);
        self.hoisted_variables
            .get_or_insert_with(Vec::new)
            .push(declaration);
    }

    /// Record a function declaration to be moved to the top of the current
    /// scope.
    pub fn hoist_function_declaration(&mut self, declaration: NodeIndex) {
        self.hoisted_functions
            .get_or_insert_with(Vec::new)
            .push(declaration);
    }

    pub fn has_declarations(&self) -> bool {
        self.hoisted_variables.is_some() || self.hoisted_functions.is_some()
    }

    /// Drain the hoisted declarations into statements for the scope's
    /// output. Variables collapse into one combined `var` statement in
    /// hoist order and take precedence: when both kinds were hoisted, only
    /// the variable statement is produced, so the scope gains exactly one
    /// declaration block.
    pub fn take_declarations(&mut self, arena: &mut NodeArena) -> Vec<NodeIndex> {
        let variables = self.hoisted_variables.take();
        let functions = self.hoisted_functions.take();
        if let Some(variables) = variables {
            let list = arena.create_variable_declaration_list(variables);
            vec![arena.create_variable_statement(list)]
        } else if let Some(functions) = functions {
            functions
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsdl_ast::{NodeData, SyntaxKind};

    #[test]
    fn empty_environment_produces_no_statements() {
        let mut arena = NodeArena::new();
        let mut env = LexicalEnvironment::new();
        assert!(!env.has_declarations());
        assert!(env.take_declarations(&mut arena).is_empty());
    }

    #[test]
    fn hoisted_variables_collapse_into_one_statement() {
        let mut arena = NodeArena::new();
        let mut env = LexicalEnvironment::new();
        let a = arena.create_identifier("a");
        let b = arena.create_identifier("b");
        env.hoist_variable_declaration(&mut arena, a);
        env.hoist_variable_declaration(&mut arena, b);

        let statements = env.take_declarations(&mut arena);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            arena.kind(statements[0]),
            Some(SyntaxKind::VariableStatement)
        );

        let list = match &arena.get(statements[0]).unwrap().data {
            NodeData::Wrapped(wrapped) => wrapped.expression,
            _ => panic!("variable statement should wrap its declaration list"),
        };
        let declarations = match &arena.get(list).unwrap().data {
            NodeData::ListOf(list) => list.elements.clone(),
            _ => panic!("declaration list should hold its declarations"),
        };
        assert_eq!(declarations.len(), 2);
    }

    #[test]
    fn hoisted_functions_come_out_in_hoist_order() {
        let mut arena = NodeArena::new();
        let mut env = LexicalEnvironment::new();
        let first = arena.create_identifier("f");
        let second = arena.create_identifier("g");
        env.hoist_function_declaration(first);
        env.hoist_function_declaration(second);

        assert_eq!(env.take_declarations(&mut arena), vec![first, second]);
    }

    #[test]
    fn variables_take_precedence_over_functions() {
        let mut arena = NodeArena::new();
        let mut env = LexicalEnvironment::new();

        let func = arena.create_identifier("f");
        env.hoist_function_declaration(func);
        let name = arena.create_identifier("x");
        env.hoist_variable_declaration(&mut arena, name);

        // Only the combined variable statement fires.
        let statements = env.take_declarations(&mut arena);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            arena.kind(statements[0]),
            Some(SyntaxKind::VariableStatement)
        );
    }

    #[test]
    fn take_declarations_resets_the_environment() {
        let mut arena = NodeArena::new();
        let mut env = LexicalEnvironment::new();
        let name = arena.create_identifier("x");
        env.hoist_variable_declaration(&mut arena, name);
        assert!(env.has_declarations());

        env.take_declarations(&mut arena);
        assert!(!env.has_declarations());
        assert!(env.take_declarations(&mut arena).is_empty());
    }
}
