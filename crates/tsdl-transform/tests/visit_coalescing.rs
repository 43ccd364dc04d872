//! Sink disciplines: coalescing in statement and expression positions,
//! copy-on-write lists, and output validation.

use rustc_hash::FxHashSet;
use tsdl_ast::node::SourceFileData;
use tsdl_ast::{Node, NodeArena, NodeData, NodeIndex, NodeList, SyntaxKind};
use tsdl_common::CompilerOptions;
use tsdl_transform::{
    NameGenerator, NodeSink, NullResolver, Pipeline, PipelineFlags, PipelineFn, Transformer,
};

fn make_source_file(arena: &mut NodeArena, statements: Vec<NodeIndex>) -> NodeIndex {
    arena.add(Node::new(
        SyntaxKind::SourceFile,
        NodeData::SourceFile(SourceFileData {
            file_name: "main.ts".to_string(),
            statements: NodeList::new(statements),
            identifiers: FxHashSet::default(),
        }),
    ))
}

fn expression_statement(arena: &mut NodeArena, name: &str) -> NodeIndex {
    let ident = arena.create_identifier(name);
    arena.create_expression_statement(ident)
}

fn block_elements(arena: &NodeArena, block: NodeIndex) -> NodeList {
    match &arena.get(block).unwrap().data {
        NodeData::ListOf(list) => list.elements.clone(),
        other => panic!("expected a block, got {other:?}"),
    }
}

/// Splits one statement into itself plus a synthesized follow-up.
struct SplitInTwo;

impl Pipeline for SplitInTwo {
    fn visit(
        &mut self,
        tx: &mut Transformer<'_>,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
        _offset: Option<usize>,
    ) {
        output.write(tx, input);
        let extra = expression_statement(tx.arena_mut(), "extra");
        output.write(tx, extra);
    }
}

#[test]
fn statement_position_fan_out_becomes_a_block() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = SplitInTwo;
    let result = tx.visit_node(&mut rule, statement, PipelineFlags::STATEMENT_OR_BLOCK);
    drop(tx);

    assert_eq!(arena.kind(result), Some(SyntaxKind::Block));
    let elements = block_elements(&arena, result);
    assert_eq!(elements.len(), 2);
    assert_eq!(elements.get(0), Some(statement));
}

fn replace_with_identifier(
    tx: &mut Transformer<'_>,
    _input: NodeIndex,
    output: &mut NodeSink<'_>,
    _offset: Option<usize>,
) {
    let ident = tx.arena_mut().create_identifier("value");
    output.write(tx, ident);
}

#[test]
fn lone_expression_in_statement_position_is_wrapped() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(replace_with_identifier);
    let result = tx.visit_node(&mut rule, statement, PipelineFlags::STATEMENT_OR_BLOCK);
    drop(tx);

    assert_eq!(arena.kind(result), Some(SyntaxKind::ExpressionStatement));
}

#[test]
fn lone_expression_in_expression_position_stays_bare() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(replace_with_identifier);
    let result = tx.visit_node(&mut rule, statement, PipelineFlags::EXPRESSION_OR_BLOCK);
    drop(tx);

    assert_eq!(arena.kind(result), Some(SyntaxKind::Identifier));
}

/// Writes a statement then an expression, forcing a block in expression
/// position.
struct StatementThenExpression;

impl Pipeline for StatementThenExpression {
    fn visit(
        &mut self,
        tx: &mut Transformer<'_>,
        _input: NodeIndex,
        output: &mut NodeSink<'_>,
        _offset: Option<usize>,
    ) {
        let side_effect = expression_statement(tx.arena_mut(), "sideEffect");
        output.write(tx, side_effect);
        let result = tx.arena_mut().create_identifier("result");
        output.write(tx, result);
    }
}

#[test]
fn expression_position_fan_out_returns_through_a_block() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = StatementThenExpression;
    let result = tx.visit_node(&mut rule, statement, PipelineFlags::EXPRESSION_OR_BLOCK);
    drop(tx);

    assert_eq!(arena.kind(result), Some(SyntaxKind::Block));
    let elements = block_elements(&arena, result);
    assert_eq!(elements.len(), 2);
    assert_eq!(
        arena.kind(elements.get(0).unwrap()),
        Some(SyntaxKind::ExpressionStatement)
    );
    // The trailing expression becomes the block's completion value.
    assert_eq!(
        arena.kind(elements.get(1).unwrap()),
        Some(SyntaxKind::ReturnStatement)
    );
}

fn drop_node(
    _tx: &mut Transformer<'_>,
    _input: NodeIndex,
    _output: &mut NodeSink<'_>,
    _offset: Option<usize>,
) {
}

#[test]
fn empty_statement_position_output_collapses_to_none() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(drop_node);
    let result = tx.visit_node(&mut rule, statement, PipelineFlags::STATEMENT_OR_BLOCK);

    assert!(result.is_none());
}

#[test]
#[should_panic(expected = "exactly one")]
fn empty_output_in_an_exact_position_panics() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(drop_node);
    tx.visit_node(&mut rule, statement, PipelineFlags::empty());
}

fn write_through(
    tx: &mut Transformer<'_>,
    node: NodeIndex,
    output: &mut NodeSink<'_>,
    _offset: Option<usize>,
) {
    output.write(tx, node);
}

#[test]
fn unchanged_list_visit_preserves_identity() {
    let mut arena = NodeArena::new();
    let statements: Vec<NodeIndex> = ["a", "b", "c"]
        .iter()
        .map(|name| expression_statement(&mut arena, name))
        .collect();
    let list = NodeList::new(statements);
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(write_through);
    let visited = tx.visit_nodes(&mut rule, &list, PipelineFlags::empty(), 0);

    assert!(visited.same(&list));
}

/// Replaces the element at one position, passing everything else through.
struct RewriteAt {
    at: usize,
}

impl Pipeline for RewriteAt {
    fn visit(
        &mut self,
        tx: &mut Transformer<'_>,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
        offset: Option<usize>,
    ) {
        if offset == Some(self.at) {
            let replacement = tx.arena_mut().clone_node(input);
            output.write(tx, replacement);
        } else {
            output.write(tx, input);
        }
    }
}

#[test]
fn list_visit_copies_only_from_the_first_change() {
    let mut arena = NodeArena::new();
    let statements: Vec<NodeIndex> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|name| expression_statement(&mut arena, name))
        .collect();
    let list = NodeList::new(statements.clone());
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = RewriteAt { at: 2 };
    let visited = tx.visit_nodes(&mut rule, &list, PipelineFlags::empty(), 0);
    drop(tx);

    assert!(!visited.same(&list));
    assert_eq!(visited.len(), 5);
    assert_eq!(visited.get(0), Some(statements[0]));
    assert_eq!(visited.get(1), Some(statements[1]));
    assert_ne!(visited.get(2), Some(statements[2]));
    assert_eq!(visited.get(3), Some(statements[3]));
    assert_eq!(visited.get(4), Some(statements[4]));
}

#[test]
fn list_visit_offset_skips_a_verbatim_prefix() {
    let mut arena = NodeArena::new();
    let statements: Vec<NodeIndex> = ["a", "b", "c"]
        .iter()
        .map(|name| expression_statement(&mut arena, name))
        .collect();
    let list = NodeList::new(statements.clone());
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    // Rewrite everything from offset 1 onward.
    let mut rule = RewriteAt { at: 1 };
    let visited = tx.visit_nodes(&mut rule, &list, PipelineFlags::empty(), 1);
    drop(tx);

    assert_eq!(visited.len(), 3);
    // Element 0 was never visited.
    assert_eq!(visited.get(0), Some(statements[0]));
    assert_ne!(visited.get(1), Some(statements[1]));
    assert_eq!(visited.get(2), Some(statements[2]));
}

#[test]
fn buffer_sink_collects_writes_in_order() {
    let mut arena = NodeArena::new();
    let statements: Vec<NodeIndex> = ["a", "b"]
        .iter()
        .map(|name| expression_statement(&mut arena, name))
        .collect();
    let list = NodeList::new(statements.clone());
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut collected = Vec::new();
    {
        let mut sink = NodeSink::buffer(&mut collected);
        let mut rule = PipelineFn(write_through);
        tx.pipe_nodes(&mut rule, &list, &mut sink, 0, PipelineFlags::empty());
    }

    assert_eq!(collected, statements);
}

#[test]
#[should_panic(expected = "written where the sink forbids it")]
fn node_test_rejects_wrong_kinds() {
    let mut arena = NodeArena::new();
    let ident = arena.create_identifier("notAStatement");
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut collected = Vec::new();
    let mut sink = NodeSink::buffer(&mut collected).with_node_test(|node| node.kind.is_statement());
    let mut rule = PipelineFn(write_through);
    tx.pipe_node(&mut rule, ident, &mut sink, PipelineFlags::empty());
}

#[test]
fn visit_with_a_shape_check_accepts_conforming_outputs() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(write_through);
    let result = tx.visit_node_with_test(&mut rule, statement, PipelineFlags::empty(), |node| {
        node.kind.is_statement()
    });

    assert_eq!(result, statement);
}

#[test]
#[should_panic(expected = "written where the sink forbids it")]
fn list_visit_with_a_shape_check_rejects_wrong_outputs() {
    let mut arena = NodeArena::new();
    let statements: Vec<NodeIndex> = ["a", "b"]
        .iter()
        .map(|name| expression_statement(&mut arena, name))
        .collect();
    let list = NodeList::new(statements);
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    // The rule swaps statements for bare identifiers, which the check
    // refuses.
    let mut rule = PipelineFn(replace_with_identifier);
    tx.visit_nodes_with_test(&mut rule, &list, PipelineFlags::empty(), 0, |node| {
        node.kind.is_statement()
    });
}

#[test]
fn emit_with_a_shape_check_accepts_conforming_outputs() {
    let mut arena = NodeArena::new();
    let statement = expression_statement(&mut arena, "a");
    let source_file = make_source_file(&mut arena, vec![statement]);

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = PipelineFn(write_through);
    let mut collected = Vec::new();
    tx.emit_node_with_test(
        &mut rule,
        statement,
        &mut collected,
        PipelineFlags::empty(),
        |node| node.kind.is_statement(),
    );

    assert_eq!(collected, vec![statement]);
}

/// Expands each statement into itself plus a synthesized follow-up.
struct EmitPair;

impl Pipeline for EmitPair {
    fn visit(
        &mut self,
        tx: &mut Transformer<'_>,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
        _offset: Option<usize>,
    ) {
        output.write(tx, input);
        let extra = expression_statement(tx.arena_mut(), "paired");
        output.write(tx, extra);
    }
}

#[test]
fn emit_appends_every_output_to_the_buffer() {
    let mut arena = NodeArena::new();
    let statements: Vec<NodeIndex> = ["a", "b"]
        .iter()
        .map(|name| expression_statement(&mut arena, name))
        .collect();
    let list = NodeList::new(statements.clone());
    let source_file = make_source_file(&mut arena, Vec::new());

    let options = CompilerOptions::default();
    let resolver = NullResolver;
    let mut names = NameGenerator::new();
    let mut tx = Transformer::new(&mut arena, &options, &resolver, &mut names, source_file);
    let mut rule = EmitPair;
    let mut collected = vec![statements[0]];
    tx.emit_nodes(&mut rule, &list, &mut collected, 1, PipelineFlags::empty());
    drop(tx);

    // The existing buffer contents stay put; element 0 was skipped by the
    // offset, so only "b" and its pair were appended.
    assert_eq!(collected.len(), 3);
    assert_eq!(collected[0], statements[0]);
    assert_eq!(collected[1], statements[1]);
    assert_eq!(
        arena.kind(collected[2]),
        Some(SyntaxKind::ExpressionStatement)
    );
}
