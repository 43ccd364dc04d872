//! The visit engine: pipelines, output sinks, and the driver that threads
//! nodes through lowering rules.
//!
//! A [`Pipeline`] is one lowering rule. The driver hands it an input node
//! and a [`NodeSink`]; the rule writes zero or more replacement nodes into
//! the sink. Sinks enforce the output discipline the call site needs: an
//! exact single node, a statement position that tolerates fan-out by
//! wrapping in a block, an expression position that does the same with a
//! synthesized return, or a copy-on-write node list.
//!
//! Writing a node to any sink classifies it (and its subtree) through the
//! run's flag cache, so rules can rely on flags being present for anything
//! downstream of them.

use bitflags::bitflags;
use tsdl_ast::{Node, NodeData, NodeIndex, NodeList, SyntaxKind};

use crate::transformer::Transformer;

bitflags! {
    /// Call-site requirements a rule passes when re-entering the driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PipelineFlags: u8 {
        /// The visited node owns a lexical environment: hoisted declarations
        /// from the subtree are appended after its statements.
        const LEXICAL_ENVIRONMENT = 1 << 1;
        /// Statement position: multiple outputs coalesce into a block, a
        /// lone expression is wrapped in an expression statement.
        const STATEMENT_OR_BLOCK = 1 << 2;
        /// Expression position: statement outputs coalesce into a block
        /// whose expressions become return statements.
        const EXPRESSION_OR_BLOCK = 1 << 3;
    }
}

/// A lowering rule. Reads `input`, writes replacements to `output`.
/// `offset` is the element's position when the input came from a list.
pub trait Pipeline {
    fn visit(
        &mut self,
        tx: &mut Transformer<'_>,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
        offset: Option<usize>,
    );
}

/// Adapter letting a closure act as a [`Pipeline`].
pub struct PipelineFn<F>(pub F);

impl<F> Pipeline for PipelineFn<F>
where
    F: FnMut(&mut Transformer<'_>, NodeIndex, &mut NodeSink<'_>, Option<usize>),
{
    fn visit(
        &mut self,
        tx: &mut Transformer<'_>,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
        offset: Option<usize>,
    ) {
        (self.0)(tx, input, output, offset)
    }
}

/// How a single-node sink reconciles its collected writes into one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceMode {
    /// Exactly one node must be written; anything else is a rule defect.
    Exact,
    /// Statement position.
    StatementOrBlock,
    /// Expression position.
    ExpressionOrBlock,
}

#[derive(Debug)]
struct SingleSink {
    mode: CoalesceMode,
    nodes: Vec<NodeIndex>,
}

impl SingleSink {
    fn finish(self, tx: &mut Transformer<'_>) -> NodeIndex {
        match self.mode {
            CoalesceMode::Exact => match self.nodes.as_slice() {
                &[node] => node,
                nodes => panic!(
                    "pipeline wrote {} nodes where exactly one was expected",
                    nodes.len()
                ),
            },
            CoalesceMode::StatementOrBlock => match self.nodes.as_slice() {
                [] => NodeIndex::NONE,
                &[node] => as_statement(tx, node),
                _ => {
                    let statements: Vec<NodeIndex> = self
                        .nodes
                        .iter()
                        .map(|&node| as_statement(tx, node))
                        .collect();
                    tx.arena_mut().create_block(statements)
                }
            },
            CoalesceMode::ExpressionOrBlock => match self.nodes.as_slice() {
                [] => NodeIndex::NONE,
                &[node] if tx.arena().kind(node).is_some_and(SyntaxKind::is_expression) => node,
                _ => {
                    let statements: Vec<NodeIndex> = self
                        .nodes
                        .iter()
                        .map(|&node| as_returned_statement(tx, node))
                        .collect();
                    tx.arena_mut().create_block(statements)
                }
            },
        }
    }
}

fn as_statement(tx: &mut Transformer<'_>, node: NodeIndex) -> NodeIndex {
    if tx.arena().kind(node).is_some_and(SyntaxKind::is_expression) {
        tx.arena_mut().create_expression_statement(node)
    } else {
        node
    }
}

fn as_returned_statement(tx: &mut Transformer<'_>, node: NodeIndex) -> NodeIndex {
    if tx.arena().kind(node).is_some_and(SyntaxKind::is_expression) {
        tx.arena_mut().create_return_statement(node)
    } else {
        node
    }
}

/// Copy-on-write list writer. While writes match the original elements
/// positionally no allocation happens; on the first divergence the
/// already-matched prefix is copied and subsequent writes append.
#[derive(Debug)]
struct ArraySink {
    original: NodeList,
    /// Elements before this index were never visited and are kept verbatim.
    matched: usize,
    updated: Option<Vec<NodeIndex>>,
}

impl ArraySink {
    fn new(original: NodeList, offset: usize) -> ArraySink {
        ArraySink {
            original,
            matched: offset,
            updated: None,
        }
    }

    fn write(&mut self, node: NodeIndex) {
        match &mut self.updated {
            Some(nodes) => nodes.push(node),
            None => {
                if self.original.get(self.matched) == Some(node) {
                    self.matched += 1;
                } else {
                    let mut nodes = self.original.as_slice()[..self.matched].to_vec();
                    nodes.push(node);
                    self.updated = Some(nodes);
                }
            }
        }
    }

    fn finish(self) -> NodeList {
        match self.updated {
            Some(nodes) => NodeList::new(nodes),
            // Identity preserved only when every element matched.
            None if self.matched == self.original.len() => self.original,
            None => NodeList::new(self.original.as_slice()[..self.matched].to_vec()),
        }
    }
}

enum Discipline<'s> {
    Callback(&'s mut dyn FnMut(NodeIndex)),
    Buffer(&'s mut Vec<NodeIndex>),
    Single(SingleSink),
    Array(ArraySink),
}

/// Where a pipeline's outputs go. Every write classifies the node through
/// the run's flag cache and checks the optional node test before the
/// discipline-specific handling.
pub struct NodeSink<'s> {
    discipline: Discipline<'s>,
    node_test: Option<fn(&Node) -> bool>,
}

impl<'s> NodeSink<'s> {
    pub fn callback(callback: &'s mut dyn FnMut(NodeIndex)) -> NodeSink<'s> {
        NodeSink {
            discipline: Discipline::Callback(callback),
            node_test: None,
        }
    }

    pub fn buffer(buffer: &'s mut Vec<NodeIndex>) -> NodeSink<'s> {
        NodeSink {
            discipline: Discipline::Buffer(buffer),
            node_test: None,
        }
    }

    pub fn single(mode: CoalesceMode) -> NodeSink<'static> {
        NodeSink {
            discipline: Discipline::Single(SingleSink {
                mode,
                nodes: Vec::new(),
            }),
            node_test: None,
        }
    }

    pub fn array(original: NodeList, offset: usize) -> NodeSink<'static> {
        NodeSink {
            discipline: Discipline::Array(ArraySink::new(original, offset)),
            node_test: None,
        }
    }

    /// Require every written node to satisfy `test`; a failing write panics.
    pub fn with_node_test(mut self, test: fn(&Node) -> bool) -> NodeSink<'s> {
        self.node_test = Some(test);
        self
    }

    pub fn write(&mut self, tx: &mut Transformer<'_>, node: NodeIndex) {
        if node.is_none() {
            return;
        }
        tx.transform_flags(node);
        if let Some(test) = self.node_test {
            let passes = tx.arena().get(node).is_some_and(|n| test(n));
            if !passes {
                panic!(
                    "node of kind {:?} written where the sink forbids it",
                    tx.arena().kind(node)
                );
            }
        }
        match &mut self.discipline {
            Discipline::Callback(callback) => callback(node),
            Discipline::Buffer(buffer) => buffer.push(node),
            Discipline::Single(single) => single.nodes.push(node),
            Discipline::Array(array) => array.write(node),
        }
    }

    fn into_single(self, tx: &mut Transformer<'_>) -> NodeIndex {
        match self.discipline {
            Discipline::Single(single) => single.finish(tx),
            _ => panic!("sink is not a single-node sink"),
        }
    }

    fn into_list(self) -> NodeList {
        match self.discipline {
            Discipline::Array(array) => array.finish(),
            _ => panic!("sink is not a list sink"),
        }
    }
}

impl Transformer<'_> {
    /// Drive one node through a pipeline into a caller-supplied sink. The
    /// node is pushed on the ancestor stack unless it is already current.
    /// With [`PipelineFlags::LEXICAL_ENVIRONMENT`], the rule runs in a
    /// fresh environment and its hoisted declarations are written through
    /// the sink after the rule's own outputs.
    pub fn pipe_node(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
        flags: PipelineFlags,
    ) {
        if input.is_none() {
            return;
        }
        if flags.contains(PipelineFlags::LEXICAL_ENVIRONMENT) {
            let sink = &mut *output;
            let ((), hoisted) = self.with_fresh_environment(|scope| {
                scope.pipe_node_core(pipeline, input, sink);
            });
            for statement in hoisted {
                output.write(self, statement);
            }
        } else {
            self.pipe_node_core(pipeline, input, output);
        }
    }

    fn pipe_node_core(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: NodeIndex,
        output: &mut NodeSink<'_>,
    ) {
        let pushed = self.node_stack.try_push(input);
        pipeline.visit(self, input, output, None);
        if pushed {
            self.node_stack.pop();
        }
    }

    /// Drive list elements from `offset` onward through a pipeline. One
    /// stack slot is pushed up front and rewritten per element. The scope
    /// flag behaves as on [`Transformer::pipe_node`], covering the whole
    /// traversal.
    pub fn pipe_nodes(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: &NodeList,
        output: &mut NodeSink<'_>,
        offset: usize,
        flags: PipelineFlags,
    ) {
        if flags.contains(PipelineFlags::LEXICAL_ENVIRONMENT) {
            let sink = &mut *output;
            let ((), hoisted) = self.with_fresh_environment(|scope| {
                scope.pipe_nodes_core(pipeline, input, sink, offset);
            });
            for statement in hoisted {
                output.write(self, statement);
            }
        } else {
            self.pipe_nodes_core(pipeline, input, output, offset);
        }
    }

    fn pipe_nodes_core(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: &NodeList,
        output: &mut NodeSink<'_>,
        offset: usize,
    ) {
        self.node_stack.push(NodeIndex::NONE);
        for (index, element) in input.iter().enumerate().skip(offset) {
            self.node_stack.set_top(element);
            pipeline.visit(self, element, output, Some(index));
        }
        self.node_stack.pop();
    }

    /// Run one node through a pipeline, appending its outputs to `buffer`.
    pub fn emit_node(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: NodeIndex,
        buffer: &mut Vec<NodeIndex>,
        flags: PipelineFlags,
    ) {
        let mut sink = NodeSink::buffer(buffer);
        self.pipe_node(pipeline, input, &mut sink, flags);
    }

    /// [`Transformer::emit_node`] with a shape check on every written node.
    pub fn emit_node_with_test(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: NodeIndex,
        buffer: &mut Vec<NodeIndex>,
        flags: PipelineFlags,
        test: fn(&Node) -> bool,
    ) {
        let mut sink = NodeSink::buffer(buffer).with_node_test(test);
        self.pipe_node(pipeline, input, &mut sink, flags);
    }

    /// Run list elements from `offset` onward through a pipeline, appending
    /// all outputs to `buffer`.
    pub fn emit_nodes(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: &NodeList,
        buffer: &mut Vec<NodeIndex>,
        offset: usize,
        flags: PipelineFlags,
    ) {
        let mut sink = NodeSink::buffer(buffer);
        self.pipe_nodes(pipeline, input, &mut sink, offset, flags);
    }

    /// [`Transformer::emit_nodes`] with a shape check on every written node.
    pub fn emit_nodes_with_test(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: &NodeList,
        buffer: &mut Vec<NodeIndex>,
        offset: usize,
        flags: PipelineFlags,
        test: fn(&Node) -> bool,
    ) {
        let mut sink = NodeSink::buffer(buffer).with_node_test(test);
        self.pipe_nodes(pipeline, input, &mut sink, offset, flags);
    }

    fn visit_single(
        &mut self,
        pipeline: &mut dyn Pipeline,
        input: NodeIndex,
        mode: CoalesceMode,
        test: Option<fn(&Node) -> bool>,
    ) -> NodeIndex {
        if input.is_none() {
            return input;
        }
        let mut sink = NodeSink::single(mode);
        if let Some(test) = test {
            sink = sink.with_node_test(test);
        }
        self.pipe_node_core(pipeline, input, &mut sink);
        sink.into_single(self)
    }

    /// Rule-facing single-node visit honoring [`PipelineFlags`].
    ///
    /// Returns the input node unchanged (same index) when nothing in it
    /// was rewritten and nothing was hoisted.
    pub fn visit_node(
        &mut self,
        pipeline: &mut dyn Pipeline,
        node: NodeIndex,
        flags: PipelineFlags,
    ) -> NodeIndex {
        self.visit_node_inner(pipeline, node, flags, None)
    }

    /// [`Transformer::visit_node`] with a shape check on every node the
    /// rule writes; a failing write panics.
    pub fn visit_node_with_test(
        &mut self,
        pipeline: &mut dyn Pipeline,
        node: NodeIndex,
        flags: PipelineFlags,
        test: fn(&Node) -> bool,
    ) -> NodeIndex {
        self.visit_node_inner(pipeline, node, flags, Some(test))
    }

    fn visit_node_inner(
        &mut self,
        pipeline: &mut dyn Pipeline,
        node: NodeIndex,
        flags: PipelineFlags,
        test: Option<fn(&Node) -> bool>,
    ) -> NodeIndex {
        if node.is_none() {
            return node;
        }
        if flags.contains(PipelineFlags::LEXICAL_ENVIRONMENT) {
            return self.visit_in_fresh_environment(pipeline, node, flags, test);
        }
        self.visit_single(pipeline, node, coalesce_mode(flags), test)
    }

    /// Rule-facing list visit. Returns the original list (same storage, so
    /// [`NodeList::same`] holds) when no element changed; otherwise a new
    /// list copied from the first changed position onward. With the scope
    /// flag, the whole traversal runs in a fresh environment and hoisted
    /// declarations are appended to the returned list.
    pub fn visit_nodes(
        &mut self,
        pipeline: &mut dyn Pipeline,
        nodes: &NodeList,
        flags: PipelineFlags,
        offset: usize,
    ) -> NodeList {
        self.visit_nodes_inner(pipeline, nodes, flags, offset, None)
    }

    /// [`Transformer::visit_nodes`] with a shape check on every node the
    /// rule writes; a failing write panics.
    pub fn visit_nodes_with_test(
        &mut self,
        pipeline: &mut dyn Pipeline,
        nodes: &NodeList,
        flags: PipelineFlags,
        offset: usize,
        test: fn(&Node) -> bool,
    ) -> NodeList {
        self.visit_nodes_inner(pipeline, nodes, flags, offset, Some(test))
    }

    fn visit_nodes_inner(
        &mut self,
        pipeline: &mut dyn Pipeline,
        nodes: &NodeList,
        flags: PipelineFlags,
        offset: usize,
        test: Option<fn(&Node) -> bool>,
    ) -> NodeList {
        if flags.contains(PipelineFlags::LEXICAL_ENVIRONMENT) {
            let (visited, hoisted) = self.with_fresh_environment(|scope| {
                scope.visit_list(pipeline, nodes, offset, test)
            });
            if hoisted.is_empty() {
                return visited;
            }
            let mut combined: Vec<NodeIndex> = visited.iter().collect();
            combined.extend(hoisted);
            NodeList::new(combined)
        } else {
            self.visit_list(pipeline, nodes, offset, test)
        }
    }

    fn visit_list(
        &mut self,
        pipeline: &mut dyn Pipeline,
        nodes: &NodeList,
        offset: usize,
        test: Option<fn(&Node) -> bool>,
    ) -> NodeList {
        let mut sink = NodeSink::array(nodes.clone(), offset);
        if let Some(test) = test {
            sink = sink.with_node_test(test);
        }
        self.pipe_nodes_core(pipeline, nodes, &mut sink, offset);
        sink.into_list()
    }

    fn visit_in_fresh_environment(
        &mut self,
        pipeline: &mut dyn Pipeline,
        node: NodeIndex,
        flags: PipelineFlags,
        test: Option<fn(&Node) -> bool>,
    ) -> NodeIndex {
        let mode = self.environment_coalesce_mode(node, flags);
        let (result, hoisted) = self.with_fresh_environment(|scope| {
            scope.visit_environment_owner(pipeline, node, mode, test)
        });
        if hoisted.is_empty() {
            return result;
        }
        self.splice_hoisted(hoisted, node, result, mode)
    }

    /// An expression scope body (an arrow's expression body) defaults to
    /// expression-position coalescing when the caller stated no position.
    fn environment_coalesce_mode(&self, node: NodeIndex, flags: PipelineFlags) -> CoalesceMode {
        if flags
            .intersects(PipelineFlags::STATEMENT_OR_BLOCK | PipelineFlags::EXPRESSION_OR_BLOCK)
        {
            coalesce_mode(flags)
        } else if self.arena.kind(node).is_some_and(SyntaxKind::is_expression) {
            CoalesceMode::ExpressionOrBlock
        } else {
            CoalesceMode::Exact
        }
    }

    fn visit_environment_owner(
        &mut self,
        pipeline: &mut dyn Pipeline,
        node: NodeIndex,
        mode: CoalesceMode,
        test: Option<fn(&Node) -> bool>,
    ) -> NodeIndex {
        match self.arena.kind(node) {
            Some(SyntaxKind::Block | SyntaxKind::ModuleBlock) => {
                let statements = match self.arena.get(node).map(|n| &n.data) {
                    Some(NodeData::ListOf(list)) => list.elements.clone(),
                    _ => NodeList::empty(),
                };
                let visited = self.visit_list(pipeline, &statements, 0, test);
                if visited.same(&statements) {
                    node
                } else if self.arena.kind(node) == Some(SyntaxKind::ModuleBlock) {
                    self.arena.create_module_block(visited)
                } else {
                    self.arena.create_block_from_list(visited)
                }
            }
            _ => self.visit_single(pipeline, node, mode, test),
        }
    }

    /// Combine the visit result with the scope's hoisted declarations,
    /// which land at the end of the scope's output. Blocks absorb them
    /// after their statements; any other result is first adapted to
    /// statement shape.
    fn splice_hoisted(
        &mut self,
        hoisted: Vec<NodeIndex>,
        original: NodeIndex,
        result: NodeIndex,
        mode: CoalesceMode,
    ) -> NodeIndex {
        let mut statements = Vec::new();
        match self.arena.kind(result) {
            Some(SyntaxKind::Block | SyntaxKind::ModuleBlock) => {
                if let Some(NodeData::ListOf(list)) = self.arena.get(result).map(|n| &n.data) {
                    statements.extend(list.elements.iter());
                }
                statements.extend(hoisted);
                if self.arena.kind(original) == Some(SyntaxKind::ModuleBlock) {
                    self.arena.create_module_block(NodeList::new(statements))
                } else {
                    self.arena.create_block(statements)
                }
            }
            Some(kind) if kind.is_expression() => {
                let adapted = if mode == CoalesceMode::ExpressionOrBlock {
                    self.arena.create_return_statement(result)
                } else {
                    self.arena.create_expression_statement(result)
                };
                statements.push(adapted);
                statements.extend(hoisted);
                self.arena.create_block(statements)
            }
            Some(_) => {
                statements.push(result);
                statements.extend(hoisted);
                self.arena.create_block(statements)
            }
            None => self.arena.create_block(hoisted),
        }
    }
}

fn coalesce_mode(flags: PipelineFlags) -> CoalesceMode {
    if flags.contains(PipelineFlags::STATEMENT_OR_BLOCK) {
        CoalesceMode::StatementOrBlock
    } else if flags.contains(PipelineFlags::EXPRESSION_OR_BLOCK) {
        CoalesceMode::ExpressionOrBlock
    } else {
        CoalesceMode::Exact
    }
}
