//! Per-function control-flow graphs.
//!
//! A graph is built in a single forward pass over a function's statement
//! list. Straight-line statements accumulate into the current basic block;
//! `if` and loop statements close the block and introduce the branch/merge
//! or header/body/exit structure; `return` marks the block as an exit.
//! Blocks own clones of their statements, so a built graph is self-contained
//! and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::nodes::{Expression, ExpressionKind, Function, Statement, StatementKind};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ControlFlow,
    ConditionalTrue,
    ConditionalFalse,
    LoopBack,
    Call,
    Exception,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub source: BlockId,
    pub target: BlockId,
    pub kind: EdgeKind,
}

/// A basic block: a maximal straight-line run of statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgNode {
    pub id: BlockId,
    pub label: String,
    pub statements: Vec<Statement>,
    pub is_entry: bool,
    pub is_exit: bool,
    pub is_branch: bool,
    pub is_merge: bool,
}

impl CfgNode {
    fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            statements: Vec::new(),
            is_entry: false,
            is_exit: false,
            is_branch: false,
            is_merge: false,
        }
    }

    /// Statements up to and including the first return; anything past it is
    /// structurally present but dead.
    pub fn has_return(&self) -> bool {
        self.statements.iter().any(Statement::is_return)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub function_name: String,
    pub nodes: BTreeMap<BlockId, CfgNode>,
    pub edges: Vec<CfgEdge>,
    pub entry: BlockId,
    pub exit_nodes: Vec<BlockId>,
}

impl ControlFlowGraph {
    /// Builds the graph for one function. Total: any function body, empty
    /// included, produces a graph with exactly one entry node.
    pub fn build(function: &Function) -> Self {
        CfgBuilder::new(&function.name).build(&function.body)
    }

    pub fn node(&self, id: BlockId) -> Option<&CfgNode> {
        self.nodes.get(&id)
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.target)
            .collect()
    }

    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.source)
            .collect()
    }

    /// Successor adjacency in edge-insertion order, one scan over the edge
    /// list instead of one per node.
    pub fn successor_map(&self) -> BTreeMap<BlockId, Vec<BlockId>> {
        let mut map: BTreeMap<BlockId, Vec<BlockId>> = BTreeMap::new();
        for id in self.nodes.keys() {
            map.insert(*id, Vec::new());
        }
        for edge in &self.edges {
            map.entry(edge.source).or_default().push(edge.target);
        }
        map
    }

    /// All node ids reachable from `start` following edges of any kind.
    /// Iterative so pathological graphs cannot exhaust the call stack.
    pub fn reachable_nodes(&self, start: BlockId) -> std::collections::BTreeSet<BlockId> {
        let successors = self.successor_map();
        let mut visited = std::collections::BTreeSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = successors.get(&current) {
                stack.extend(next.iter().copied());
            }
        }
        visited
    }

    /// Node ids not reachable from the entry node.
    pub fn unreachable_nodes(&self) -> Vec<BlockId> {
        let reachable = self.reachable_nodes(self.entry);
        self.nodes
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect()
    }
}

struct CfgBuilder {
    function_name: String,
    nodes: BTreeMap<BlockId, CfgNode>,
    edges: Vec<CfgEdge>,
    exit_nodes: Vec<BlockId>,
    next_id: u32,
}

impl CfgBuilder {
    fn new(function_name: &str) -> Self {
        Self {
            function_name: function_name.to_string(),
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            exit_nodes: Vec::new(),
            next_id: 0,
        }
    }

    fn build(mut self, body: &[Statement]) -> ControlFlowGraph {
        let entry = self.new_node("entry");
        self.nodes.get_mut(&entry).unwrap().is_entry = true;

        let mut current = entry;
        for statement in body {
            current = self.process_statement(statement, current);
        }

        // Implicit fall-through return.
        self.mark_exit(current);

        ControlFlowGraph {
            function_name: self.function_name,
            nodes: self.nodes,
            edges: self.edges,
            entry,
            exit_nodes: self.exit_nodes,
        }
    }

    fn new_node(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, CfgNode::new(id, label));
        id
    }

    fn edge(&mut self, source: BlockId, target: BlockId, kind: EdgeKind) {
        self.edges.push(CfgEdge {
            source,
            target,
            kind,
        });
    }

    fn append(&mut self, block: BlockId, statement: &Statement) {
        self.nodes
            .get_mut(&block)
            .unwrap()
            .statements
            .push(statement.clone());
    }

    /// Registers an exit block at most once, so adjacent returns in the same
    /// block collapse to a single exit node.
    fn mark_exit(&mut self, block: BlockId) {
        let node = self.nodes.get_mut(&block).unwrap();
        if !node.is_exit {
            node.is_exit = true;
            self.exit_nodes.push(block);
        }
    }

    fn process_statement(&mut self, statement: &Statement, current: BlockId) -> BlockId {
        match &statement.kind {
            StatementKind::If {
                then_block,
                else_block,
                ..
            } => self.process_if(statement, then_block, else_block.as_deref(), current),
            StatementKind::While { condition, body } => {
                self.process_loop(statement, Some(condition), body, current)
            }
            StatementKind::For { condition, body } => {
                self.process_loop(statement, condition.as_ref(), body, current)
            }
            StatementKind::Return { .. } => {
                self.append(current, statement);
                self.mark_exit(current);
                // The block stays current: anything textually after the
                // return is appended here and left for dead-code detection.
                current
            }
            _ => {
                self.append(current, statement);
                current
            }
        }
    }

    fn process_if(
        &mut self,
        statement: &Statement,
        then_block: &[Statement],
        else_block: Option<&[Statement]>,
        current: BlockId,
    ) -> BlockId {
        self.append(current, statement);
        self.nodes.get_mut(&current).unwrap().is_branch = true;

        let then_id = self.new_node("then");
        let else_id = else_block.map(|_| self.new_node("else"));
        let merge_id = self.new_node("merge");
        self.nodes.get_mut(&merge_id).unwrap().is_merge = true;

        self.edge(current, then_id, EdgeKind::ConditionalTrue);
        match else_id {
            Some(else_id) => self.edge(current, else_id, EdgeKind::ConditionalFalse),
            None => self.edge(current, merge_id, EdgeKind::ConditionalFalse),
        }

        let mut then_tail = then_id;
        for stmt in then_block {
            then_tail = self.process_statement(stmt, then_tail);
        }

        if let (Some(else_id), Some(else_statements)) = (else_id, else_block) {
            let mut else_tail = else_id;
            for stmt in else_statements {
                else_tail = self.process_statement(stmt, else_tail);
            }
            self.edge(else_tail, merge_id, EdgeKind::ControlFlow);
        }

        self.edge(then_tail, merge_id, EdgeKind::ControlFlow);

        merge_id
    }

    fn process_loop(
        &mut self,
        statement: &Statement,
        condition: Option<&Expression>,
        body: &[Statement],
        current: BlockId,
    ) -> BlockId {
        let header = self.new_node("loop_header");
        self.nodes.get_mut(&header).unwrap().is_branch = true;
        self.append(header, statement);

        let body_id = self.new_node("loop_body");
        let exit_id = self.new_node("loop_exit");

        self.edge(current, header, EdgeKind::ControlFlow);
        self.edge(header, body_id, EdgeKind::ConditionalTrue);

        // A condition that can never be false gets no false edge out of the
        // header; such a loop can only be left through a body-level jump.
        if !condition.map(is_constant_true).unwrap_or(true) {
            self.edge(header, exit_id, EdgeKind::ConditionalFalse);
        }

        let mut body_tail = body_id;
        for stmt in body {
            body_tail = self.process_statement(stmt, body_tail);
        }
        self.edge(body_tail, header, EdgeKind::LoopBack);

        exit_id
    }
}

/// True for a literal boolean `true` condition, covering both JSON booleans
/// and the string-encoded literals solc emits.
fn is_constant_true(condition: &Expression) -> bool {
    match &condition.kind {
        ExpressionKind::Literal { value, .. } => {
            value == &serde_json::Value::Bool(true) || value.as_str() == Some("true")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeId;

    fn ident(name: &str) -> Expression {
        Expression::new(NodeId(0), ExpressionKind::Identifier { name: name.into() })
    }

    fn assign(name: &str) -> Statement {
        Statement::new(
            NodeId(0),
            StatementKind::Assignment {
                target: ident(name),
                value: ident("v"),
            },
        )
    }

    fn ret() -> Statement {
        Statement::new(NodeId(0), StatementKind::Return { value: None })
    }

    #[test]
    fn straight_line_function_is_one_block() {
        let mut function = Function::new(NodeId(1), "f");
        function.body = vec![assign("a"), assign("b"), ret()];

        let cfg = ControlFlowGraph::build(&function);

        assert_eq!(cfg.nodes.len(), 1);
        assert_eq!(cfg.edges.len(), 0);
        assert_eq!(cfg.exit_nodes, vec![cfg.entry]);
        let entry = cfg.node(cfg.entry).unwrap();
        assert!(entry.is_entry && entry.is_exit);
        assert_eq!(entry.statements.len(), 3);
    }

    #[test]
    fn empty_body_yields_single_entry_exit_node() {
        let function = Function::new(NodeId(1), "noop");
        let cfg = ControlFlowGraph::build(&function);

        assert_eq!(cfg.nodes.len(), 1);
        assert_eq!(cfg.edges.len(), 0);
        let entry = cfg.node(cfg.entry).unwrap();
        assert!(entry.is_entry && entry.is_exit);
        assert!(entry.statements.is_empty());
    }

    #[test]
    fn if_without_else_routes_false_edge_to_merge() {
        let mut function = Function::new(NodeId(1), "f");
        function.body = vec![Statement::new(
            NodeId(2),
            StatementKind::If {
                condition: ident("flag"),
                then_block: vec![assign("x")],
                else_block: None,
            },
        )];

        let cfg = ControlFlowGraph::build(&function);

        // entry(branch), then, merge
        assert_eq!(cfg.nodes.len(), 3);
        assert_eq!(cfg.edges.len(), 3);
        assert!(cfg.node(cfg.entry).unwrap().is_branch);
        assert!(cfg
            .edges
            .iter()
            .any(|e| e.source == cfg.entry && e.kind == EdgeKind::ConditionalFalse));
        let merge = cfg.nodes.values().find(|n| n.is_merge).unwrap();
        assert!(merge.is_exit, "fall-through merge becomes the exit");
    }

    #[test]
    fn adjacent_returns_collapse_to_one_exit_node() {
        let mut function = Function::new(NodeId(1), "f");
        function.body = vec![ret(), ret()];

        let cfg = ControlFlowGraph::build(&function);
        assert_eq!(cfg.exit_nodes.len(), 1);
        assert_eq!(cfg.node(cfg.entry).unwrap().statements.len(), 2);
    }

    #[test]
    fn constant_true_loop_has_no_header_exit_edge() {
        let mut function = Function::new(NodeId(1), "spin");
        let condition = Expression::new(
            NodeId(0),
            ExpressionKind::Literal {
                value: serde_json::Value::Bool(true),
                ty: crate::nodes::IrType::primitive("bool"),
            },
        );
        function.body = vec![Statement::new(
            NodeId(2),
            StatementKind::While {
                condition,
                body: vec![assign("x")],
            },
        )];

        let cfg = ControlFlowGraph::build(&function);
        assert!(!cfg
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::ConditionalFalse));
        assert!(cfg.edges.iter().any(|e| e.kind == EdgeKind::LoopBack));
    }
}
