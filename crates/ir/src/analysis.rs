//! Read-only analyses over built control-flow graphs and IR functions.
//!
//! Everything here is a pure computation: cycle detection (iterative
//! Tarjan), cyclomatic complexity, nesting depth, and the missing-return
//! check. Traversals use explicit work stacks so deeply nested or
//! adversarial inputs cannot blow the call stack.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::cfg::{BlockId, ControlFlowGraph};
use crate::nodes::{Function, Statement, StatementKind};

/// Per-function graph statistics for aggregate reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgStats {
    pub nodes: usize,
    pub edges: usize,
    pub complexity: usize,
}

impl CfgStats {
    pub fn of(cfg: &ControlFlowGraph) -> Self {
        Self {
            nodes: cfg.nodes.len(),
            edges: cfg.edges.len(),
            complexity: cyclomatic_complexity(cfg),
        }
    }
}

/// `edges - nodes + 2`, the single-connected-component form of McCabe's
/// metric. A straight-line function scores 1.
pub fn cyclomatic_complexity(cfg: &ControlFlowGraph) -> usize {
    (cfg.edges.len() + 2).saturating_sub(cfg.nodes.len())
}

/// Strongly connected components of the successor relation, every edge kind
/// treated as traversable. Iterative Tarjan; components come out in
/// completion order, members in stack-pop order.
pub fn strongly_connected_components(cfg: &ControlFlowGraph) -> Vec<Vec<BlockId>> {
    struct Frame {
        node: BlockId,
        next_successor: usize,
    }

    let successors = cfg.successor_map();
    let mut index: BTreeMap<BlockId, usize> = BTreeMap::new();
    let mut lowlink: BTreeMap<BlockId, usize> = BTreeMap::new();
    let mut on_stack: BTreeSet<BlockId> = BTreeSet::new();
    let mut stack: Vec<BlockId> = Vec::new();
    let mut components: Vec<Vec<BlockId>> = Vec::new();
    let mut counter = 0usize;

    for &root in cfg.nodes.keys() {
        if index.contains_key(&root) {
            continue;
        }

        index.insert(root, counter);
        lowlink.insert(root, counter);
        counter += 1;
        stack.push(root);
        on_stack.insert(root);

        let mut frames = vec![Frame {
            node: root,
            next_successor: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            let v = frame.node;
            let succ = successors.get(&v).map(Vec::as_slice).unwrap_or(&[]);

            if frame.next_successor < succ.len() {
                let w = succ[frame.next_successor];
                frame.next_successor += 1;

                if !index.contains_key(&w) {
                    index.insert(w, counter);
                    lowlink.insert(w, counter);
                    counter += 1;
                    stack.push(w);
                    on_stack.insert(w);
                    frames.push(Frame {
                        node: w,
                        next_successor: 0,
                    });
                } else if on_stack.contains(&w) {
                    let candidate = index[&w];
                    let low = lowlink.get_mut(&v).unwrap();
                    *low = (*low).min(candidate);
                }
            } else {
                frames.pop();
                if let Some(parent) = frames.last() {
                    let candidate = lowlink[&v];
                    let low = lowlink.get_mut(&parent.node).unwrap();
                    *low = (*low).min(candidate);
                }
                if lowlink[&v] == index[&v] {
                    let mut component = Vec::new();
                    loop {
                        let w = stack.pop().expect("tarjan stack underflow");
                        on_stack.remove(&w);
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    components.push(component);
                }
            }
        }
    }

    components
}

/// Cycle candidates: components of size > 1, or a single node with an edge
/// to itself.
pub fn detect_cycles(cfg: &ControlFlowGraph) -> Vec<Vec<BlockId>> {
    strongly_connected_components(cfg)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || cfg
                    .edges
                    .iter()
                    .any(|e| e.source == component[0] && e.target == component[0])
        })
        .collect()
}

/// A cycle has an exit iff some member has a successor outside the cycle.
/// No exit means control can never leave the loop.
pub fn cycle_has_exit_condition(cfg: &ControlFlowGraph, cycle: &[BlockId]) -> bool {
    let members: BTreeSet<BlockId> = cycle.iter().copied().collect();
    cfg.edges
        .iter()
        .any(|e| members.contains(&e.source) && !members.contains(&e.target))
}

/// Maximum conditional/loop nesting depth of a function body, computed on
/// the IR tree. Only `if`/`while`/`for` increment the depth; block and
/// try/catch lists are traversed at the same level. No nesting is 0.
pub fn max_nesting_depth(function: &Function) -> usize {
    let mut max_depth = 0usize;
    let mut work: Vec<(&[Statement], usize)> = vec![(function.body.as_slice(), 0)];

    while let Some((statements, depth)) = work.pop() {
        max_depth = max_depth.max(depth);
        for statement in statements {
            match &statement.kind {
                StatementKind::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    work.push((then_block.as_slice(), depth + 1));
                    if let Some(else_block) = else_block {
                        work.push((else_block.as_slice(), depth + 1));
                    }
                }
                StatementKind::While { body, .. } => {
                    work.push((body.as_slice(), depth + 1));
                }
                StatementKind::For { body, .. } => {
                    work.push((body.as_slice(), depth + 1));
                }
                StatementKind::Block(body) => {
                    work.push((body.as_slice(), depth));
                }
                StatementKind::TryCatch { body, catch_block } => {
                    work.push((body.as_slice(), depth));
                    work.push((catch_block.as_slice(), depth));
                }
                _ => {}
            }
        }
    }

    max_depth
}

/// Exit blocks that contain no return statement. Only meaningful for
/// functions with a declared return type; the caller decides that.
pub fn exits_missing_return(cfg: &ControlFlowGraph) -> Vec<BlockId> {
    cfg.exit_nodes
        .iter()
        .filter(|id| cfg.node(**id).map(|n| !n.has_return()).unwrap_or(false))
        .copied()
        .collect()
}
