//! Crossguard IR: language-agnostic intermediate representation and
//! control-flow analysis core.
//!
//! Source front-ends hand this crate a parsed tree; a [`Transformer`] lowers
//! it into the unified node model, [`ControlFlowGraph::build`] turns each
//! function body into a graph of basic blocks, and the [`analysis`] module
//! answers reachability, cycle, and complexity questions over those graphs.
//! Cross-cutting tree checks plug in through [`IrVisitor`].

pub mod analysis;
pub mod builder;
pub mod cfg;
pub mod nodes;
pub mod transform;
pub mod visitor;

pub use analysis::{
    cycle_has_exit_condition, cyclomatic_complexity, detect_cycles, exits_missing_return,
    max_nesting_depth, strongly_connected_components, CfgStats,
};
pub use builder::{IrBuilder, IrStatistics};
pub use cfg::{BlockId, CfgEdge, CfgNode, ControlFlowGraph, EdgeKind};
pub use nodes::{
    Contract, Expression, ExpressionKind, ExpressionType, Function, IrType, Metadata, Module,
    NodeId, NodeKind, NodeRef, Parameter, SourceLocation, Statement, StatementKind, StatementType,
    Variable, Visibility,
};
pub use transform::{
    GoTransformer, RustTransformer, SolidityTransformer, SourceLanguage, Transformer,
};
pub use visitor::IrVisitor;
