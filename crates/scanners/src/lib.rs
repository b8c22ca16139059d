//! Crossguard Scanners - analyzers and orchestration over the unified IR.
//!
//! Analyzers implement a common trait and run per function with no shared
//! mutable state, so the engine can execute them sequentially or in
//! parallel and merge their findings into one ordered, deduplicated report.
//! Which analyzers run is decided by an explicit, validated configuration
//! handed to the engine at construction time.

pub mod analyzer;
pub mod core;
pub mod engine;

pub mod access_control;
pub mod control_flow;
pub mod dead_code;
pub mod reachability;

pub use crate::core::{
    AnalysisCache, AnalysisConfig, AnalysisContext, AnalysisMode, Confidence, Finding, Severity,
    KNOWN_ANALYZERS,
};

pub use analyzer::{Analyzer, FunctionTarget};
pub use engine::{AnalysisEngine, AnalysisReport, ConfigError, ReportStatistics, SeverityCount};

pub use access_control::{is_access_control_modifier, AccessControlAnalyzer};
pub use control_flow::ControlFlowAnalyzer;
pub use dead_code::DeadCodeAnalyzer;
pub use reachability::ReachabilityAnalyzer;
