//! Control-flow analyzer: everything that falls out of a function's CFG.
//!
//! Detects unreachable blocks, loops with no way out, return-less exit
//! paths, and complexity/nesting threshold breaches. All graph questions go
//! through the shared CFG cache so other analyzers see the same graph.

use crate::analyzer::{Analyzer, FunctionTarget};
use crate::core::{AnalysisContext, Confidence, Finding, Severity};
use anyhow::Result;
use crossguard_ir::analysis::{
    cycle_has_exit_condition, cyclomatic_complexity, detect_cycles, exits_missing_return,
    max_nesting_depth,
};
use crossguard_ir::StatementKind;

#[derive(Debug, Default)]
pub struct ControlFlowAnalyzer;

impl ControlFlowAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for ControlFlowAnalyzer {
    fn id(&self) -> &'static str {
        "control_flow"
    }

    fn name(&self) -> &'static str {
        "Control Flow Analyzer"
    }

    fn description(&self) -> &'static str {
        "Detects unreachable code, potential infinite loops, missing returns, \
         and overly complex control flow"
    }

    fn analyze_function(
        &self,
        target: &FunctionTarget<'_>,
        ctx: &AnalysisContext,
    ) -> Result<Vec<Finding>> {
        let function = target.function;
        let qualified = target.qualified_name();
        let cfg = ctx.cfg(&qualified, function);
        let location = target.location();

        let mut findings = Vec::new();

        for block in cfg.unreachable_nodes() {
            let has_statements = cfg
                .node(block)
                .map(|n| !n.statements.is_empty())
                .unwrap_or(false);
            if !has_statements {
                continue;
            }
            findings.push(
                Finding::new(
                    format!("unreachable_code_{}_{block}", function.name),
                    "Unreachable Code",
                    format!(
                        "Code block in function {} is unreachable",
                        function.name
                    ),
                    Severity::Medium,
                    location.clone(),
                )
                .with_category("dead_code")
                .with_analyzer(self.id())
                .with_confidence(Confidence::High),
            );
        }

        for cycle in detect_cycles(&cfg) {
            if cycle_has_exit_condition(&cfg, &cycle) {
                continue;
            }
            let anchor = cycle.iter().min().copied().unwrap_or(cfg.entry);
            findings.push(
                Finding::new(
                    format!("infinite_loop_{}_{anchor}", function.name),
                    "Potential Infinite Loop",
                    format!(
                        "Function {} contains a loop with no reachable exit condition",
                        function.name
                    ),
                    Severity::High,
                    location.clone(),
                )
                .with_category("infinite_loop")
                .with_analyzer(self.id())
                .with_confidence(Confidence::Medium)
                .with_recommendation(
                    "Ensure the loop condition can become false or add a break statement",
                ),
            );
        }

        if function.return_type.is_some() {
            for block in exits_missing_return(&cfg) {
                findings.push(
                    Finding::new(
                        format!("missing_return_{}_{block}", function.name),
                        "Missing Return Statement",
                        format!(
                            "Function {} has an execution path without a return statement",
                            function.name
                        ),
                        Severity::Medium,
                        location.clone(),
                    )
                    .with_category("missing_return")
                    .with_analyzer(self.id())
                    .with_confidence(Confidence::High),
                );
            }
        }

        let complexity = cyclomatic_complexity(&cfg);
        if complexity > ctx.config().complexity_threshold {
            findings.push(
                Finding::new(
                    format!("high_complexity_{}", function.name),
                    "High Cyclomatic Complexity",
                    format!(
                        "Function {} has high cyclomatic complexity ({complexity})",
                        function.name
                    ),
                    Severity::Low,
                    location.clone(),
                )
                .with_category("code_quality")
                .with_analyzer(self.id())
                .with_confidence(Confidence::High),
            );
        }

        let nesting = max_nesting_depth(function);
        if nesting > ctx.config().nesting_threshold {
            findings.push(
                Finding::new(
                    format!("deep_nesting_{}", function.name),
                    "Deep Nesting",
                    format!(
                        "Function {} has deep nesting level ({nesting})",
                        function.name
                    ),
                    Severity::Low,
                    location.clone(),
                )
                .with_category("code_quality")
                .with_analyzer(self.id())
                .with_confidence(Confidence::High),
            );
        }

        for node in cfg.nodes.values() {
            let mut seen_return = false;
            for statement in &node.statements {
                if seen_return {
                    findings.push(
                        Finding::new(
                            format!("dead_code_after_return_{}_{}", function.name, node.id),
                            "Dead Code After Return",
                            format!(
                                "Code after return statement in function {}",
                                function.name
                            ),
                            Severity::Low,
                            location.clone(),
                        )
                        .with_category("dead_code")
                        .with_analyzer(self.id())
                        .with_confidence(Confidence::High),
                    );
                    break;
                }
                if matches!(statement.kind, StatementKind::Return { .. }) {
                    seen_return = true;
                }
            }
        }

        Ok(findings)
    }
}
