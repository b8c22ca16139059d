//! Analysis engine: sequences analyzers over modules and merges findings.
//!
//! The engine is constructed once from a validated configuration and holds
//! its analyzer set explicitly; nothing is registered globally. Work is
//! per-function, so the run can fan out with rayon and a single analyzer
//! blowing up on one function costs exactly one low-severity finding.

use crate::access_control::AccessControlAnalyzer;
use crate::analyzer::{Analyzer, FunctionTarget};
use crate::control_flow::ControlFlowAnalyzer;
use crate::core::{AnalysisConfig, AnalysisContext, Confidence, Finding, Severity};
use crate::dead_code::DeadCodeAnalyzer;
use crate::reachability::ReachabilityAnalyzer;
use anyhow::Result;
use crossguard_ir::{CfgStats, Function, Module, SourceLocation, Visibility};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// The configuration failed validation; no analysis was run.
#[derive(Debug, thiserror::Error)]
#[error("invalid analysis configuration: {}", messages.join("; "))]
pub struct ConfigError {
    pub messages: Vec<String>,
}

pub struct AnalysisEngine {
    config: AnalysisConfig,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalysisEngine {
    /// Validates the configuration and instantiates the enabled analyzers.
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        let messages = config.validate();
        if !messages.is_empty() {
            return Err(ConfigError { messages });
        }

        let mut analyzers: Vec<Box<dyn Analyzer>> = Vec::new();
        for id in config.resolved_analyzers() {
            match id.as_str() {
                "control_flow" => analyzers.push(Box::new(ControlFlowAnalyzer::new())),
                "access_control" => analyzers.push(Box::new(AccessControlAnalyzer::new())),
                "dead_code" => analyzers.push(Box::new(DeadCodeAnalyzer::new())),
                "reachability" => analyzers.push(Box::new(ReachabilityAnalyzer::new())),
                other => {
                    // Validation guarantees this is unreachable for known
                    // modes; custom sets were checked against the same list.
                    tracing::warn!(analyzer = other, "skipping unknown analyzer id");
                }
            }
        }

        Ok(Self { config, analyzers })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyzer_ids(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.id()).collect()
    }

    /// Runs every enabled analyzer over every function of every module and
    /// merges the results into one ordered report.
    pub fn analyze_modules(&self, modules: &[Module]) -> AnalysisReport {
        let started = Instant::now();
        let deadline = self.config.max_analysis_time_secs.map(Duration::from_secs);
        let deadline_hit = AtomicBool::new(false);

        let ctx = AnalysisContext::new(self.config.clone());
        let targets = collect_targets(modules);
        tracing::info!(
            modules = modules.len(),
            functions = targets.len(),
            analyzers = self.analyzers.len(),
            "starting analysis run"
        );

        let analyze_one = |target: &FunctionTarget<'_>| -> Vec<Finding> {
            // Cooperative cancellation between functions; never inside the
            // graph algorithms themselves.
            if let Some(budget) = deadline {
                if started.elapsed() > budget {
                    deadline_hit.store(true, Ordering::Relaxed);
                    return Vec::new();
                }
            }
            let mut findings = Vec::new();
            for analyzer in &self.analyzers {
                match analyzer.analyze_function(target, &ctx) {
                    Ok(batch) => findings.extend(batch),
                    Err(error) => {
                        tracing::warn!(
                            analyzer = analyzer.id(),
                            function = %target.qualified_name(),
                            %error,
                            "analyzer failed, continuing with next function"
                        );
                        findings.push(analysis_error_finding(analyzer.id(), target, &error));
                    }
                }
            }
            findings
        };

        let mut findings: Vec<Finding> = if self.config.parallel {
            targets.par_iter().map(analyze_one).flatten().collect()
        } else {
            targets.iter().flat_map(analyze_one).collect()
        };

        if self.config.cross_language {
            findings.extend(cross_module_checks(modules));
        }

        let findings = merge_findings(findings);

        let mut warnings = Vec::new();
        if deadline_hit.load(Ordering::Relaxed) {
            warnings.push(format!(
                "analysis time budget of {}s exceeded; remaining functions were skipped",
                self.config.max_analysis_time_secs.unwrap_or_default()
            ));
        }

        let statistics = build_statistics(modules, &targets, &findings, &ctx);
        tracing::info!(
            findings = findings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis run complete"
        );

        AnalysisReport {
            findings,
            statistics,
            warnings,
        }
    }
}

fn collect_targets(modules: &[Module]) -> Vec<FunctionTarget<'_>> {
    let mut targets = Vec::new();
    for module in modules {
        for function in &module.functions {
            targets.push(FunctionTarget {
                module,
                contract: None,
                function,
            });
        }
        for contract in &module.contracts {
            for function in &contract.functions {
                targets.push(FunctionTarget {
                    module,
                    contract: Some(contract),
                    function,
                });
            }
        }
    }
    targets
}

fn analysis_error_finding(
    analyzer_id: &str,
    target: &FunctionTarget<'_>,
    error: &anyhow::Error,
) -> Finding {
    Finding::new(
        format!("analysis_error_{analyzer_id}_{}", target.qualified_name()),
        "Analysis Error",
        format!(
            "Analyzer {analyzer_id} failed on function {}: {error}",
            target.function.name
        ),
        Severity::Low,
        target.location(),
    )
    .with_category("analysis_error")
    .with_analyzer(analyzer_id)
    .with_confidence(Confidence::High)
}

/// Cross-module interface check: public functions sharing a
/// `Contract::function` key must agree on arity, positional parameter type
/// names, and return type presence/name. Type names compare literally; no
/// unification across language type systems is attempted.
fn cross_module_checks(modules: &[Module]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen: BTreeMap<String, &Function> = BTreeMap::new();
    let mut reported: BTreeSet<String> = BTreeSet::new();

    for module in modules {
        for contract in &module.contracts {
            for function in &contract.functions {
                if function.visibility != Visibility::Public {
                    continue;
                }
                let key = format!("{}::{}", contract.name, function.name);
                match seen.get(key.as_str()) {
                    None => {
                        seen.insert(key, function);
                    }
                    Some(existing) => {
                        if functions_compatible(existing, function) || !reported.insert(key.clone())
                        {
                            continue;
                        }
                        let location = function
                            .location
                            .clone()
                            .unwrap_or_else(|| SourceLocation::new(module.name.clone(), 0));
                        findings.push(
                            Finding::new(
                                format!("interface_mismatch_{key}"),
                                "Interface Mismatch",
                                format!(
                                    "Function {key} has incompatible signatures across modules"
                                ),
                                Severity::High,
                                location,
                            )
                            .with_category("interface_consistency")
                            .with_analyzer("cross_module")
                            .with_confidence(Confidence::High),
                        );
                    }
                }
            }
        }
    }

    findings
}

fn functions_compatible(a: &Function, b: &Function) -> bool {
    if a.parameters.len() != b.parameters.len() {
        return false;
    }
    for (pa, pb) in a.parameters.iter().zip(&b.parameters) {
        if pa.ty.name != pb.ty.name {
            return false;
        }
    }
    match (&a.return_type, &b.return_type) {
        (Some(ta), Some(tb)) => ta.name == tb.name,
        (None, None) => true,
        _ => false,
    }
}

/// Dedup by finding id (higher severity wins a collision), then order by
/// severity rank and title. The sort is stable, so equal keys keep their
/// discovery order.
fn merge_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut unique: BTreeMap<String, Finding> = BTreeMap::new();
    for finding in findings {
        match unique.get(&finding.id) {
            Some(existing) if existing.severity >= finding.severity => {}
            _ => {
                unique.insert(finding.id.clone(), finding);
            }
        }
    }

    let mut merged: Vec<Finding> = unique.into_values().collect();
    merged.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| a.title.cmp(&b.title))
    });
    merged
}

fn build_statistics(
    modules: &[Module],
    targets: &[FunctionTarget<'_>],
    findings: &[Finding],
    ctx: &AnalysisContext,
) -> ReportStatistics {
    let per_function: BTreeMap<String, CfgStats> = targets
        .iter()
        .map(|t| {
            let qualified = t.qualified_name();
            let cfg = ctx.cfg(&qualified, t.function);
            (qualified, CfgStats::of(&cfg))
        })
        .collect();

    let mut by_severity = SeverityCount::default();
    for finding in findings {
        match finding.severity {
            Severity::Critical => by_severity.critical += 1,
            Severity::High => by_severity.high += 1,
            Severity::Medium => by_severity.medium += 1,
            Severity::Low => by_severity.low += 1,
            Severity::Info => by_severity.info += 1,
        }
    }

    ReportStatistics {
        total_modules: modules.len(),
        total_contracts: modules.iter().map(|m| m.contracts.len()).sum(),
        total_functions: targets.len(),
        total_findings: findings.len(),
        by_severity,
        per_function,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_modules: usize,
    pub total_contracts: usize,
    pub total_functions: usize,
    pub total_findings: usize,
    pub by_severity: SeverityCount,
    pub per_function: BTreeMap<String, CfgStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub findings: Vec<Finding>,
    pub statistics: ReportStatistics,
    pub warnings: Vec<String>,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: &str, title: &str, severity: Severity) -> Finding {
        Finding::new(id, title, "d", severity, SourceLocation::new("a.sol", 1))
    }

    #[test]
    fn dedup_keeps_higher_severity() {
        let merged = merge_findings(vec![
            finding("x", "Same Issue", Severity::Low),
            finding("x", "Same Issue", Severity::High),
            finding("y", "Other", Severity::Medium),
        ]);

        assert_eq!(merged.len(), 2);
        let x = merged.iter().find(|f| f.id == "x").unwrap();
        assert_eq!(x.severity, Severity::High);
    }

    #[test]
    fn ordering_is_severity_rank_then_title() {
        let merged = merge_findings(vec![
            finding("a", "Zed Problem", Severity::Low),
            finding("b", "Alpha Problem", Severity::Low),
            finding("c", "Anything", Severity::Critical),
        ]);

        assert_eq!(merged[0].severity, Severity::Critical);
        assert_eq!(merged[1].title, "Alpha Problem");
        assert_eq!(merged[2].title, "Zed Problem");
    }

    #[test]
    fn invalid_config_is_rejected_before_analysis() {
        let config = AnalysisConfig {
            complexity_threshold: 0,
            ..AnalysisConfig::default()
        };
        let error = AnalysisEngine::new(config).err().expect("must fail");
        assert!(error.messages[0].contains("complexity_threshold"));
    }

    #[test]
    fn incompatible_signatures_are_detected() {
        use crossguard_ir::{IrType, Parameter};

        let mut a = Function::new(crossguard_ir::NodeId(1), "transfer");
        a.parameters = vec![Parameter::new("to", IrType::primitive("address"))];
        let mut b = a.clone();
        b.parameters
            .push(Parameter::new("amount", IrType::primitive("uint256")));
        assert!(!functions_compatible(&a, &b));

        let mut c = a.clone();
        c.return_type = Some(IrType::primitive("bool"));
        assert!(!functions_compatible(&a, &c));

        assert!(functions_compatible(&a, &a.clone()));
    }
}
