//! Access control analyzer over the IR.
//!
//! Flags public state-changing functions that carry no modifier recognized
//! as an authorization gate. The signal is a name heuristic over the
//! function's modifier list; it under- and over-approximates real
//! authorization logic and is scored accordingly.

use crate::analyzer::{Analyzer, FunctionTarget};
use crate::core::{AnalysisContext, Confidence, Finding, Severity};
use anyhow::Result;
use crossguard_ir::Visibility;

/// Modifier-name fragments treated as authorization markers.
const ACCESS_CONTROL_KEYWORDS: &[&str] = &[
    "only",
    "require",
    "owner",
    "admin",
    "auth",
    "permission",
    "role",
];

/// True when a modifier name looks like an access-control gate.
pub fn is_access_control_modifier(name: &str) -> bool {
    let lowered = name.to_lowercase();
    ACCESS_CONTROL_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[derive(Debug, Default)]
pub struct AccessControlAnalyzer;

impl AccessControlAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AccessControlAnalyzer {
    fn id(&self) -> &'static str {
        "access_control"
    }

    fn name(&self) -> &'static str {
        "Access Control Analyzer"
    }

    fn description(&self) -> &'static str {
        "Flags public state-changing functions without an access-control modifier"
    }

    fn analyze_function(
        &self,
        target: &FunctionTarget<'_>,
        _ctx: &AnalysisContext,
    ) -> Result<Vec<Finding>> {
        let function = target.function;

        let is_entry_point = matches!(
            function.visibility,
            Visibility::Public | Visibility::External
        );
        if !is_entry_point
            || function.is_constructor
            || function.is_fallback
            || !function.is_state_changing()
        {
            return Ok(Vec::new());
        }

        if function.modifiers.iter().any(|m| is_access_control_modifier(m)) {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            format!("missing_access_control_{}", function.name),
            "Missing Access Control",
            format!(
                "Public function {} lacks access control modifiers",
                function.name
            ),
            Severity::Medium,
            target.location(),
        )
        .with_category("access_control")
        .with_analyzer(self.id())
        .with_confidence(Confidence::Medium)
        .with_recommendation(
            "Restrict the function with an authorization modifier or an explicit caller check",
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_heuristic_matches_common_modifiers() {
        assert!(is_access_control_modifier("onlyOwner"));
        assert!(is_access_control_modifier("requireAdmin"));
        assert!(is_access_control_modifier("hasRole"));
        assert!(is_access_control_modifier("authorized"));
        assert!(!is_access_control_modifier("nonReentrant"));
        assert!(!is_access_control_modifier("whenNotPaused"));
    }
}
