//! Analysis configuration: which analyzers run, with which thresholds.
//!
//! Built once and handed to the engine at construction; there is no
//! process-wide registry to mutate. Validation is separate from execution
//! so a bad configuration is reported before any analysis starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Analyzer ids accepted in `enabled_analyzers`.
pub const KNOWN_ANALYZERS: &[&str] = &[
    "control_flow",
    "access_control",
    "dead_code",
    "reachability",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Quick feedback: the cheap tree-level checks only.
    Fast,
    /// Good coverage without the long tail.
    Standard,
    /// Everything.
    Deep,
    /// Exactly the analyzers named in `enabled_analyzers`.
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    pub enabled_analyzers: BTreeSet<String>,
    pub complexity_threshold: usize,
    pub nesting_threshold: usize,
    pub max_analysis_time_secs: Option<u64>,
    pub cross_language: bool,
    pub parallel: bool,
    pub max_cache_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Standard,
            enabled_analyzers: BTreeSet::new(),
            complexity_threshold: 15,
            nesting_threshold: 6,
            max_analysis_time_secs: Some(300),
            cross_language: true,
            parallel: true,
            max_cache_size: 256,
        }
    }
}

impl AnalysisConfig {
    /// Fast mode, 60 second budget.
    pub fn quick_scan() -> Self {
        Self {
            mode: AnalysisMode::Fast,
            max_analysis_time_secs: Some(60),
            ..Self::default()
        }
    }

    /// Everything on, generous budget.
    pub fn security_audit() -> Self {
        Self {
            mode: AnalysisMode::Deep,
            max_analysis_time_secs: Some(600),
            ..Self::default()
        }
    }

    pub fn ci_integration() -> Self {
        Self {
            max_analysis_time_secs: Some(180),
            ..Self::default()
        }
    }

    pub fn development() -> Self {
        Self {
            max_analysis_time_secs: Some(120),
            cross_language: false,
            ..Self::default()
        }
    }

    /// The analyzer ids the configured mode resolves to.
    pub fn resolved_analyzers(&self) -> BTreeSet<String> {
        let ids: &[&str] = match self.mode {
            AnalysisMode::Fast => &["access_control", "dead_code"],
            AnalysisMode::Standard => &["control_flow", "access_control", "dead_code"],
            AnalysisMode::Deep => KNOWN_ANALYZERS,
            AnalysisMode::Custom => return self.enabled_analyzers.clone(),
        };
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// Human-readable configuration problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for id in &self.enabled_analyzers {
            if !KNOWN_ANALYZERS.contains(&id.as_str()) {
                errors.push(format!("unknown analyzer '{id}'"));
            }
        }
        if self.mode == AnalysisMode::Custom && self.enabled_analyzers.is_empty() {
            errors.push("custom mode requires at least one enabled analyzer".to_string());
        }
        if self.complexity_threshold == 0 {
            errors.push("complexity_threshold must be positive".to_string());
        }
        if self.nesting_threshold == 0 {
            errors.push("nesting_threshold must be positive".to_string());
        }
        if self.max_analysis_time_secs == Some(0) {
            errors.push("max_analysis_time_secs must be positive".to_string());
        }
        if self.max_cache_size == 0 {
            errors.push("max_cache_size must be positive".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_empty());
    }

    #[test]
    fn unknown_analyzer_is_reported() {
        let mut config = AnalysisConfig::default();
        config.mode = AnalysisMode::Custom;
        config.enabled_analyzers.insert("quantum_oracle".to_string());

        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("quantum_oracle"));
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        let config = AnalysisConfig {
            complexity_threshold: 0,
            nesting_threshold: 0,
            max_analysis_time_secs: Some(0),
            ..AnalysisConfig::default()
        };
        assert_eq!(config.validate().len(), 3);
    }

    #[test]
    fn deep_mode_resolves_every_analyzer() {
        let config = AnalysisConfig::security_audit();
        assert_eq!(config.resolved_analyzers().len(), KNOWN_ANALYZERS.len());
    }
}
