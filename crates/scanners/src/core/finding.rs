//! The finding model handed to reporting collaborators.

use crate::core::{Confidence, Severity};
use crossguard_ir::SourceLocation;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// A single reported issue. The id is the deduplication key: two findings
/// with the same id describe the same issue, and the higher-severity one
/// wins the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,

    pub title: String,

    pub description: String,

    pub severity: Severity,

    pub location: SourceLocation,

    /// Free-form vulnerability/category tag, e.g. `dead_code`.
    pub category: String,

    /// Name of the analysis that produced this finding.
    pub analyzer: String,

    /// 0.0–1.0.
    pub confidence: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub references: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Finding {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        location: SourceLocation,
    ) -> Self {
        let mut finding = Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            severity,
            location,
            category: "unknown".to_string(),
            analyzer: "unknown".to_string(),
            confidence: 1.0,
            recommendation: None,
            references: Vec::new(),
            metadata: BTreeMap::new(),
        };
        if finding.id.is_empty() {
            finding.id = stable_id(&finding.title, &finding.location, &finding.category);
        }
        finding
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = analyzer.into();
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence.to_score();
        self
    }

    pub fn with_confidence_score(mut self, score: f64) -> Self {
        self.confidence = score.clamp(0.0, 1.0);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Deterministic fallback id for findings constructed without one.
pub fn stable_id(title: &str, location: &SourceLocation, category: &str) -> String {
    let mut hasher = DefaultHasher::new();
    title.hash(&mut hasher);
    location.file.hash(&mut hasher);
    location.line_start.hash(&mut hasher);
    category.hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_gets_stable_fallback() {
        let location = SourceLocation::new("a.sol", 3);
        let first = Finding::new("", "Thing", "d", Severity::Low, location.clone());
        let second = Finding::new("", "Thing", "d", Severity::Low, location);
        assert!(!first.id.is_empty());
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn confidence_score_is_clamped() {
        let finding = Finding::new(
            "x",
            "t",
            "d",
            Severity::Info,
            SourceLocation::new("a.sol", 1),
        )
        .with_confidence_score(2.0);
        assert_eq!(finding.confidence, 1.0);
    }
}
