//! Core abstractions for the analyzer framework.
//!
//! The building blocks every analyzer works with: the finding model handed
//! to reporters, severity and confidence scales, the run configuration with
//! its validation, and the shared analysis context that caches computed
//! artifacts across analyzers.

pub mod config;
pub mod context;
pub mod finding;
pub mod severity;

pub use config::{AnalysisConfig, AnalysisMode, KNOWN_ANALYZERS};
pub use context::{AnalysisCache, AnalysisContext};
pub use finding::{stable_id, Finding};
pub use severity::{Confidence, Severity};
