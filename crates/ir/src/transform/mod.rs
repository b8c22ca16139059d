//! Language-specific transformers lowering parsed source trees into IR.
//!
//! A transformer is pure and total: whatever the front-end hands it, it
//! returns a best-effort module. Unknown constructs become placeholder
//! nodes rather than errors, because downstream analyses must keep going on
//! partial input; compilation problems are the front-end's to report.

mod solidity;

pub use solidity::SolidityTransformer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::nodes::{Module, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Solidity,
    Rust,
    Go,
}

impl SourceLanguage {
    /// Sniffs the language from a file extension; `None` for anything the
    /// front-ends do not cover.
    pub fn from_path(path: &str) -> Option<Self> {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("sol") => Some(Self::Solidity),
            Some("rs") => Some(Self::Rust),
            Some("go") => Some(Self::Go),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Solidity => "solidity",
            Self::Rust => "rust",
            Self::Go => "go",
        };
        write!(f, "{s}")
    }
}

/// Maps one source file's parse tree to one IR module.
///
/// Implementations must be pure (no state carried between calls) and must
/// not fail: a malformed or partially-compiled tree still yields a module,
/// possibly with zero contracts.
pub trait Transformer: Send + Sync {
    fn language(&self) -> SourceLanguage;

    fn transform(&self, tree: &serde_json::Value, file_path: &str) -> Module;
}

/// Issues node ids unique within one transform invocation.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Rust front-end lowering is not implemented yet; the transformer honors
/// the contract by returning an empty module for any input.
#[derive(Debug, Default)]
pub struct RustTransformer;

impl Transformer for RustTransformer {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Rust
    }

    fn transform(&self, _tree: &serde_json::Value, file_path: &str) -> Module {
        tracing::debug!(file = file_path, "rust lowering not implemented, emitting empty module");
        let mut ids = IdAllocator::new();
        Module::new(ids.next(), file_path)
    }
}

/// Go front-end lowering is not implemented yet; same contract as above.
#[derive(Debug, Default)]
pub struct GoTransformer;

impl Transformer for GoTransformer {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Go
    }

    fn transform(&self, _tree: &serde_json::Value, file_path: &str) -> Module {
        tracing::debug!(file = file_path, "go lowering not implemented, emitting empty module");
        let mut ids = IdAllocator::new();
        Module::new(ids.next(), file_path)
    }
}
