//! Analyzer trait and the per-function unit of work.
//!
//! Analyzers are independent and stateless, so the engine can run them over
//! functions in any order or in parallel. An analyzer failing on one
//! function never takes down the run: the engine turns the error into a
//! low-severity finding and moves on.

use crate::core::{AnalysisContext, Finding};
use anyhow::Result;
use crossguard_ir::{Contract, Function, Module, SourceLocation};

/// One function under analysis, with enough surrounding context to name and
/// locate it.
#[derive(Clone, Copy)]
pub struct FunctionTarget<'a> {
    pub module: &'a Module,
    pub contract: Option<&'a Contract>,
    pub function: &'a Function,
}

impl<'a> FunctionTarget<'a> {
    pub fn qualified_name(&self) -> String {
        match self.contract {
            Some(contract) => format!(
                "{}::{}::{}",
                self.module.name, contract.name, self.function.name
            ),
            None => format!("{}::{}", self.module.name, self.function.name),
        }
    }

    /// Function location, falling back to the start of the module's file.
    pub fn location(&self) -> SourceLocation {
        self.function
            .location
            .clone()
            .unwrap_or_else(|| SourceLocation::new(self.module.name.clone(), 0))
    }
}

pub trait Analyzer: Send + Sync {
    /// Stable id, matching the names accepted in the configuration.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn analyze_function(
        &self,
        target: &FunctionTarget<'_>,
        ctx: &AnalysisContext,
    ) -> Result<Vec<Finding>>;
}
