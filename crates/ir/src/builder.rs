//! Coordinates per-language lowering and cross-module bookkeeping.
//!
//! The builder owns one transformer per supported language as plain fields;
//! which transformer runs is decided by the `SourceLanguage` argument, never
//! by a process-wide registry.

use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::CfgStats;
use crate::cfg::ControlFlowGraph;
use crate::nodes::{Contract, Function, Module, Variable};
use crate::transform::{
    GoTransformer, RustTransformer, SolidityTransformer, SourceLanguage, Transformer,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IrStatistics {
    pub modules: usize,
    pub contracts: usize,
    pub functions: usize,
    pub variables: usize,
    pub languages: BTreeSet<String>,
}

#[derive(Default)]
pub struct IrBuilder {
    solidity: SolidityTransformer,
    rust: RustTransformer,
    go: GoTransformer,
    modules: BTreeMap<String, Module>,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers one parse tree and registers the resulting module under its
    /// file path. Re-building the same path replaces the previous module.
    pub fn build_from(
        &mut self,
        language: SourceLanguage,
        tree: &serde_json::Value,
        file_path: &str,
    ) -> &Module {
        let module = match language {
            SourceLanguage::Solidity => self.solidity.transform(tree, file_path),
            SourceLanguage::Rust => self.rust.transform(tree, file_path),
            SourceLanguage::Go => self.go.transform(tree, file_path),
        };
        tracing::info!(
            file = file_path,
            %language,
            contracts = module.contracts.len(),
            "built IR module"
        );
        self.modules.insert(file_path.to_string(), module);
        &self.modules[file_path]
    }

    pub fn module(&self, file_path: &str) -> Option<&Module> {
        self.modules.get(file_path)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn into_modules(self) -> Vec<Module> {
        self.modules.into_values().collect()
    }

    pub fn all_contracts(&self) -> impl Iterator<Item = &Contract> {
        self.modules.values().flat_map(|m| m.contracts.iter())
    }

    pub fn all_functions(&self) -> impl Iterator<Item = &Function> {
        self.modules.values().flat_map(|m| m.all_functions())
    }

    pub fn all_variables(&self) -> impl Iterator<Item = &Variable> {
        self.modules.values().flat_map(|m| {
            m.variables
                .iter()
                .chain(m.contracts.iter().flat_map(|c| c.variables.iter()))
        })
    }

    pub fn find_function_by_name(&self, name: &str) -> Vec<&Function> {
        self.all_functions().filter(|f| f.name == name).collect()
    }

    pub fn find_contract_by_name(&self, name: &str) -> Vec<&Contract> {
        self.all_contracts().filter(|c| c.name == name).collect()
    }

    /// One CFG per function across all registered modules, keyed
    /// `path::[Contract::]function`.
    pub fn build_control_flow_graphs(&self) -> BTreeMap<String, ControlFlowGraph> {
        let mut graphs = BTreeMap::new();
        for (path, module) in &self.modules {
            for function in &module.functions {
                graphs.insert(
                    format!("{path}::{}", function.name),
                    ControlFlowGraph::build(function),
                );
            }
            for contract in &module.contracts {
                for function in &contract.functions {
                    graphs.insert(
                        format!("{path}::{}::{}", contract.name, function.name),
                        ControlFlowGraph::build(function),
                    );
                }
            }
        }
        tracing::debug!(count = graphs.len(), "built control flow graphs");
        graphs
    }

    /// Consistency check over everything built so far; returns human-readable
    /// messages rather than failing.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut contract_owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (path, module) in &self.modules {
            for contract in &module.contracts {
                match contract_owners.get(contract.name.as_str()) {
                    Some(existing) => errors.push(format!(
                        "duplicate contract name '{}' found in {path} and {existing}",
                        contract.name
                    )),
                    None => {
                        contract_owners.insert(&contract.name, path);
                    }
                }
            }
        }

        for module in self.modules.values() {
            for contract in &module.contracts {
                if contract.is_interface {
                    continue;
                }
                for function in &contract.functions {
                    if function.body.is_empty() && !function.is_constructor {
                        errors.push(format!(
                            "function '{}' in contract '{}' has no body",
                            function.name, contract.name
                        ));
                    }
                }
            }
        }

        for (key, cfg) in self.build_control_flow_graphs() {
            let unreachable = cfg.unreachable_nodes();
            let with_statements: Vec<_> = unreachable
                .iter()
                .filter(|id| cfg.node(**id).map(|n| !n.statements.is_empty()).unwrap_or(false))
                .collect();
            if !with_statements.is_empty() {
                errors.push(format!(
                    "unreachable code detected in function {key}: {} block(s)",
                    with_statements.len()
                ));
            }
        }

        tracing::info!(errors = errors.len(), "IR validation completed");
        errors
    }

    pub fn statistics(&self) -> IrStatistics {
        let languages = self
            .modules
            .keys()
            .filter_map(|path| SourceLanguage::from_path(path))
            .map(|l| l.to_string())
            .collect();

        IrStatistics {
            modules: self.modules.len(),
            contracts: self.all_contracts().count(),
            functions: self.all_functions().count(),
            variables: self.all_variables().count(),
            languages,
        }
    }

    /// Per-function CFG statistics keyed like `build_control_flow_graphs`.
    pub fn cfg_statistics(&self) -> BTreeMap<String, CfgStats> {
        self.build_control_flow_graphs()
            .iter()
            .map(|(key, cfg)| (key.clone(), CfgStats::of(cfg)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }
}
