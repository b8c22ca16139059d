//! Function-level reachability: private functions nothing ever calls.
//!
//! The set of called names is collected once per module with a visitor and
//! cached in the analysis context, so checking each function is a set
//! lookup. Cross-module callers are invisible here, which keeps the
//! confidence low.

use crate::analyzer::{Analyzer, FunctionTarget};
use crate::core::{AnalysisContext, Confidence, Finding, Severity};
use anyhow::Result;
use crossguard_ir::visitor::walk_expression;
use crossguard_ir::{Expression, ExpressionKind, IrVisitor, Module, Visibility};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ReachabilityAnalyzer;

impl ReachabilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn called_names(&self, module: &Module, ctx: &AnalysisContext) -> Arc<BTreeSet<String>> {
        ctx.get_or_compute(&format!("calls::{}", module.name), || {
            let mut collector = CallNameCollector::default();
            module.accept(&mut collector);
            Ok(collector.names)
        })
        .expect("call collection is infallible")
    }
}

impl Analyzer for ReachabilityAnalyzer {
    fn id(&self) -> &'static str {
        "reachability"
    }

    fn name(&self) -> &'static str {
        "Function Reachability Analyzer"
    }

    fn description(&self) -> &'static str {
        "Reports private functions that are never called within their module"
    }

    fn analyze_function(
        &self,
        target: &FunctionTarget<'_>,
        ctx: &AnalysisContext,
    ) -> Result<Vec<Finding>> {
        let function = target.function;
        if function.visibility != Visibility::Private || function.is_constructor {
            return Ok(Vec::new());
        }

        let called = self.called_names(target.module, ctx);
        if called.contains(&function.name) {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            format!("unused_function_{}", function.name),
            "Unused Private Function",
            format!("Private function {} is never called", function.name),
            Severity::Low,
            target.location(),
        )
        .with_category("dead_code")
        .with_analyzer(self.id())
        .with_confidence(Confidence::Low)])
    }
}

#[derive(Default)]
struct CallNameCollector {
    names: BTreeSet<String>,
}

impl IrVisitor for CallNameCollector {
    fn visit_expression(&mut self, expression: &Expression) {
        if let ExpressionKind::Call { function_name, .. } = &expression.kind {
            self.names.insert(function_name.clone());
        }
        walk_expression(self, expression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AnalysisConfig;
    use crossguard_ir::{Contract, Function, NodeId, Statement, StatementKind};

    fn call(name: &str) -> Statement {
        Statement::new(
            NodeId(0),
            StatementKind::Call(Expression::new(
                NodeId(0),
                ExpressionKind::Call {
                    function_name: name.into(),
                    arguments: vec![],
                    is_external: false,
                    target_contract: None,
                },
            )),
        )
    }

    #[test]
    fn called_private_function_is_not_flagged() {
        let mut helper = Function::new(NodeId(1), "helper");
        helper.visibility = Visibility::Private;

        let mut orphan = Function::new(NodeId(2), "orphan");
        orphan.visibility = Visibility::Private;

        let mut public_entry = Function::new(NodeId(3), "entry");
        public_entry.visibility = Visibility::Public;
        public_entry.body.push(call("helper"));

        let mut contract = Contract::new(NodeId(4), "Vault");
        contract.functions = vec![helper, orphan, public_entry];
        let mut module = Module::new(NodeId(5), "vault.sol");
        module.contracts.push(contract);

        let ctx = AnalysisContext::new(AnalysisConfig::default());
        let analyzer = ReachabilityAnalyzer::new();

        let contract = &module.contracts[0];
        let target_helper = FunctionTarget {
            module: &module,
            contract: Some(contract),
            function: &contract.functions[0],
        };
        let target_orphan = FunctionTarget {
            module: &module,
            contract: Some(contract),
            function: &contract.functions[1],
        };

        assert!(analyzer
            .analyze_function(&target_helper, &ctx)
            .unwrap()
            .is_empty());
        assert_eq!(analyzer.analyze_function(&target_orphan, &ctx).unwrap().len(), 1);
    }
}
