//! Tree-level dead-code analyzer.
//!
//! Walks every statement list in a function via the visitor contract and
//! reports statements that follow a terminator (return/break/continue/
//! throw) in the same list. This complements the CFG-side check, which only
//! sees dead statements sharing a basic block.

use crate::analyzer::{Analyzer, FunctionTarget};
use crate::core::{AnalysisContext, Confidence, Finding, Severity};
use anyhow::Result;
use crossguard_ir::visitor::walk_statement;
use crossguard_ir::{IrVisitor, NodeId, SourceLocation, Statement, StatementKind};

#[derive(Debug, Default)]
pub struct DeadCodeAnalyzer;

impl DeadCodeAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for DeadCodeAnalyzer {
    fn id(&self) -> &'static str {
        "dead_code"
    }

    fn name(&self) -> &'static str {
        "Dead Code Analyzer"
    }

    fn description(&self) -> &'static str {
        "Reports statements that can never execute because an earlier \
         statement in the same block always transfers control away"
    }

    fn analyze_function(
        &self,
        target: &FunctionTarget<'_>,
        _ctx: &AnalysisContext,
    ) -> Result<Vec<Finding>> {
        let mut collector = DeadStatementCollector::default();
        collector.check_list(&target.function.body);
        for statement in &target.function.body {
            collector.visit_statement(statement);
        }

        let findings = collector
            .dead
            .into_iter()
            .map(|(id, location)| {
                Finding::new(
                    format!("dead_code_{}_{id}", target.function.name),
                    "Unreachable Statement",
                    format!(
                        "Statement in function {} follows an unconditional exit and never runs",
                        target.function.name
                    ),
                    Severity::Low,
                    location.unwrap_or_else(|| target.location()),
                )
                .with_category("dead_code")
                .with_analyzer(self.id())
                .with_confidence(Confidence::High)
            })
            .collect();

        Ok(findings)
    }
}

/// Records the first dead statement of each list it visits.
#[derive(Default)]
struct DeadStatementCollector {
    dead: Vec<(NodeId, Option<SourceLocation>)>,
}

impl DeadStatementCollector {
    fn check_list(&mut self, statements: &[Statement]) {
        let Some(cut) = statements.iter().position(Statement::is_terminator) else {
            return;
        };
        if let Some(first_dead) = statements.get(cut + 1) {
            self.dead.push((first_dead.id, first_dead.location.clone()));
        }
    }
}

impl IrVisitor for DeadStatementCollector {
    fn visit_statement(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::If {
                then_block,
                else_block,
                ..
            } => {
                self.check_list(then_block);
                if let Some(else_block) = else_block {
                    self.check_list(else_block);
                }
            }
            StatementKind::While { body, .. } | StatementKind::For { body, .. } => {
                self.check_list(body);
            }
            StatementKind::Block(body) => self.check_list(body),
            StatementKind::TryCatch { body, catch_block } => {
                self.check_list(body);
                self.check_list(catch_block);
            }
            _ => {}
        }
        walk_statement(self, statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossguard_ir::{Expression, ExpressionKind};

    fn ident(name: &str) -> Expression {
        Expression::new(NodeId(0), ExpressionKind::Identifier { name: name.into() })
    }

    #[test]
    fn statement_after_break_in_loop_body_is_dead() {
        let body = vec![
            Statement::new(NodeId(1), StatementKind::Break),
            Statement::new(
                NodeId(2),
                StatementKind::Assignment {
                    target: ident("x"),
                    value: ident("y"),
                },
            ),
        ];
        let loop_stmt = Statement::new(
            NodeId(3),
            StatementKind::While {
                condition: ident("going"),
                body,
            },
        );

        let mut collector = DeadStatementCollector::default();
        collector.visit_statement(&loop_stmt);

        assert_eq!(collector.dead.len(), 1);
        assert_eq!(collector.dead[0].0, NodeId(2));
    }
}
