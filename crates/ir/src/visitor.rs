//! Visitor dispatch over the IR tree.
//!
//! Six callbacks, one per node category. Container callbacks default to
//! recursing into owned children in declaration order via the `walk_*`
//! functions, so a concrete visitor overrides only the callbacks it cares
//! about and inherits full-tree traversal for the rest.

use crate::nodes::{
    Contract, Expression, ExpressionKind, Function, Module, Statement, StatementKind, Variable,
};

pub trait IrVisitor {
    fn visit_module(&mut self, module: &Module) {
        walk_module(self, module);
    }

    fn visit_contract(&mut self, contract: &Contract) {
        walk_contract(self, contract);
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_variable(&mut self, variable: &Variable) {
        walk_variable(self, variable);
    }

    fn visit_statement(&mut self, statement: &Statement) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &Expression) {
        walk_expression(self, expression);
    }
}

pub fn walk_module<V: IrVisitor + ?Sized>(visitor: &mut V, module: &Module) {
    for contract in &module.contracts {
        visitor.visit_contract(contract);
    }
    for function in &module.functions {
        visitor.visit_function(function);
    }
    for variable in &module.variables {
        visitor.visit_variable(variable);
    }
}

pub fn walk_contract<V: IrVisitor + ?Sized>(visitor: &mut V, contract: &Contract) {
    for function in &contract.functions {
        visitor.visit_function(function);
    }
    for variable in &contract.variables {
        visitor.visit_variable(variable);
    }
}

pub fn walk_function<V: IrVisitor + ?Sized>(visitor: &mut V, function: &Function) {
    for parameter in &function.parameters {
        if let Some(default) = &parameter.default_value {
            visitor.visit_expression(default);
        }
    }
    for statement in &function.body {
        visitor.visit_statement(statement);
    }
}

pub fn walk_variable<V: IrVisitor + ?Sized>(visitor: &mut V, variable: &Variable) {
    if let Some(initial) = &variable.initial_value {
        visitor.visit_expression(initial);
    }
}

pub fn walk_statement<V: IrVisitor + ?Sized>(visitor: &mut V, statement: &Statement) {
    match &statement.kind {
        StatementKind::Assignment { target, value } => {
            visitor.visit_expression(target);
            visitor.visit_expression(value);
        }
        StatementKind::If {
            condition,
            then_block,
            else_block,
        } => {
            visitor.visit_expression(condition);
            for stmt in then_block {
                visitor.visit_statement(stmt);
            }
            if let Some(else_block) = else_block {
                for stmt in else_block {
                    visitor.visit_statement(stmt);
                }
            }
        }
        StatementKind::While { condition, body } => {
            visitor.visit_expression(condition);
            for stmt in body {
                visitor.visit_statement(stmt);
            }
        }
        StatementKind::For { condition, body } => {
            if let Some(condition) = condition {
                visitor.visit_expression(condition);
            }
            for stmt in body {
                visitor.visit_statement(stmt);
            }
        }
        StatementKind::Return { value } => {
            if let Some(value) = value {
                visitor.visit_expression(value);
            }
        }
        StatementKind::Call(call) => visitor.visit_expression(call),
        StatementKind::VariableDeclaration { initializer, .. } => {
            if let Some(initializer) = initializer {
                visitor.visit_expression(initializer);
            }
        }
        StatementKind::Block(body) => {
            for stmt in body {
                visitor.visit_statement(stmt);
            }
        }
        StatementKind::Break | StatementKind::Continue => {}
        StatementKind::Throw { message } => {
            if let Some(message) = message {
                visitor.visit_expression(message);
            }
        }
        StatementKind::TryCatch { body, catch_block } => {
            for stmt in body {
                visitor.visit_statement(stmt);
            }
            for stmt in catch_block {
                visitor.visit_statement(stmt);
            }
        }
    }
}

pub fn walk_expression<V: IrVisitor + ?Sized>(visitor: &mut V, expression: &Expression) {
    match &expression.kind {
        ExpressionKind::Literal { .. } | ExpressionKind::Identifier { .. } => {}
        ExpressionKind::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExpressionKind::Unary { operand, .. } => visitor.visit_expression(operand),
        ExpressionKind::Call { arguments, .. } => {
            for argument in arguments {
                visitor.visit_expression(argument);
            }
        }
        ExpressionKind::MemberAccess { object, .. } => visitor.visit_expression(object),
        ExpressionKind::Index { array, index } => {
            visitor.visit_expression(array);
            visitor.visit_expression(index);
        }
        ExpressionKind::Conditional {
            condition,
            then_value,
            else_value,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(then_value);
            visitor.visit_expression(else_value);
        }
        ExpressionKind::Cast { operand, .. } => visitor.visit_expression(operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{NodeId, StatementKind};

    #[derive(Default)]
    struct CallCollector {
        names: Vec<String>,
    }

    impl IrVisitor for CallCollector {
        fn visit_expression(&mut self, expression: &Expression) {
            if let ExpressionKind::Call { function_name, .. } = &expression.kind {
                self.names.push(function_name.clone());
            }
            walk_expression(self, expression);
        }
    }

    #[test]
    fn default_traversal_reaches_nested_calls() {
        let inner = Expression::new(
            NodeId(1),
            ExpressionKind::Call {
                function_name: "transfer".into(),
                arguments: vec![],
                is_external: true,
                target_contract: None,
            },
        );
        let outer = Expression::new(
            NodeId(2),
            ExpressionKind::Call {
                function_name: "require".into(),
                arguments: vec![inner],
                is_external: false,
                target_contract: None,
            },
        );
        let stmt = Statement::new(NodeId(3), StatementKind::Call(outer));
        let mut function = Function::new(NodeId(4), "withdraw");
        function.body.push(stmt);

        let mut collector = CallCollector::default();
        function.accept(&mut collector);

        assert_eq!(collector.names, vec!["require", "transfer"]);
    }
}
