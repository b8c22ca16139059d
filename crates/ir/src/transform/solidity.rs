//! Solidity front-end lowering, the reference `Transformer` implementation.
//!
//! Consumes the compact AST JSON emitted by solc (`--ast-compact-json`).
//! Every accessor is defensive: a missing or oddly shaped field degrades to
//! a placeholder node, never to a panic or an error.

use serde_json::Value;

use super::{IdAllocator, SourceLanguage, Transformer};
use crate::nodes::{
    Contract, Expression, ExpressionKind, Function, IrType, Module, Parameter, SourceLocation,
    Statement, StatementKind, Variable, Visibility,
};

/// Stand-in for absent AST fields; lowering it yields a placeholder node.
static NULL: Value = Value::Null;

/// Recursion ceiling for statement/expression lowering. Trees nested past
/// this degrade to placeholder nodes instead of exhausting the call stack.
const MAX_LOWERING_DEPTH: usize = 256;

#[derive(Debug, Default)]
pub struct SolidityTransformer;

impl Transformer for SolidityTransformer {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Solidity
    }

    fn transform(&self, tree: &Value, file_path: &str) -> Module {
        let mut cx = Lowering {
            ids: IdAllocator::new(),
            file: file_path.to_string(),
            depth: 0,
        };

        let mut module = Module::new(cx.ids.next(), file_path);

        for node in child_nodes(tree) {
            match node_type(node) {
                "ContractDefinition" => module.contracts.push(cx.lower_contract(node)),
                "FunctionDefinition" => module.functions.push(cx.lower_function(node)),
                "VariableDeclaration" => module.variables.push(cx.lower_variable(node)),
                "ImportDirective" => {
                    if let Some(path) = node
                        .get("absolutePath")
                        .or_else(|| node.get("file"))
                        .and_then(Value::as_str)
                    {
                        module.imports.push(path.to_string());
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            file = file_path,
            contracts = module.contracts.len(),
            "lowered solidity source unit"
        );
        module
    }
}

struct Lowering {
    ids: IdAllocator,
    file: String,
    depth: usize,
}

impl Lowering {
    fn location(&self, node: &Value) -> Option<SourceLocation> {
        // solc encodes "src" as start:length:file; the first segment stands
        // in for the line field, since the compact AST has no line table.
        let src = node.get("src")?.as_str()?;
        let start = src.split(':').next()?.parse::<usize>().ok()?;
        Some(SourceLocation::new(self.file.clone(), start))
    }

    fn lower_contract(&mut self, node: &Value) -> Contract {
        let mut contract = Contract::new(self.ids.next(), str_field(node, "name", "unknown"));
        contract.location = self.location(node);
        contract.is_interface = str_field(node, "contractKind", "contract") == "interface";
        contract.is_abstract = node
            .get("abstract")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        for base in node
            .get("baseContracts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
        {
            if let Some(name) = base
                .get("baseName")
                .and_then(|b| b.get("name"))
                .and_then(Value::as_str)
            {
                contract.inheritance.push(name.to_string());
            }
        }

        for member in child_nodes(node) {
            match node_type(member) {
                "FunctionDefinition" => contract.functions.push(self.lower_function(member)),
                "VariableDeclaration" => contract.variables.push(self.lower_variable(member)),
                _ => {}
            }
        }

        contract
    }

    fn lower_function(&mut self, node: &Value) -> Function {
        let kind = str_field(node, "kind", "function");
        let name = match str_field(node, "name", "") {
            "" if kind == "constructor" => "constructor".to_string(),
            "" if kind == "fallback" => "fallback".to_string(),
            "" if kind == "receive" => "receive".to_string(),
            "" => "unknown".to_string(),
            other => other.to_string(),
        };

        let mut function = Function::new(self.ids.next(), name);
        function.location = self.location(node);
        function.visibility = visibility(node);
        function.is_constructor = kind == "constructor";
        function.is_fallback = kind == "fallback" || kind == "receive";

        let mutability = str_field(node, "stateMutability", "");
        function.is_payable = mutability.contains("payable");
        function.is_view = mutability == "view";
        function.is_pure = mutability == "pure";

        for param in parameter_nodes(node, "parameters") {
            function.parameters.push(self.lower_parameter(param));
        }
        function.return_type = parameter_nodes(node, "returnParameters")
            .first()
            .map(|p| self.lower_type(p));

        for invocation in node
            .get("modifiers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
        {
            let name = invocation
                .get("modifierName")
                .and_then(|m| m.get("name"))
                .and_then(Value::as_str)
                .or_else(|| invocation.get("name").and_then(Value::as_str));
            if let Some(name) = name {
                function.modifiers.push(name.to_string());
            }
        }

        if let Some(body) = node.get("body") {
            function.body = self.lower_block(body);
        }

        function
    }

    fn lower_parameter(&mut self, node: &Value) -> Parameter {
        let mut parameter = Parameter::new(str_field(node, "name", ""), self.lower_type(node));
        parameter.is_mutable = str_field(node, "storageLocation", "") == "storage";
        parameter
    }

    fn lower_variable(&mut self, node: &Value) -> Variable {
        let ty = self.lower_type(node);
        let mut variable = Variable::new(self.ids.next(), str_field(node, "name", "unknown"), ty);
        variable.location = self.location(node);
        variable.visibility = visibility(node);
        variable.is_constant = node
            .get("constant")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        variable.is_mutable = !variable.is_constant;
        variable.initial_value = node.get("value").map(|v| self.lower_expression(v));
        variable
    }

    fn lower_type(&mut self, node: &Value) -> IrType {
        let type_string = node
            .get("typeDescriptions")
            .and_then(|d| d.get("typeString"))
            .and_then(Value::as_str)
            .or_else(|| {
                node.get("typeName")
                    .and_then(|t| t.get("name"))
                    .and_then(Value::as_str)
            })
            .unwrap_or("unknown");
        parse_type_string(type_string)
    }

    /// Statement lists may arrive as a `Block`, as a bare statement (single
    /// branch bodies), or as garbage; all three shapes are accepted.
    fn lower_block(&mut self, node: &Value) -> Vec<Statement> {
        match node_type(node) {
            "Block" | "UncheckedBlock" => node
                .get("statements")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[])
                .iter()
                .map(|s| self.lower_statement(s))
                .collect(),
            "" => Vec::new(),
            _ => vec![self.lower_statement(node)],
        }
    }

    fn lower_statement(&mut self, node: &Value) -> Statement {
        if self.depth >= MAX_LOWERING_DEPTH {
            return Statement::new(self.ids.next(), StatementKind::Block(Vec::new()));
        }
        self.depth += 1;
        let statement = self.lower_statement_inner(node);
        self.depth -= 1;
        statement
    }

    fn lower_statement_inner(&mut self, node: &Value) -> Statement {
        let id = self.ids.next();
        let location = self.location(node);

        let kind = match node_type(node) {
            "ExpressionStatement" => {
                let inner = node.get("expression").unwrap_or(&NULL);
                match node_type(inner) {
                    "Assignment" => StatementKind::Assignment {
                        target: self.lower_expression(inner.get("leftHandSide").unwrap_or(&NULL)),
                        value: self.lower_expression(inner.get("rightHandSide").unwrap_or(&NULL)),
                    },
                    "FunctionCall" => StatementKind::Call(self.lower_expression(inner)),
                    _ => StatementKind::Block(Vec::new()),
                }
            }
            "VariableDeclarationStatement" => {
                let declaration = node
                    .get("declarations")
                    .and_then(Value::as_array)
                    .and_then(|d| d.iter().find(|v| !v.is_null()));
                StatementKind::VariableDeclaration {
                    name: declaration
                        .map(|d| str_field(d, "name", "unknown").to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    ty: declaration
                        .map(|d| self.lower_type(d))
                        .unwrap_or_else(IrType::unknown),
                    initializer: node.get("initialValue").map(|v| self.lower_expression(v)),
                }
            }
            "IfStatement" => StatementKind::If {
                condition: self.lower_expression(node.get("condition").unwrap_or(&NULL)),
                then_block: self.lower_block(node.get("trueBody").unwrap_or(&NULL)),
                else_block: node.get("falseBody").filter(|b| !b.is_null()).map(|b| self.lower_block(b)),
            },
            "WhileStatement" | "DoWhileStatement" => StatementKind::While {
                condition: self.lower_expression(node.get("condition").unwrap_or(&NULL)),
                body: self.lower_block(node.get("body").unwrap_or(&NULL)),
            },
            "ForStatement" => StatementKind::For {
                condition: node
                    .get("condition")
                    .filter(|c| !c.is_null())
                    .map(|c| self.lower_expression(c)),
                body: self.lower_block(node.get("body").unwrap_or(&NULL)),
            },
            "Return" => StatementKind::Return {
                value: node
                    .get("expression")
                    .filter(|e| !e.is_null())
                    .map(|e| self.lower_expression(e)),
            },
            "Break" => StatementKind::Break,
            "Continue" => StatementKind::Continue,
            "Throw" => StatementKind::Throw { message: None },
            "RevertStatement" => StatementKind::Throw {
                message: node.get("errorCall").map(|c| self.lower_expression(c)),
            },
            "EmitStatement" => StatementKind::Call(
                self.lower_expression(node.get("eventCall").unwrap_or(&NULL)),
            ),
            "TryStatement" => {
                let clauses = node
                    .get("clauses")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let body = clauses
                    .first()
                    .and_then(|c| c.get("block"))
                    .map(|b| self.lower_block(b))
                    .unwrap_or_default();
                let catch_block = clauses
                    .iter()
                    .skip(1)
                    .filter_map(|c| c.get("block"))
                    .flat_map(|b| self.lower_block(b))
                    .collect();
                StatementKind::TryCatch { body, catch_block }
            }
            "Block" | "UncheckedBlock" => StatementKind::Block(self.lower_block(node)),
            // PlaceholderStatement, inline assembly, and anything newer than
            // this front-end: keep the slot, drop the semantics.
            _ => StatementKind::Block(Vec::new()),
        };

        let mut statement = Statement::new(id, kind);
        statement.location = location;
        statement
    }

    fn lower_expression(&mut self, node: &Value) -> Expression {
        if self.depth >= MAX_LOWERING_DEPTH {
            return self.placeholder_expression();
        }
        self.depth += 1;
        let expression = self.lower_expression_inner(node);
        self.depth -= 1;
        expression
    }

    fn lower_expression_inner(&mut self, node: &Value) -> Expression {
        let id = self.ids.next();
        let location = self.location(node);

        let kind = match node_type(node) {
            "Literal" => {
                let value = match (str_field(node, "kind", ""), node.get("value")) {
                    ("bool", Some(Value::String(s))) => Value::Bool(s == "true"),
                    (_, Some(v)) if !v.is_null() => v.clone(),
                    _ => node.get("hexValue").cloned().unwrap_or(Value::Null),
                };
                ExpressionKind::Literal {
                    value,
                    ty: self.lower_type(node),
                }
            }
            "Identifier" => ExpressionKind::Identifier {
                name: str_field(node, "name", "unknown").to_string(),
            },
            "BinaryOperation" => ExpressionKind::Binary {
                operator: str_field(node, "operator", "?").to_string(),
                left: Box::new(
                    self.lower_expression(node.get("leftExpression").unwrap_or(&NULL)),
                ),
                right: Box::new(
                    self.lower_expression(node.get("rightExpression").unwrap_or(&NULL)),
                ),
            },
            "Assignment" => ExpressionKind::Binary {
                operator: str_field(node, "operator", "=").to_string(),
                left: Box::new(
                    self.lower_expression(node.get("leftHandSide").unwrap_or(&NULL)),
                ),
                right: Box::new(
                    self.lower_expression(node.get("rightHandSide").unwrap_or(&NULL)),
                ),
            },
            "UnaryOperation" => ExpressionKind::Unary {
                operator: str_field(node, "operator", "?").to_string(),
                operand: Box::new(
                    self.lower_expression(node.get("subExpression").unwrap_or(&NULL)),
                ),
            },
            "FunctionCall" => self.lower_call(node),
            "FunctionCallOptions" => {
                // `f{value: v}(..)`: the options wrapper carries no control
                // flow of its own.
                return self.lower_expression(node.get("expression").unwrap_or(&NULL));
            }
            "MemberAccess" => ExpressionKind::MemberAccess {
                object: Box::new(
                    self.lower_expression(node.get("expression").unwrap_or(&NULL)),
                ),
                member: str_field(node, "memberName", "unknown").to_string(),
            },
            "IndexAccess" => ExpressionKind::Index {
                array: Box::new(
                    self.lower_expression(node.get("baseExpression").unwrap_or(&NULL)),
                ),
                index: Box::new(
                    self.lower_expression(node.get("indexExpression").unwrap_or(&NULL)),
                ),
            },
            "Conditional" => ExpressionKind::Conditional {
                condition: Box::new(
                    self.lower_expression(node.get("condition").unwrap_or(&NULL)),
                ),
                then_value: Box::new(
                    self.lower_expression(node.get("trueExpression").unwrap_or(&NULL)),
                ),
                else_value: Box::new(
                    self.lower_expression(node.get("falseExpression").unwrap_or(&NULL)),
                ),
            },
            "TupleExpression" => {
                let components = node
                    .get("components")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                match components {
                    [single] if !single.is_null() => {
                        return self.lower_expression(single);
                    }
                    _ => ExpressionKind::Identifier {
                        name: "unknown".to_string(),
                    },
                }
            }
            _ => ExpressionKind::Identifier {
                name: "unknown".to_string(),
            },
        };

        let mut expression = Expression::new(id, kind);
        expression.location = location;
        expression
    }

    fn lower_call(&mut self, node: &Value) -> ExpressionKind {
        let callee = node.get("expression").unwrap_or(&NULL);
        let arguments: Vec<Expression> = node
            .get("arguments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|a| self.lower_expression(a))
            .collect();

        if str_field(node, "kind", "") == "typeConversion" {
            let target = callee
                .get("typeName")
                .and_then(|t| t.get("name"))
                .and_then(Value::as_str)
                .or_else(|| callee.get("name").and_then(Value::as_str))
                .unwrap_or("unknown");
            let operand = arguments
                .into_iter()
                .next()
                .unwrap_or_else(|| self.placeholder_expression());
            return ExpressionKind::Cast {
                target_type: parse_type_string(target),
                operand: Box::new(operand),
            };
        }

        // Walk through call options to the real callee.
        let callee = if node_type(callee) == "FunctionCallOptions" {
            callee.get("expression").unwrap_or(&NULL)
        } else {
            callee
        };

        match node_type(callee) {
            "Identifier" => ExpressionKind::Call {
                function_name: str_field(callee, "name", "unknown").to_string(),
                arguments,
                is_external: false,
                target_contract: None,
            },
            "MemberAccess" => {
                let object = callee.get("expression").unwrap_or(&NULL);
                let object_name = str_field(object, "name", "");
                let is_self = object_name.is_empty() || object_name == "this";
                ExpressionKind::Call {
                    function_name: str_field(callee, "memberName", "unknown").to_string(),
                    arguments,
                    is_external: !is_self,
                    target_contract: (!is_self).then(|| object_name.to_string()),
                }
            }
            _ => ExpressionKind::Call {
                function_name: "unknown".to_string(),
                arguments,
                is_external: false,
                target_contract: None,
            },
        }
    }

    fn placeholder_expression(&mut self) -> Expression {
        Expression::new(
            self.ids.next(),
            ExpressionKind::Identifier {
                name: "unknown".to_string(),
            },
        )
    }
}

fn node_type(node: &Value) -> &str {
    node.get("nodeType").and_then(Value::as_str).unwrap_or("")
}

fn str_field<'a>(node: &'a Value, field: &str, default: &'a str) -> &'a str {
    node.get(field).and_then(Value::as_str).unwrap_or(default)
}

fn child_nodes(node: &Value) -> &[Value] {
    node.get("nodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn parameter_nodes<'a>(node: &'a Value, field: &str) -> Vec<&'a Value> {
    node.get(field)
        .and_then(|p| p.get("parameters"))
        .and_then(Value::as_array)
        .map(|v| v.iter().collect())
        .unwrap_or_default()
}

/// Parses a solc type string into a structural type. Storage-location
/// suffixes are noise; everything unrecognized keeps its name and is flagged
/// as a struct, matching the upstream mapping.
fn parse_type_string(raw: &str) -> IrType {
    let s = raw
        .trim()
        .trim_end_matches(" memory")
        .trim_end_matches(" storage pointer")
        .trim_end_matches(" storage ref")
        .trim_end_matches(" storage")
        .trim_end_matches(" calldata")
        .trim();

    if s.is_empty() || s == "unknown" {
        return IrType::unknown();
    }

    if let Some(inner) = s.strip_prefix("mapping(").and_then(|r| r.strip_suffix(')')) {
        if let Some((key, value)) = split_mapping(inner) {
            return IrType::mapping(parse_type_string(key), parse_type_string(value));
        }
        let mut ty = IrType::named(s);
        ty.is_mapping = true;
        return ty;
    }

    if let Some(prefix) = s.strip_suffix("[]") {
        return IrType::array(parse_type_string(prefix), None);
    }
    if s.ends_with(']') {
        if let Some(open) = s.rfind('[') {
            if let Ok(size) = s[open + 1..s.len() - 1].parse::<usize>() {
                return IrType::array(parse_type_string(&s[..open]), Some(size));
            }
        }
    }

    let is_primitive = s == "bool"
        || s == "address"
        || s == "address payable"
        || s == "string"
        || s == "bytes"
        || s.starts_with("uint")
        || s.starts_with("int")
        || (s.starts_with("bytes") && s[5..].parse::<u8>().is_ok())
        || s.starts_with("fixed")
        || s.starts_with("ufixed");
    if is_primitive {
        return IrType::primitive(s);
    }

    if let Some(name) = s.strip_prefix("struct ") {
        let mut ty = IrType::named(name);
        ty.is_struct = true;
        return ty;
    }
    if let Some(name) = s.strip_prefix("contract ").or_else(|| s.strip_prefix("enum ")) {
        return IrType::named(name);
    }

    let mut ty = IrType::named(s);
    ty.is_struct = true;
    ty
}

/// Splits `K => V` at the top parenthesis level, for nested mappings.
fn split_mapping(inner: &str) -> Option<(&str, &str)> {
    let bytes = inner.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 && bytes.get(i + 1) == Some(&b'>') => {
                return Some((inner[..i].trim(), inner[i + 2..].trim()));
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn visibility(node: &Value) -> Visibility {
    match str_field(node, "visibility", "") {
        "public" => Visibility::Public,
        "external" => Visibility::External,
        "internal" => Visibility::Internal,
        _ => Visibility::Private,
    }
}
