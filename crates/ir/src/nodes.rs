//! Core node definitions for the unified intermediate representation.
//!
//! Every source language is lowered into the same small set of node kinds so
//! that the CFG builder and the analyzers never need to know which front-end
//! produced a tree. Nodes form a strict ownership tree: a module owns its
//! contracts, a contract its functions, a function its statements, and so on
//! down to expressions. There is no sharing and no back-references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::visitor::IrVisitor;

/// Identifier unique within one IR build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Open-ended per-node annotations attached by transformers and analyzers.
pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Module,
    Contract,
    Function,
    Variable,
    Statement,
    Expression,
    Type,
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Internal,
    External,
    Protected,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Internal => "internal",
            Self::External => "external",
            Self::Protected => "protected",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line_start: usize,
    pub line_end: usize,
    pub column_start: usize,
    pub column_end: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line_start: line,
            line_end: line,
            column_start: 0,
            column_end: 0,
        }
    }

    pub fn with_span(mut self, line_end: usize, column_start: usize, column_end: usize) -> Self {
        self.line_end = line_end;
        self.column_start = column_start;
        self.column_end = column_end;
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line_end != self.line_start {
            write!(f, "{}:{}-{}", self.file, self.line_start, self.line_end)
        } else {
            write!(f, "{}:{}", self.file, self.line_start)
        }
    }
}

/// Structural type descriptor. Self-referential through boxes, so a type is
/// always an ownership tree with no sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrType {
    pub name: String,
    pub is_primitive: bool,
    pub is_array: bool,
    pub array_size: Option<usize>,
    pub element_type: Option<Box<IrType>>,
    pub is_mapping: bool,
    pub key_type: Option<Box<IrType>>,
    pub value_type: Option<Box<IrType>>,
    pub is_struct: bool,
    pub struct_fields: Vec<(String, IrType)>,
    pub is_nullable: bool,
}

impl IrType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_primitive: false,
            is_array: false,
            array_size: None,
            element_type: None,
            is_mapping: false,
            key_type: None,
            value_type: None,
            is_struct: false,
            struct_fields: Vec::new(),
            is_nullable: false,
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        let mut ty = Self::named(name);
        ty.is_primitive = true;
        ty
    }

    pub fn array(element: IrType, size: Option<usize>) -> Self {
        let mut ty = Self::named(match size {
            Some(n) => format!("{}[{n}]", element.name),
            None => format!("{}[]", element.name),
        });
        ty.is_array = true;
        ty.array_size = size;
        ty.element_type = Some(Box::new(element));
        ty
    }

    pub fn mapping(key: IrType, value: IrType) -> Self {
        let mut ty = Self::named(format!("mapping({} => {})", key.name, value.name));
        ty.is_mapping = true;
        ty.key_type = Some(Box::new(key));
        ty.value_type = Some(Box::new(value));
        ty
    }

    pub fn structure(name: impl Into<String>, fields: Vec<(String, IrType)>) -> Self {
        let mut ty = Self::named(name);
        ty.is_struct = true;
        ty.struct_fields = fields;
        ty
    }

    pub fn unknown() -> Self {
        Self::named("unknown")
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            let elem = self
                .element_type
                .as_deref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".into());
            match self.array_size {
                Some(n) => write!(f, "{elem}[{n}]"),
                None => write!(f, "{elem}[]"),
            }
        } else if self.is_mapping {
            let key = self
                .key_type
                .as_deref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".into());
            let value = self
                .value_type
                .as_deref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".into());
            write!(f, "mapping({key} => {value})")
        } else if self.is_struct && !self.struct_fields.is_empty() {
            let fields = self
                .struct_fields
                .iter()
                .map(|(name, ty)| format!("{name}: {ty}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "struct {} {{ {fields} }}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: IrType,
    pub is_mutable: bool,
    pub default_value: Option<Expression>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: IrType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_mutable: false,
            default_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: NodeId,
    pub name: String,
    pub ty: IrType,
    pub visibility: Visibility,
    pub is_mutable: bool,
    pub is_constant: bool,
    pub is_static: bool,
    pub initial_value: Option<Expression>,
    pub location: Option<SourceLocation>,
    pub metadata: Metadata,
}

impl Variable {
    pub fn new(id: NodeId, name: impl Into<String>, ty: IrType) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            visibility: Visibility::Private,
            is_mutable: true,
            is_constant: false,
            is_static: false,
            initial_value: None,
            location: None,
            metadata: Metadata::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Variable
    }

    pub fn accept<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_variable(self);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub id: NodeId,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<IrType>,
    pub visibility: Visibility,
    pub body: Vec<Statement>,
    pub is_constructor: bool,
    pub is_fallback: bool,
    pub is_payable: bool,
    pub is_view: bool,
    pub is_pure: bool,
    pub modifiers: Vec<String>,
    pub location: Option<SourceLocation>,
    pub metadata: Metadata,
}

impl Function {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            visibility: Visibility::Private,
            body: Vec::new(),
            is_constructor: false,
            is_fallback: false,
            is_payable: false,
            is_view: false,
            is_pure: false,
            modifiers: Vec::new(),
            location: None,
            metadata: Metadata::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Function
    }

    /// True when calling this function can change observable state.
    pub fn is_state_changing(&self) -> bool {
        !self.is_view && !self.is_pure
    }

    pub fn accept<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_function(self);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: NodeId,
    pub name: String,
    pub functions: Vec<Function>,
    pub variables: Vec<Variable>,
    pub inheritance: Vec<String>,
    pub interfaces: Vec<String>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub location: Option<SourceLocation>,
    pub metadata: Metadata,
}

impl Contract {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            functions: Vec::new(),
            variables: Vec::new(),
            inheritance: Vec::new(),
            interfaces: Vec::new(),
            is_abstract: false,
            is_interface: false,
            location: None,
            metadata: Metadata::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Contract
    }

    pub fn accept<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_contract(self);
    }
}

/// One module per source file; the module name is the file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: NodeId,
    pub name: String,
    pub contracts: Vec<Contract>,
    pub functions: Vec<Function>,
    pub variables: Vec<Variable>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub location: Option<SourceLocation>,
    pub metadata: Metadata,
}

impl Module {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contracts: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            location: None,
            metadata: Metadata::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Module
    }

    pub fn accept<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_module(self);
    }

    /// All functions in the module, contract members included.
    pub fn all_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions
            .iter()
            .chain(self.contracts.iter().flat_map(|c| c.functions.iter()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    Assignment,
    If,
    While,
    For,
    Return,
    FunctionCall,
    VariableDeclaration,
    Block,
    Break,
    Continue,
    Throw,
    TryCatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: NodeId,
    pub kind: StatementKind,
    pub location: Option<SourceLocation>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    Assignment {
        target: Expression,
        value: Expression,
    },
    If {
        condition: Expression,
        then_block: Vec<Statement>,
        else_block: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    For {
        condition: Option<Expression>,
        body: Vec<Statement>,
    },
    Return {
        value: Option<Expression>,
    },
    Call(Expression),
    VariableDeclaration {
        name: String,
        ty: IrType,
        initializer: Option<Expression>,
    },
    Block(Vec<Statement>),
    Break,
    Continue,
    Throw {
        message: Option<Expression>,
    },
    TryCatch {
        body: Vec<Statement>,
        catch_block: Vec<Statement>,
    },
}

impl Statement {
    pub fn new(id: NodeId, kind: StatementKind) -> Self {
        Self {
            id,
            kind,
            location: None,
            metadata: Metadata::new(),
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Statement
    }

    pub fn statement_type(&self) -> StatementType {
        match &self.kind {
            StatementKind::Assignment { .. } => StatementType::Assignment,
            StatementKind::If { .. } => StatementType::If,
            StatementKind::While { .. } => StatementType::While,
            StatementKind::For { .. } => StatementType::For,
            StatementKind::Return { .. } => StatementType::Return,
            StatementKind::Call(_) => StatementType::FunctionCall,
            StatementKind::VariableDeclaration { .. } => StatementType::VariableDeclaration,
            StatementKind::Block(_) => StatementType::Block,
            StatementKind::Break => StatementType::Break,
            StatementKind::Continue => StatementType::Continue,
            StatementKind::Throw { .. } => StatementType::Throw,
            StatementKind::TryCatch { .. } => StatementType::TryCatch,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StatementKind::Return { .. })
    }

    /// True for statements after which control never reaches the next
    /// statement of the same list.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::Return { .. }
                | StatementKind::Break
                | StatementKind::Continue
                | StatementKind::Throw { .. }
        )
    }

    pub fn accept<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_statement(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionType {
    Literal,
    Identifier,
    BinaryOp,
    UnaryOp,
    FunctionCall,
    MemberAccess,
    ArrayAccess,
    Conditional,
    Cast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: NodeId,
    pub kind: ExpressionKind,
    pub location: Option<SourceLocation>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Literal {
        value: serde_json::Value,
        ty: IrType,
    },
    Identifier {
        name: String,
    },
    Binary {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        operator: String,
        operand: Box<Expression>,
    },
    Call {
        function_name: String,
        arguments: Vec<Expression>,
        is_external: bool,
        target_contract: Option<String>,
    },
    MemberAccess {
        object: Box<Expression>,
        member: String,
    },
    Index {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_value: Box<Expression>,
        else_value: Box<Expression>,
    },
    Cast {
        target_type: IrType,
        operand: Box<Expression>,
    },
}

impl Expression {
    pub fn new(id: NodeId, kind: ExpressionKind) -> Self {
        Self {
            id,
            kind,
            location: None,
            metadata: Metadata::new(),
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Expression
    }

    pub fn expression_type(&self) -> ExpressionType {
        match &self.kind {
            ExpressionKind::Literal { .. } => ExpressionType::Literal,
            ExpressionKind::Identifier { .. } => ExpressionType::Identifier,
            ExpressionKind::Binary { .. } => ExpressionType::BinaryOp,
            ExpressionKind::Unary { .. } => ExpressionType::UnaryOp,
            ExpressionKind::Call { .. } => ExpressionType::FunctionCall,
            ExpressionKind::MemberAccess { .. } => ExpressionType::MemberAccess,
            ExpressionKind::Index { .. } => ExpressionType::ArrayAccess,
            ExpressionKind::Conditional { .. } => ExpressionType::Conditional,
            ExpressionKind::Cast { .. } => ExpressionType::Cast,
        }
    }

    pub fn accept<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_expression(self);
    }
}

/// Borrowed view over any node category, the hook for generic tree walkers
/// that do not care which concrete kind they are looking at.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Module(&'a Module),
    Contract(&'a Contract),
    Function(&'a Function),
    Variable(&'a Variable),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Module(_) => NodeKind::Module,
            Self::Contract(_) => NodeKind::Contract,
            Self::Function(_) => NodeKind::Function,
            Self::Variable(_) => NodeKind::Variable,
            Self::Statement(_) => NodeKind::Statement,
            Self::Expression(_) => NodeKind::Expression,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Self::Module(n) => n.id,
            Self::Contract(n) => n.id,
            Self::Function(n) => n.id,
            Self::Variable(n) => n.id,
            Self::Statement(n) => n.id,
            Self::Expression(n) => n.id,
        }
    }

    pub fn location(&self) -> Option<&'a SourceLocation> {
        match self {
            Self::Module(n) => n.location.as_ref(),
            Self::Contract(n) => n.location.as_ref(),
            Self::Function(n) => n.location.as_ref(),
            Self::Variable(n) => n.location.as_ref(),
            Self::Statement(n) => n.location.as_ref(),
            Self::Expression(n) => n.location.as_ref(),
        }
    }

    /// Immediate owned children in declaration order; empty for leaves.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match self {
            Self::Module(module) => module
                .contracts
                .iter()
                .map(NodeRef::Contract)
                .chain(module.functions.iter().map(NodeRef::Function))
                .chain(module.variables.iter().map(NodeRef::Variable))
                .collect(),
            Self::Contract(contract) => contract
                .functions
                .iter()
                .map(NodeRef::Function)
                .chain(contract.variables.iter().map(NodeRef::Variable))
                .collect(),
            Self::Function(function) => function.body.iter().map(NodeRef::Statement).collect(),
            Self::Variable(variable) => variable
                .initial_value
                .iter()
                .map(NodeRef::Expression)
                .collect(),
            Self::Statement(statement) => statement_children(statement),
            Self::Expression(expression) => expression_children(expression),
        }
    }
}

fn statement_children<'a>(statement: &'a Statement) -> Vec<NodeRef<'a>> {
    let mut children = Vec::new();
    match &statement.kind {
        StatementKind::Assignment { target, value } => {
            children.push(NodeRef::Expression(target));
            children.push(NodeRef::Expression(value));
        }
        StatementKind::If {
            condition,
            then_block,
            else_block,
        } => {
            children.push(NodeRef::Expression(condition));
            children.extend(then_block.iter().map(NodeRef::Statement));
            if let Some(else_block) = else_block {
                children.extend(else_block.iter().map(NodeRef::Statement));
            }
        }
        StatementKind::While { condition, body } => {
            children.push(NodeRef::Expression(condition));
            children.extend(body.iter().map(NodeRef::Statement));
        }
        StatementKind::For { condition, body } => {
            if let Some(condition) = condition {
                children.push(NodeRef::Expression(condition));
            }
            children.extend(body.iter().map(NodeRef::Statement));
        }
        StatementKind::Return { value } => {
            if let Some(value) = value {
                children.push(NodeRef::Expression(value));
            }
        }
        StatementKind::Call(call) => children.push(NodeRef::Expression(call)),
        StatementKind::VariableDeclaration { initializer, .. } => {
            if let Some(initializer) = initializer {
                children.push(NodeRef::Expression(initializer));
            }
        }
        StatementKind::Block(body) => {
            children.extend(body.iter().map(NodeRef::Statement));
        }
        StatementKind::Break | StatementKind::Continue => {}
        StatementKind::Throw { message } => {
            if let Some(message) = message {
                children.push(NodeRef::Expression(message));
            }
        }
        StatementKind::TryCatch { body, catch_block } => {
            children.extend(body.iter().map(NodeRef::Statement));
            children.extend(catch_block.iter().map(NodeRef::Statement));
        }
    }
    children
}

fn expression_children<'a>(expression: &'a Expression) -> Vec<NodeRef<'a>> {
    match &expression.kind {
        ExpressionKind::Literal { .. } | ExpressionKind::Identifier { .. } => Vec::new(),
        ExpressionKind::Binary { left, right, .. } => {
            vec![NodeRef::Expression(left), NodeRef::Expression(right)]
        }
        ExpressionKind::Unary { operand, .. } => vec![NodeRef::Expression(operand)],
        ExpressionKind::Call { arguments, .. } => {
            arguments.iter().map(NodeRef::Expression).collect()
        }
        ExpressionKind::MemberAccess { object, .. } => vec![NodeRef::Expression(object)],
        ExpressionKind::Index { array, index } => {
            vec![NodeRef::Expression(array), NodeRef::Expression(index)]
        }
        ExpressionKind::Conditional {
            condition,
            then_value,
            else_value,
        } => vec![
            NodeRef::Expression(condition),
            NodeRef::Expression(then_value),
            NodeRef::Expression(else_value),
        ],
        ExpressionKind::Cast { operand, .. } => vec![NodeRef::Expression(operand)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_display_matches_source_syntax() {
        let array = IrType::array(IrType::primitive("uint256"), None);
        assert_eq!(array.to_string(), "uint256[]");

        let sized = IrType::array(IrType::primitive("address"), Some(4));
        assert_eq!(sized.to_string(), "address[4]");

        let mapping = IrType::mapping(IrType::primitive("address"), IrType::primitive("uint256"));
        assert_eq!(mapping.to_string(), "mapping(address => uint256)");
    }

    #[test]
    fn node_kind_tag_matches_concrete_type() {
        let module = Module::new(NodeId(1), "a.sol");
        assert_eq!(module.kind(), NodeKind::Module);

        let statement = Statement::new(NodeId(2), StatementKind::Break);
        assert_eq!(statement.kind(), NodeKind::Statement);
        assert_eq!(statement.statement_type(), StatementType::Break);
    }

    #[test]
    fn children_follow_declaration_order() {
        let condition = Expression::new(
            NodeId(1),
            ExpressionKind::Identifier {
                name: "flag".into(),
            },
        );
        let then_stmt = Statement::new(NodeId(2), StatementKind::Return { value: None });
        let if_stmt = Statement::new(
            NodeId(3),
            StatementKind::If {
                condition,
                then_block: vec![then_stmt],
                else_block: None,
            },
        );

        let children = NodeRef::Statement(&if_stmt).children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), NodeKind::Expression);
        assert_eq!(children[1].kind(), NodeKind::Statement);
    }
}
