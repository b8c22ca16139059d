//! Lowering tests against solc-style compact AST JSON.
#![recursion_limit = "256"]

use crossguard_ir::{
    ExpressionKind, SolidityTransformer, SourceLanguage, StatementKind, StatementType, Transformer,
    Visibility,
};
use serde_json::json;

fn vault_source() -> serde_json::Value {
    json!({
        "nodeType": "SourceUnit",
        "nodes": [{
            "nodeType": "ContractDefinition",
            "name": "Vault",
            "contractKind": "contract",
            "abstract": false,
            "baseContracts": [
                {"baseName": {"name": "Ownable"}}
            ],
            "nodes": [
                {
                    "nodeType": "VariableDeclaration",
                    "name": "balances",
                    "visibility": "internal",
                    "typeDescriptions": {"typeString": "mapping(address => uint256)"}
                },
                {
                    "nodeType": "FunctionDefinition",
                    "name": "withdraw",
                    "kind": "function",
                    "visibility": "public",
                    "stateMutability": "nonpayable",
                    "modifiers": [
                        {"modifierName": {"name": "nonReentrant"}}
                    ],
                    "parameters": {"parameters": [
                        {"name": "amount", "typeDescriptions": {"typeString": "uint256"}}
                    ]},
                    "returnParameters": {"parameters": [
                        {"name": "", "typeDescriptions": {"typeString": "bool"}}
                    ]},
                    "body": {"nodeType": "Block", "statements": [
                        {
                            "nodeType": "IfStatement",
                            "condition": {
                                "nodeType": "BinaryOperation",
                                "operator": ">",
                                "leftExpression": {"nodeType": "Identifier", "name": "amount"},
                                "rightExpression": {
                                    "nodeType": "Literal", "kind": "number", "value": "0",
                                    "typeDescriptions": {"typeString": "uint256"}
                                }
                            },
                            "trueBody": {"nodeType": "Block", "statements": [
                                {"nodeType": "ExpressionStatement", "expression": {
                                    "nodeType": "FunctionCall",
                                    "expression": {
                                        "nodeType": "MemberAccess",
                                        "memberName": "transfer",
                                        "expression": {"nodeType": "Identifier", "name": "token"}
                                    },
                                    "arguments": [
                                        {"nodeType": "Identifier", "name": "amount"}
                                    ]
                                }},
                                {"nodeType": "Return", "expression": {
                                    "nodeType": "Literal", "kind": "bool", "value": "true",
                                    "typeDescriptions": {"typeString": "bool"}
                                }}
                            ]}
                        },
                        {"nodeType": "Return", "expression": {
                            "nodeType": "Literal", "kind": "bool", "value": "false",
                            "typeDescriptions": {"typeString": "bool"}
                        }}
                    ]}
                },
                {
                    "nodeType": "FunctionDefinition",
                    "name": "",
                    "kind": "constructor",
                    "visibility": "public",
                    "stateMutability": "nonpayable",
                    "parameters": {"parameters": []},
                    "returnParameters": {"parameters": []},
                    "body": {"nodeType": "Block", "statements": []}
                }
            ]
        }]
    })
}

#[test]
fn lowers_contract_shape() {
    let module = SolidityTransformer.transform(&vault_source(), "vault.sol");

    assert_eq!(module.name, "vault.sol");
    assert_eq!(module.contracts.len(), 1);

    let vault = &module.contracts[0];
    assert_eq!(vault.name, "Vault");
    assert_eq!(vault.inheritance, vec!["Ownable".to_string()]);
    assert_eq!(vault.variables.len(), 1);
    assert!(vault.variables[0].ty.is_mapping);
    assert_eq!(vault.functions.len(), 2);
}

#[test]
fn lowers_function_signature_and_flags() {
    let module = SolidityTransformer.transform(&vault_source(), "vault.sol");
    let vault = &module.contracts[0];

    let withdraw = &vault.functions[0];
    assert_eq!(withdraw.name, "withdraw");
    assert_eq!(withdraw.visibility, Visibility::Public);
    assert_eq!(withdraw.modifiers, vec!["nonReentrant".to_string()]);
    assert_eq!(withdraw.parameters.len(), 1);
    assert_eq!(withdraw.parameters[0].ty.name, "uint256");
    assert_eq!(
        withdraw.return_type.as_ref().map(|t| t.name.as_str()),
        Some("bool")
    );
    assert!(withdraw.is_state_changing());

    let constructor = &vault.functions[1];
    assert!(constructor.is_constructor);
    assert_eq!(constructor.name, "constructor");
}

#[test]
fn lowers_statements_and_expressions() {
    let module = SolidityTransformer.transform(&vault_source(), "vault.sol");
    let withdraw = &module.contracts[0].functions[0];

    assert_eq!(withdraw.body.len(), 2);
    assert_eq!(withdraw.body[0].statement_type(), StatementType::If);

    let StatementKind::If { then_block, else_block, .. } = &withdraw.body[0].kind else {
        panic!("expected if statement");
    };
    assert!(else_block.is_none());
    assert_eq!(then_block.len(), 2);
    assert_eq!(then_block[0].statement_type(), StatementType::FunctionCall);
    assert_eq!(then_block[1].statement_type(), StatementType::Return);

    let StatementKind::Call(call) = &then_block[0].kind else {
        panic!("expected call statement");
    };
    let ExpressionKind::Call {
        function_name,
        is_external,
        target_contract,
        arguments,
    } = &call.kind
    else {
        panic!("expected call expression");
    };
    assert_eq!(function_name, "transfer");
    assert!(*is_external);
    assert_eq!(target_contract.as_deref(), Some("token"));
    assert_eq!(arguments.len(), 1);
}

#[test]
fn bool_literals_are_normalized() {
    let module = SolidityTransformer.transform(&vault_source(), "vault.sol");
    let withdraw = &module.contracts[0].functions[0];

    let StatementKind::Return { value: Some(value) } = &withdraw.body[1].kind else {
        panic!("expected trailing return");
    };
    let ExpressionKind::Literal { value, .. } = &value.kind else {
        panic!("expected literal");
    };
    assert_eq!(value, &serde_json::Value::Bool(false));
}

#[test]
fn unknown_statement_becomes_placeholder() {
    let source = json!({
        "nodes": [{
            "nodeType": "ContractDefinition",
            "name": "Odd",
            "contractKind": "contract",
            "nodes": [{
                "nodeType": "FunctionDefinition",
                "name": "strange",
                "kind": "function",
                "visibility": "public",
                "parameters": {"parameters": []},
                "returnParameters": {"parameters": []},
                "body": {"nodeType": "Block", "statements": [
                    {"nodeType": "InlineAssembly"},
                    {"nodeType": "Return"}
                ]}
            }]
        }]
    });

    let module = SolidityTransformer.transform(&source, "odd.sol");
    let strange = &module.contracts[0].functions[0];
    assert_eq!(strange.body.len(), 2);
    assert_eq!(strange.body[0].statement_type(), StatementType::Block);
    assert_eq!(strange.body[1].statement_type(), StatementType::Return);
}

#[test]
fn transform_is_deterministic() {
    let transformer = SolidityTransformer;
    let first = transformer.transform(&vault_source(), "vault.sol");
    let second = transformer.transform(&vault_source(), "vault.sol");
    assert_eq!(first, second);
}

#[test]
fn node_ids_are_unique_within_a_module() {
    let module = SolidityTransformer.transform(&vault_source(), "vault.sol");

    let mut ids = std::collections::BTreeSet::new();
    let mut stack = vec![crossguard_ir::NodeRef::Module(&module)];
    while let Some(node) = stack.pop() {
        assert!(ids.insert(node.id()), "duplicate id {}", node.id());
        stack.extend(node.children());
    }
    assert!(ids.len() > 10);
}

#[test]
fn placeholder_languages_share_the_contract() {
    assert_eq!(SolidityTransformer.language(), SourceLanguage::Solidity);
    let module = SolidityTransformer.transform(&serde_json::Value::Null, "empty.sol");
    assert!(module.contracts.is_empty());
}
