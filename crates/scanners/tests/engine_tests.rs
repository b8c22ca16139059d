//! Engine-level scenarios: findings produced end to end over built IR.

use crossguard_ir::{
    Contract, Expression, ExpressionKind, Function, IrType, Module, NodeId, Parameter,
    SourceLocation, Statement, StatementKind, Visibility,
};
use crossguard_scanners::{AnalysisConfig, AnalysisEngine, AnalysisMode};

fn ident(name: &str) -> Expression {
    Expression::new(NodeId(0), ExpressionKind::Identifier { name: name.into() })
}

fn bool_literal(value: bool) -> Expression {
    Expression::new(
        NodeId(0),
        ExpressionKind::Literal {
            value: serde_json::Value::Bool(value),
            ty: IrType::primitive("bool"),
        },
    )
}

fn assign(name: &str) -> Statement {
    Statement::new(
        NodeId(0),
        StatementKind::Assignment {
            target: ident(name),
            value: ident("v"),
        },
    )
}

fn ret() -> Statement {
    Statement::new(NodeId(0), StatementKind::Return { value: None })
}

fn module_with(functions: Vec<Function>, path: &str) -> Module {
    let mut contract = Contract::new(NodeId(100), "Token");
    contract.functions = functions;
    let mut module = Module::new(NodeId(101), path);
    module.location = Some(SourceLocation::new(path, 1));
    module.contracts.push(contract);
    module
}

fn sequential_engine(mode: AnalysisMode) -> AnalysisEngine {
    let config = AnalysisConfig {
        mode,
        parallel: false,
        ..AnalysisConfig::default()
    };
    AnalysisEngine::new(config).unwrap()
}

#[test]
fn infinite_loop_is_reported_high() {
    let mut spin = Function::new(NodeId(1), "spin");
    spin.visibility = Visibility::Public;
    spin.body = vec![Statement::new(
        NodeId(2),
        StatementKind::While {
            condition: bool_literal(true),
            body: vec![assign("x")],
        },
    )];

    let module = module_with(vec![spin], "spin.sol");
    let engine = sequential_engine(AnalysisMode::Standard);
    let report = engine.analyze_modules(&[module]);

    let finding = report
        .findings
        .iter()
        .find(|f| f.category == "infinite_loop")
        .expect("infinite loop finding");
    assert_eq!(finding.severity, crossguard_scanners::Severity::High);
    assert!(finding.id.starts_with("infinite_loop_spin"));
}

#[test]
fn bounded_loop_is_not_an_infinite_loop() {
    let mut count = Function::new(NodeId(1), "count");
    count.body = vec![Statement::new(
        NodeId(2),
        StatementKind::While {
            condition: ident("going"),
            body: vec![assign("i")],
        },
    )];

    let module = module_with(vec![count], "count.sol");
    let engine = sequential_engine(AnalysisMode::Standard);
    let report = engine.analyze_modules(&[module]);

    assert!(report.findings.iter().all(|f| f.category != "infinite_loop"));
}

#[test]
fn code_after_return_is_dead_but_function_is_not() {
    let mut f = Function::new(NodeId(1), "trailing");
    f.body = vec![ret(), assign("dead")];

    let module = module_with(vec![f], "trailing.sol");
    let engine = sequential_engine(AnalysisMode::Standard);
    let report = engine.analyze_modules(&[module]);

    assert!(
        report
            .findings
            .iter()
            .any(|f| f.id.starts_with("dead_code_after_return_trailing")),
        "CFG-side dead code detection fires"
    );
    assert!(
        report
            .findings
            .iter()
            .any(|f| f.id.starts_with("dead_code_trailing")),
        "tree-side dead code detection fires"
    );
    assert!(
        report
            .findings
            .iter()
            .all(|f| !f.id.starts_with("unreachable_code_trailing")),
        "the function itself is not unreachable"
    );
}

#[test]
fn cross_module_mismatch_reported_exactly_once() {
    let mut a = Function::new(NodeId(1), "transfer");
    a.visibility = Visibility::Public;
    a.parameters = vec![Parameter::new("to", IrType::primitive("address"))];
    a.body = vec![ret()];

    let mut b = Function::new(NodeId(2), "transfer");
    b.visibility = Visibility::Public;
    b.parameters = vec![
        Parameter::new("to", IrType::primitive("address")),
        Parameter::new("amount", IrType::primitive("uint256")),
    ];
    b.body = vec![ret()];

    let modules = vec![
        module_with(vec![a], "token_sol.sol"),
        module_with(vec![b], "token_go.go"),
    ];

    let engine = sequential_engine(AnalysisMode::Fast);
    let report = engine.analyze_modules(&modules);

    let mismatches: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == "interface_consistency")
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].id, "interface_mismatch_Token::transfer");
}

#[test]
fn matching_interfaces_raise_nothing() {
    let make = |id| {
        let mut f = Function::new(NodeId(id), "transfer");
        f.visibility = Visibility::Public;
        f.parameters = vec![Parameter::new("to", IrType::primitive("address"))];
        f.body = vec![ret()];
        f
    };

    let modules = vec![
        module_with(vec![make(1)], "a.sol"),
        module_with(vec![make(2)], "b.go"),
    ];
    let engine = sequential_engine(AnalysisMode::Fast);
    let report = engine.analyze_modules(&modules);
    assert!(report
        .findings
        .iter()
        .all(|f| f.category != "interface_consistency"));
}

#[test]
fn missing_access_control_on_public_mutator() {
    let mut set_owner = Function::new(NodeId(1), "setOwner");
    set_owner.visibility = Visibility::Public;
    set_owner.body = vec![assign("owner")];

    let mut guarded = Function::new(NodeId(2), "setFee");
    guarded.visibility = Visibility::Public;
    guarded.modifiers = vec!["onlyOwner".to_string()];
    guarded.body = vec![assign("fee")];

    let mut viewer = Function::new(NodeId(3), "getOwner");
    viewer.visibility = Visibility::Public;
    viewer.is_view = true;
    viewer.body = vec![ret()];

    let module = module_with(vec![set_owner, guarded, viewer], "owned.sol");
    let engine = sequential_engine(AnalysisMode::Fast);
    let report = engine.analyze_modules(&[module]);

    let access: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == "access_control")
        .collect();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].id, "missing_access_control_setOwner");
}

#[test]
fn missing_return_flagged_only_with_declared_return_type() {
    let mut typed = Function::new(NodeId(1), "typed");
    typed.return_type = Some(IrType::primitive("uint256"));
    typed.body = vec![assign("x")];

    let mut untyped = Function::new(NodeId(2), "untyped");
    untyped.body = vec![assign("x")];

    let module = module_with(vec![typed, untyped], "returns.sol");
    let engine = sequential_engine(AnalysisMode::Standard);
    let report = engine.analyze_modules(&[module]);

    assert!(report
        .findings
        .iter()
        .any(|f| f.id.starts_with("missing_return_typed")));
    assert!(report
        .findings
        .iter()
        .all(|f| !f.id.starts_with("missing_return_untyped")));
}

#[test]
fn complexity_threshold_is_configurable() {
    // Three chained ifs: complexity 4.
    let nested_if = |id: u32| {
        Statement::new(
            NodeId(id),
            StatementKind::If {
                condition: ident("c"),
                then_block: vec![assign("x")],
                else_block: None,
            },
        )
    };
    let mut f = Function::new(NodeId(1), "branchy");
    f.body = vec![nested_if(2), nested_if(3), nested_if(4)];

    let strict = AnalysisConfig {
        mode: AnalysisMode::Standard,
        complexity_threshold: 2,
        parallel: false,
        ..AnalysisConfig::default()
    };
    let report = AnalysisEngine::new(strict)
        .unwrap()
        .analyze_modules(&[module_with(vec![f.clone()], "b.sol")]);
    assert!(report
        .findings
        .iter()
        .any(|f| f.id == "high_complexity_branchy"));

    let default = sequential_engine(AnalysisMode::Standard);
    let report = default.analyze_modules(&[module_with(vec![f], "b.sol")]);
    assert!(report
        .findings
        .iter()
        .all(|f| f.id != "high_complexity_branchy"));
}

#[test]
fn repeated_runs_are_order_stable() {
    let mut spin = Function::new(NodeId(1), "spin");
    spin.visibility = Visibility::Public;
    spin.body = vec![
        Statement::new(
            NodeId(2),
            StatementKind::While {
                condition: bool_literal(true),
                body: vec![assign("x")],
            },
        ),
    ];
    let mut trailing = Function::new(NodeId(3), "trailing");
    trailing.visibility = Visibility::Public;
    trailing.body = vec![ret(), assign("dead")];

    let modules = vec![module_with(vec![spin, trailing], "m.sol")];
    let engine = sequential_engine(AnalysisMode::Deep);

    let first: Vec<String> = engine
        .analyze_modules(&modules)
        .findings
        .iter()
        .map(|f| f.id.clone())
        .collect();
    let second: Vec<String> = engine
        .analyze_modules(&modules)
        .findings
        .iter()
        .map(|f| f.id.clone())
        .collect();

    assert_eq!(first, second);
    assert!(!first.is_empty());

    // Severity ranks never decrease down the list.
    let report = engine.analyze_modules(&modules);
    let ranks: Vec<u8> = report.findings.iter().map(|f| f.severity.rank()).collect();
    let mut sorted = ranks.clone();
    sorted.sort();
    assert_eq!(ranks, sorted);
}

#[test]
fn statistics_cover_every_function() {
    let mut f = Function::new(NodeId(1), "a");
    f.body = vec![ret()];
    let mut g = Function::new(NodeId(2), "b");
    g.body = vec![ret()];

    let module = module_with(vec![f, g], "stats.sol");
    let engine = sequential_engine(AnalysisMode::Fast);
    let report = engine.analyze_modules(&[module]);

    assert_eq!(report.statistics.total_functions, 2);
    assert_eq!(report.statistics.per_function.len(), 2);
    for stats in report.statistics.per_function.values() {
        assert_eq!(stats.complexity, stats.edges + 2 - stats.nodes);
    }
}
