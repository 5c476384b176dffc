#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::sync::Arc;

use matrixgraph::query::ast::{
    CreateClause, EdgePattern, MatchClause, NodePattern, Pattern, QueryAst, Var,
};
use matrixgraph::query::ops::{
    CreateOp, ExecutionContext, NodeScan, OpStatus, Operator, RowValue,
};
use matrixgraph::query::{QueryGraph, Value};
use matrixgraph::storage::catalog::StoreKind;
use matrixgraph::storage::{CounterMetrics, GraphOptions};
use matrixgraph::types::{EntityId, LabelId, NodeId, Result};
use matrixgraph::{ExecutionPlan, GraphContext, ResultSetStats};
use proptest::prelude::*;

fn graph() -> Arc<GraphContext> {
    Arc::new(GraphContext::new("social", GraphOptions::new()))
}

fn run(graph: &Arc<GraphContext>, ast: QueryAst) -> Result<ResultSetStats> {
    Ok(ExecutionPlan::new(Arc::clone(graph), ast)?.execute()?.stats)
}

fn create_only(pattern: Pattern) -> QueryAst {
    QueryAst {
        match_clause: None,
        create: Some(CreateClause { pattern }),
        returns: Vec::new(),
    }
}

fn match_create(matched: Pattern, create: Pattern) -> QueryAst {
    QueryAst {
        match_clause: Some(MatchClause { pattern: matched }),
        create: Some(CreateClause { pattern: create }),
        returns: Vec::new(),
    }
}

fn seed_people(graph: &Arc<GraphContext>, names: &[&str]) -> Result<()> {
    let mut pattern = Pattern::new();
    for name in names {
        pattern.push_node(NodePattern::anonymous().label("Person").property("name", *name));
    }
    run(graph, create_only(pattern))?;
    Ok(())
}

#[test]
fn scenario_a_create_path_from_scratch() -> Result<()> {
    let graph = graph();
    let mut pattern = Pattern::new();
    let a = pattern.push_node(NodePattern::new("a").label("Person").property("name", "Al"));
    let b = pattern.push_node(NodePattern::new("b").label("Person").property("name", "Bo"));
    pattern.push_edge(EdgePattern::new(a, b).relationship("KNOWS"));

    let stats = run(&graph, create_only(pattern))?;
    assert_eq!(
        stats,
        ResultSetStats {
            labels_added: 1,
            nodes_created: 2,
            relationships_created: 1,
            properties_set: 2,
        }
    );

    let store = graph.graph().read();
    assert_eq!(store.label_count(), 1);
    assert_eq!(store.relation_count(), 1);
    assert_eq!(store.nodes_with_label(LabelId(0)), vec![NodeId(0), NodeId(1)]);
    assert_eq!(
        store.node(NodeId(1)).and_then(|n| n.properties.get("name").cloned()),
        Some(Value::from("Bo"))
    );
    let knows = store
        .relation_matrix(store.edges()[0].relation)
        .expect("relation matrix");
    assert!(knows.get(0, 1));
    Ok(())
}

#[test]
fn scenario_b_matched_alias_is_not_recreated() -> Result<()> {
    let graph = graph();
    seed_people(&graph, &["Al"])?;

    let mut matched = Pattern::new();
    matched.push_node(NodePattern::new("a").label("Person"));
    let mut create = Pattern::new();
    let a = create.push_node(NodePattern::new("a"));
    let b = create.push_node(NodePattern::new("b").label("Person").property("name", "Bo"));
    create.push_edge(EdgePattern::new(a, b).relationship("KNOWS"));

    let stats = run(&graph, match_create(matched, create))?;
    assert_eq!(stats.nodes_created, 1);
    assert_eq!(stats.relationships_created, 1);
    assert_eq!(stats.labels_added, 0);

    let store = graph.graph().read();
    assert_eq!(store.node_count(), 2);
    assert!(store.adjacency().get(0, 1));
    Ok(())
}

#[test]
fn scenario_c_reset_between_rows_accumulates_one_commit() -> Result<()> {
    let graph = graph();
    seed_people(&graph, &["Al"])?;

    let mut matched = Pattern::new();
    matched.push_node(NodePattern::new("p").label("Person"));
    let mut create = Pattern::new();
    let p = create.push_node(NodePattern::new("p"));
    let f = create.push_node(NodePattern::new("f").label("Pet"));
    create.push_edge(EdgePattern::new(p, f).alias("owns").relationship("OWNS"));
    let mut ast = match_create(matched, create);
    ast.name_anonymous_entities();

    let query_graph = QueryGraph::build(ast.match_clause.as_ref(), ast.create.as_ref())?;
    let scan = NodeScan::new(&query_graph, "p", Some("Person".into()), None)?;
    let create = ast.create.as_ref().expect("create clause");
    let mut op = CreateOp::new(&query_graph, create, ast.match_clause.as_ref(), Some(Box::new(scan)))?;
    let mut ctx = ExecutionContext::new(Arc::clone(&graph), query_graph);

    let slot = ctx.query_graph.node_ref("f").expect("alias f");
    let placeholder = ctx.query_graph.node_key(slot);

    assert_eq!(op.consume(&mut ctx)?, OpStatus::Ready);
    let first = ctx.query_graph.node_key(slot);
    assert_ne!(first, placeholder);
    assert_eq!(ctx.query_graph.node(first).id, EntityId::Provisional(1));

    op.reset(&mut ctx)?;
    assert_eq!(ctx.query_graph.node_key(slot), placeholder);
    assert_eq!(ctx.query_graph.node(placeholder).id, EntityId::Unbound);

    assert_eq!(op.consume(&mut ctx)?, OpStatus::Ready);
    assert_eq!(op.consume(&mut ctx)?, OpStatus::Depleted);
    assert_eq!(op.created_nodes().len(), 2);
    assert_eq!(op.created_edges().len(), 2);

    op.close(&mut ctx)?;
    assert_eq!(ctx.stats.nodes_created, 2);
    assert_eq!(ctx.stats.relationships_created, 2);
    let store = graph.graph().read();
    assert_eq!(store.node_count(), 3);
    assert!(store.adjacency().get(0, 1));
    assert!(store.adjacency().get(0, 2));
    Ok(())
}

#[test]
fn scenario_d_depleted_upstream_commits_nothing() -> Result<()> {
    let graph = graph();
    seed_people(&graph, &["Al"])?;
    let before = graph.graph().read().node_count();

    let mut matched = Pattern::new();
    matched.push_node(NodePattern::new("c").label("City"));
    let mut create = Pattern::new();
    let c = create.push_node(NodePattern::new("c"));
    let m = create.push_node(NodePattern::new("m").label("Mayor"));
    create.push_edge(EdgePattern::new(m, c).relationship("RUNS"));

    let stats = run(&graph, match_create(matched, create))?;
    assert_eq!(stats, ResultSetStats::default());
    let store = graph.graph().read();
    assert_eq!(store.node_count(), before);
    assert_eq!(store.relation_count(), 0);
    assert!(graph
        .schema()
        .read()
        .get(StoreKind::Node, "social", "Mayor")
        .is_none());
    Ok(())
}

#[test]
fn one_matrix_resize_per_commit_regardless_of_rows() -> Result<()> {
    let metrics = Arc::new(CounterMetrics::default());
    let graph = Arc::new(GraphContext::new(
        "social",
        GraphOptions::new().metrics(metrics.clone()),
    ));
    let names: Vec<String> = (0..50).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    seed_people(&graph, &refs)?;
    let resizes_after_seed = graph.graph().read().resize_count();

    let mut matched = Pattern::new();
    matched.push_node(NodePattern::new("p").label("Person"));
    let mut create = Pattern::new();
    let p = create.push_node(NodePattern::new("p"));
    let t = create.push_node(NodePattern::new("t").label("Tag"));
    create.push_edge(EdgePattern::new(p, t).relationship("TAGGED"));
    let stats = run(&graph, match_create(matched, create))?;

    assert_eq!(stats.nodes_created, 50);
    assert_eq!(stats.relationships_created, 50);
    assert_eq!(graph.graph().read().resize_count(), resizes_after_seed + 1);
    assert_eq!(
        metrics
            .edge_batches
            .load(std::sync::atomic::Ordering::Relaxed),
        1
    );
    Ok(())
}

#[test]
fn create_return_projects_committed_entities() -> Result<()> {
    let graph = graph();
    let mut pattern = Pattern::new();
    pattern.push_node(NodePattern::new("n").label("Person").property("age", 33i64));
    let mut ast = create_only(pattern);
    ast.returns = vec![Var::new("n")];
    let result = ExecutionPlan::new(Arc::clone(&graph), ast)?.execute()?;
    let json = serde_json::to_value(&result.rows)?;
    assert_eq!(json[0][0]["id"], 0);
    assert_eq!(json[0][0]["label"], "Person");
    assert_eq!(json[0][0]["properties"][0]["value"]["v"], 33);
    Ok(())
}

#[test]
fn user_alias_shaped_like_generated_name_keeps_both_nodes() -> Result<()> {
    let graph = graph();
    let mut pattern = Pattern::new();
    pattern.push_node(NodePattern::new("anon_0").label("Person"));
    pattern.push_node(NodePattern::anonymous().label("City"));
    let stats = run(&graph, create_only(pattern))?;
    assert_eq!(stats.nodes_created, 2);
    assert_eq!(stats.labels_added, 2);
    assert_eq!(graph.graph().read().node_count(), 2);
    Ok(())
}

#[test]
fn match_without_label_returns_stored_labels() -> Result<()> {
    let graph = graph();
    seed_people(&graph, &["Al"])?;
    let mut matched = Pattern::new();
    matched.push_node(NodePattern::new("n"));
    let ast = QueryAst {
        match_clause: Some(MatchClause { pattern: matched }),
        create: None,
        returns: vec![Var::new("n")],
    };
    let result = ExecutionPlan::new(Arc::clone(&graph), ast)?.execute()?;
    assert_eq!(result.rows.len(), 1);
    match &result.rows[0][0] {
        RowValue::Node { id, label, .. } => {
            assert_eq!(*id, Some(0));
            assert_eq!(label.as_deref(), Some("Person"));
        }
        other => panic!("unexpected value {other:?}"),
    }
    Ok(())
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z]{0,12}".prop_map(Value::String),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn new_nodes_get_dense_ids_and_exact_properties(
        rows in 1usize..8,
        extra in 0usize..6,
        props in prop::collection::btree_map("[a-z]{1,6}", arb_value(), 0..5),
    ) {
        let graph = graph();
        {
            let mut store = graph.graph().write();
            let row_label = store.add_label_class();
            graph.schema().write().create(StoreKind::Node, "social", "Row", row_label.0);
            let mut labels = vec![row_label; rows];
            labels.extend(std::iter::repeat(LabelId::NONE).take(extra));
            store.create_nodes(&labels)?;
        }
        let persisted = (rows + extra) as u64;

        let mut matched = Pattern::new();
        matched.push_node(NodePattern::new("r").label("Row"));
        let mut node = NodePattern::new("n");
        for (name, value) in &props {
            node = node.property(name.clone(), value.clone());
        }
        let mut create = Pattern::new();
        create.push_node(node);
        let stats = run(&graph, match_create(matched, create))?;

        prop_assert_eq!(stats.nodes_created, rows as u64);
        prop_assert_eq!(stats.properties_set, (rows * props.len()) as u64);
        let store = graph.graph().read();
        prop_assert_eq!(store.node_count(), persisted + rows as u64);
        for offset in 0..rows as u64 {
            let record = store.node(NodeId(persisted + offset)).expect("created node");
            prop_assert_eq!(record.id, NodeId(persisted + offset));
            let stored: BTreeMap<String, Value> = record
                .properties
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect();
            prop_assert_eq!(&stored, &props);
        }
    }
}
