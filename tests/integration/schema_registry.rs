#![allow(missing_docs)]

use std::sync::Arc;

use matrixgraph::query::ast::{CreateClause, EdgePattern, MatchClause, NodePattern, Pattern, QueryAst};
use matrixgraph::storage::catalog::{SchemaRegistry, StoreKind};
use matrixgraph::storage::GraphOptions;
use matrixgraph::types::Result;
use matrixgraph::{ExecutionPlan, GraphContext};

fn create(graph: &Arc<GraphContext>, pattern: Pattern) -> Result<()> {
    let ast = QueryAst {
        match_clause: None,
        create: Some(CreateClause { pattern }),
        returns: Vec::new(),
    };
    ExecutionPlan::new(Arc::clone(graph), ast)?.execute()?;
    Ok(())
}

#[test]
fn commit_registers_labels_relations_and_property_names() -> Result<()> {
    let graph = Arc::new(GraphContext::new("movies", GraphOptions::new()));
    let mut pattern = Pattern::new();
    let actor = pattern.push_node(
        NodePattern::new("k")
            .label("Actor")
            .property("name", "Keanu")
            .property("born", 1964i64),
    );
    let movie = pattern.push_node(NodePattern::new("m").label("Movie").property("title", "Speed"));
    pattern.push_edge(
        EdgePattern::new(actor, movie)
            .relationship("ACTED_IN")
            .property("role", "Jack"),
    );
    create(&graph, pattern)?;

    let schema = graph.schema().read();
    assert_eq!(schema.len(StoreKind::Node, "movies"), 2);
    assert_eq!(schema.len(StoreKind::Edge, "movies"), 1);

    let actor = schema.get(StoreKind::Node, "movies", "Actor").expect("Actor entry");
    assert_eq!(actor.properties().collect::<Vec<_>>(), vec!["born", "name"]);
    let acted = schema
        .get(StoreKind::Edge, "movies", "ACTED_IN")
        .expect("ACTED_IN entry");
    assert!(acted.has_property("role"));
    assert!(schema.get(StoreKind::Node, "other", "Actor").is_none());
    Ok(())
}

#[test]
fn all_entry_collects_properties_across_labels() -> Result<()> {
    let graph = Arc::new(GraphContext::new("g", GraphOptions::new()));
    let mut pattern = Pattern::new();
    pattern.push_node(NodePattern::anonymous().label("A").property("x", 1i64));
    pattern.push_node(NodePattern::anonymous().property("y", true));
    create(&graph, pattern)?;

    let mut schema = graph.schema().write();
    let all = schema.all(StoreKind::Node, "g");
    assert!(all.name.is_none());
    assert_eq!(all.properties().collect::<Vec<_>>(), vec!["x", "y"]);
    assert!(!schema.all(StoreKind::Edge, "g").has_property("x"));
    Ok(())
}

#[test]
fn repeated_labels_reuse_one_class() -> Result<()> {
    let graph = Arc::new(GraphContext::new("g", GraphOptions::new()));
    for name in ["a", "b", "c"] {
        let mut pattern = Pattern::new();
        pattern.push_node(NodePattern::anonymous().label("Person").property("name", name));
        create(&graph, pattern)?;
    }

    let schema = graph.schema().read();
    let snapshot = schema.metrics_snapshot();
    assert_eq!(snapshot.creates, 1);
    assert_eq!(snapshot.lookup_hits, 2);
    assert_eq!(snapshot.lookup_misses, 1);
    assert_eq!(graph.graph().read().label_count(), 1);
    Ok(())
}

#[test]
fn scan_lookups_do_not_create_entries() -> Result<()> {
    let graph = Arc::new(GraphContext::new("g", GraphOptions::new()));
    let mut matched = Pattern::new();
    matched.push_node(NodePattern::new("x").label("Ghost"));
    let mut created = Pattern::new();
    created.push_node(NodePattern::new("x"));
    created.push_node(NodePattern::new("y").label("Shadow"));
    let ast = QueryAst {
        match_clause: Some(MatchClause { pattern: matched }),
        create: Some(CreateClause { pattern: created }),
        returns: Vec::new(),
    };
    ExecutionPlan::new(Arc::clone(&graph), ast)?.execute()?;

    let schema = graph.schema().read();
    assert!(schema.is_empty(StoreKind::Node, "g"));
    assert_eq!(schema.metrics_snapshot().creates, 0);
    Ok(())
}

#[test]
fn shared_metrics_handle_observes_later_lookups() {
    let mut registry = SchemaRegistry::new();
    let metrics = registry.metrics();
    registry.create(StoreKind::Edge, "g", "KNOWS", 0);
    assert!(registry.lookup(StoreKind::Edge, "g", "KNOWS").is_some());
    assert!(registry.lookup(StoreKind::Edge, "g", "LIKES").is_none());
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.lookup_calls, 2);
    assert!((snapshot.hit_rate() - 0.5).abs() < f64::EPSILON);
}
