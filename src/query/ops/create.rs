//! `CREATE` operator: stages entities per row and commits them in bulk.
//!
//! Construction selects which aliases of the `CREATE` pattern need new
//! entities (everything not already bound by the `MATCH` pattern, each alias
//! once). Every row pulled from the child instantiates a fresh copy of those
//! entities in the query graph and buffers it. Nothing touches the store until
//! [`Operator::close`], which resolves labels and relationship types, allocates
//! all buffered nodes with one call and connects all buffered edges with one
//! call.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use super::{BoxOperator, ExecutionContext, OpStatus, Operator};
use crate::query::ast::{CreateClause, MatchClause};
use crate::query::query_graph::{Edge, EdgeKey, EdgeSlot, Node, NodeKey, NodeSlot, QueryGraph};
use crate::query::stats::ResultSetStats;
use crate::storage::catalog::{SchemaRegistry, StoreKind};
use crate::storage::{Graph, PropertySet, Triple};
use crate::types::{EntityId, GraphError, LabelId, NodeId, RelationId, Result};

/// Node the operator materialises on every row.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NodeCreateCtx {
    /// Alias slot rebound to each new node.
    pub slot: NodeSlot,
    /// Placeholder the slot held at construction; source of label and properties.
    pub template: NodeKey,
}

/// Edge the operator materialises on every row.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EdgeCreateCtx {
    /// Alias slot rebound to each new edge.
    pub slot: EdgeSlot,
    /// Placeholder the slot held at construction.
    pub template: EdgeKey,
    /// Slot of the source endpoint, read when the edge is instantiated.
    pub src: NodeSlot,
    /// Slot of the destination endpoint, read when the edge is instantiated.
    pub dest: NodeSlot,
}

/// Write operator for a `CREATE` clause.
pub struct CreateOp {
    child: Option<BoxOperator>,
    nodes_to_create: Vec<NodeCreateCtx>,
    edges_to_create: Vec<EdgeCreateCtx>,
    created_nodes: Vec<NodeKey>,
    created_edges: Vec<EdgeKey>,
    executed: bool,
    closed: bool,
}

impl CreateOp {
    /// Stages the entities of `create` that are not bound by `match_clause`.
    ///
    /// Fails with [`GraphError::Contract`] when nothing is left to create and
    /// with [`GraphError::MissingEndpoint`] when an edge endpoint is not bound
    /// in `query_graph`.
    pub fn new(
        query_graph: &QueryGraph,
        create: &CreateClause,
        match_clause: Option<&MatchClause>,
        child: Option<BoxOperator>,
    ) -> Result<Self> {
        let matched: FxHashSet<&str> = match_clause
            .map(|clause| clause.pattern.aliases().collect())
            .unwrap_or_default();
        let pattern = &create.pattern;

        let mut staged_nodes = FxHashSet::default();
        let mut nodes_to_create = Vec::new();
        for (index, _) in pattern.nodes.iter().enumerate() {
            let alias = pattern.node_alias(index)?;
            if matched.contains(alias) {
                continue;
            }
            let slot = query_graph
                .node_ref(alias)
                .ok_or_else(|| GraphError::UnknownAlias(alias.to_owned()))?;
            if !staged_nodes.insert(slot) {
                continue;
            }
            nodes_to_create.push(NodeCreateCtx {
                slot,
                template: query_graph.node_key(slot),
            });
        }

        let mut staged_edges = FxHashSet::default();
        let mut edges_to_create = Vec::new();
        for edge in &pattern.edges {
            let alias = edge
                .alias
                .as_ref()
                .map(|var| var.as_str())
                .ok_or(GraphError::Contract("pattern edge has no alias"))?;
            if matched.contains(alias) {
                continue;
            }
            let slot = query_graph
                .edge_ref(alias)
                .ok_or_else(|| GraphError::UnknownAlias(alias.to_owned()))?;
            if !staged_edges.insert(slot) {
                continue;
            }
            let template = query_graph.edge_key(slot);
            let placeholder = query_graph.edge(template);
            let src = endpoint_slot(query_graph, pattern.node_alias(edge.src)?, alias)?;
            let dest = endpoint_slot(query_graph, pattern.node_alias(edge.dest)?, alias)?;
            if !query_graph.contains_node(placeholder.src)
                || !query_graph.contains_node(placeholder.dest)
            {
                return Err(GraphError::MissingEndpoint {
                    edge: alias.to_owned(),
                    endpoint: query_graph.node_alias(src).to_owned(),
                });
            }
            edges_to_create.push(EdgeCreateCtx {
                slot,
                template,
                src,
                dest,
            });
        }

        if nodes_to_create.is_empty() && edges_to_create.is_empty() {
            return Err(GraphError::Contract("create clause has nothing to create"));
        }
        debug!(
            nodes = nodes_to_create.len(),
            edges = edges_to_create.len(),
            "create.staged"
        );
        Ok(Self {
            child,
            nodes_to_create,
            edges_to_create,
            created_nodes: Vec::new(),
            created_edges: Vec::new(),
            executed: false,
            closed: false,
        })
    }

    /// Nodes instantiated on every row.
    pub fn nodes_to_create(&self) -> &[NodeCreateCtx] {
        &self.nodes_to_create
    }

    /// Edges instantiated on every row.
    pub fn edges_to_create(&self) -> &[EdgeCreateCtx] {
        &self.edges_to_create
    }

    /// Nodes buffered for the commit.
    pub fn created_nodes(&self) -> &[NodeKey] {
        &self.created_nodes
    }

    /// Edges buffered for the commit.
    pub fn created_edges(&self) -> &[EdgeKey] {
        &self.created_edges
    }

    fn create_entities(&mut self, ctx: &mut ExecutionContext) {
        let persisted = ctx.graph.graph().read().node_count();
        let query_graph = &mut ctx.query_graph;

        for staged in &self.nodes_to_create {
            let template = query_graph.node(staged.template);
            let id = persisted + self.created_nodes.len() as u64;
            let node = Node {
                id: EntityId::Provisional(id),
                label: template.label.clone(),
                properties: template.properties.clone(),
            };
            let key = query_graph.alloc_node(node);
            query_graph.set_node_slot(staged.slot, key);
            self.created_nodes.push(key);
            trace!(alias = query_graph.node_alias(staged.slot), id, "create.node");
        }

        for staged in &self.edges_to_create {
            let src = query_graph.node_key(staged.src);
            let dest = query_graph.node_key(staged.dest);
            let template = query_graph.edge(staged.template);
            let edge = Edge {
                id: EntityId::Provisional(0),
                relationship: template.relationship.clone(),
                src,
                dest,
                properties: template.properties.clone(),
            };
            let key = query_graph.alloc_edge(edge);
            query_graph.set_edge_slot(staged.slot, key);
            self.created_edges.push(key);
            trace!(alias = query_graph.edge_alias(staged.slot), "create.edge");
        }
    }

    fn commit(&mut self, ctx: &mut ExecutionContext) -> Result<()> {
        let nodes = std::mem::take(&mut self.created_nodes);
        let edges = std::mem::take(&mut self.created_edges);
        if nodes.is_empty() && edges.is_empty() {
            debug!("create.commit.empty");
            return Ok(());
        }

        let store = Arc::clone(&ctx.graph);
        let mut graph = store.graph().write();
        let mut schema = store.schema().write();
        let mut commit = Commit {
            graph: &mut *graph,
            schema: &mut *schema,
            graph_name: store.name(),
            query_graph: &mut ctx.query_graph,
            stats: &mut ctx.stats,
        };
        let node_count = nodes.len();
        let edge_count = edges.len();
        if !nodes.is_empty() {
            commit.nodes(&nodes)?;
        }
        if !edges.is_empty() {
            commit.edges(edges)?;
        }
        debug!(nodes = node_count, edges = edge_count, graph = store.name(), "create.commit");
        Ok(())
    }
}

fn endpoint_slot(query_graph: &QueryGraph, endpoint: &str, edge: &str) -> Result<NodeSlot> {
    query_graph
        .node_ref(endpoint)
        .ok_or_else(|| GraphError::MissingEndpoint {
            edge: edge.to_owned(),
            endpoint: endpoint.to_owned(),
        })
}

impl Operator for CreateOp {
    fn name(&self) -> &'static str {
        "Create"
    }

    fn consume(&mut self, ctx: &mut ExecutionContext) -> Result<OpStatus> {
        let status = match self.child.as_mut() {
            Some(child) => child.consume(ctx)?,
            None if self.executed => return Ok(OpStatus::Depleted),
            None => OpStatus::Ready,
        };
        if status == OpStatus::Ready {
            self.create_entities(ctx);
            self.executed = true;
        }
        if self.child.is_none() {
            return Ok(OpStatus::Depleted);
        }
        Ok(status)
    }

    fn reset(&mut self, ctx: &mut ExecutionContext) -> Result<()> {
        for staged in &self.nodes_to_create {
            ctx.query_graph.set_node_slot(staged.slot, staged.template);
        }
        for staged in &self.edges_to_create {
            ctx.query_graph.set_edge_slot(staged.slot, staged.template);
        }
        self.executed = false;
        match self.child.as_mut() {
            Some(child) => child.reset(ctx),
            None => Ok(()),
        }
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let committed = self.commit(ctx);
        self.nodes_to_create = Vec::new();
        self.edges_to_create = Vec::new();
        let child_closed = match self.child.as_mut() {
            Some(child) => child.close(ctx),
            None => Ok(()),
        };
        committed.and(child_closed)
    }
}

/// Exclusive view over everything a commit mutates.
struct Commit<'a> {
    graph: &'a mut Graph,
    schema: &'a mut SchemaRegistry,
    graph_name: &'a str,
    query_graph: &'a mut QueryGraph,
    stats: &'a mut ResultSetStats,
}

impl Commit<'_> {
    fn nodes(&mut self, created: &[NodeKey]) -> Result<()> {
        let mut labels = Vec::with_capacity(created.len());
        for &key in created {
            let node = self.query_graph.node(key);
            let label = match node.label.as_deref() {
                None => LabelId::NONE,
                Some(name) => LabelId(resolve_class(
                    self.graph,
                    self.schema,
                    self.stats,
                    self.graph_name,
                    StoreKind::Node,
                    name,
                    &node.properties,
                )),
            };
            if !node.properties.is_empty() {
                self.schema
                    .all(StoreKind::Node, self.graph_name)
                    .update_schema(node.properties.names());
            }
            labels.push(label);
        }

        let records = self.graph.create_nodes(&labels)?;
        let mut properties_set = 0u64;
        for (&key, record) in created.iter().zip(records) {
            let node = self.query_graph.node_mut(key);
            record.properties = std::mem::take(&mut node.properties);
            node.id = EntityId::Persisted(record.id.0);
            properties_set += record.properties.len() as u64;
        }
        self.stats.properties_set += properties_set;
        self.stats.nodes_created += created.len() as u64;
        Ok(())
    }

    fn edges(&mut self, mut created: Vec<EdgeKey>) -> Result<()> {
        // Endpoints first so a dangling edge fails before any class is allocated.
        let mut order = Vec::with_capacity(created.len());
        let mut endpoints = Vec::with_capacity(created.len());
        while let Some(key) = created.pop() {
            let edge = self.query_graph.edge(key);
            endpoints.push((self.endpoint_id(edge.src)?, self.endpoint_id(edge.dest)?));
            order.push(key);
        }

        let mut triples = Vec::with_capacity(order.len());
        for (&key, &(src, dest)) in order.iter().zip(&endpoints) {
            let edge = self.query_graph.edge(key);
            let relation = match edge.relationship.as_deref() {
                None => RelationId::NONE,
                Some(name) => RelationId(resolve_class(
                    self.graph,
                    self.schema,
                    self.stats,
                    self.graph_name,
                    StoreKind::Edge,
                    name,
                    &edge.properties,
                )),
            };
            if !edge.properties.is_empty() {
                self.schema
                    .all(StoreKind::Edge, self.graph_name)
                    .update_schema(edge.properties.names());
            }
            triples.push(Triple::new(src, dest, relation));
        }

        let records = self.graph.connect_nodes(&triples)?;
        let mut properties_set = 0u64;
        for (&key, record) in order.iter().zip(records) {
            let edge = self.query_graph.edge_mut(key);
            record.properties = std::mem::take(&mut edge.properties);
            edge.id = EntityId::Persisted(record.id.0);
            properties_set += record.properties.len() as u64;
        }
        self.stats.properties_set += properties_set;
        self.stats.relationships_created += triples.len() as u64;
        Ok(())
    }

    fn endpoint_id(&self, key: NodeKey) -> Result<NodeId> {
        self.query_graph
            .node(key)
            .id
            .persisted()
            .map(NodeId)
            .ok_or(GraphError::Contract("edge endpoint has no persisted id"))
    }
}

/// Looks up the class registered for `name`, allocating one on a miss, and
/// merges `properties` into its schema entry.
fn resolve_class(
    graph: &mut Graph,
    schema: &mut SchemaRegistry,
    stats: &mut ResultSetStats,
    graph_name: &str,
    kind: StoreKind,
    name: &str,
    properties: &PropertySet,
) -> u32 {
    match schema.lookup(kind, graph_name, name) {
        Some(entry) => {
            entry.update_schema(properties.names());
            entry.id
        }
        None => {
            let id = match kind {
                StoreKind::Node => {
                    stats.labels_added += 1;
                    graph.add_label_class().0
                }
                StoreKind::Edge => graph.add_relation_class().0,
            };
            schema
                .create(kind, graph_name, name, id)
                .update_schema(properties.names());
            id
        }
    }
}
