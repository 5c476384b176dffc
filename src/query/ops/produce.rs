//! Result projection.
//!
//! Rows are captured as arena keys while the plan runs and resolved into
//! [`ResultRow`]s only after every operator is closed, so entities created by
//! the same query report their final ids and the properties the store owns.

use serde::Serialize;

use super::{BoxOperator, ExecutionContext, OpStatus, Operator};
use crate::query::query_graph::{EdgeKey, EdgeSlot, NodeKey, NodeSlot, QueryGraph};
use crate::storage::{Graph, PropertySet};
use crate::types::{EdgeId, GraphError, NodeId, Result};

/// Entity captured for one projected column.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Binding {
    /// Node arena entry.
    Node(NodeKey),
    /// Edge arena entry.
    Edge(EdgeKey),
}

#[derive(Copy, Clone, Debug)]
enum Column {
    Node(NodeSlot),
    Edge(EdgeSlot),
}

/// Projected value of one column.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RowValue {
    /// Node snapshot; `id` is `None` until the node is persisted.
    Node {
        /// Persisted id.
        id: Option<u64>,
        /// Label name.
        label: Option<String>,
        /// Properties.
        properties: PropertySet,
    },
    /// Edge snapshot; ids are `None` until persisted.
    Edge {
        /// Persisted id.
        id: Option<u64>,
        /// Relationship type name.
        relationship: Option<String>,
        /// Persisted source id.
        src: Option<u64>,
        /// Persisted destination id.
        dest: Option<u64>,
        /// Properties.
        properties: PropertySet,
    },
}

/// One projected row, in column order.
pub type ResultRow = Vec<RowValue>;

/// Captures the entities bound to a list of aliases for every child row.
pub struct ProduceResults {
    columns: Vec<Column>,
    child: BoxOperator,
    closed: bool,
}

impl ProduceResults {
    /// Creates a projection of `aliases`, each of which must be bound in `query_graph`.
    pub fn new(query_graph: &QueryGraph, aliases: &[String], child: BoxOperator) -> Result<Self> {
        let columns = aliases
            .iter()
            .map(|alias| {
                query_graph
                    .node_ref(alias)
                    .map(Column::Node)
                    .or_else(|| query_graph.edge_ref(alias).map(Column::Edge))
                    .ok_or_else(|| GraphError::UnknownAlias(alias.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns,
            child,
            closed: false,
        })
    }
}

impl Operator for ProduceResults {
    fn name(&self) -> &'static str {
        "ProduceResults"
    }

    fn consume(&mut self, ctx: &mut ExecutionContext) -> Result<OpStatus> {
        let status = self.child.consume(ctx)?;
        if status == OpStatus::Ready {
            let query_graph = &ctx.query_graph;
            let record = self
                .columns
                .iter()
                .map(|column| match *column {
                    Column::Node(slot) => Binding::Node(query_graph.node_key(slot)),
                    Column::Edge(slot) => Binding::Edge(query_graph.edge_key(slot)),
                })
                .collect();
            ctx.records.push(record);
        }
        Ok(status)
    }

    fn reset(&mut self, ctx: &mut ExecutionContext) -> Result<()> {
        self.child.reset(ctx)
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.child.close(ctx)
    }
}

/// Resolves captured bindings against the query graph and the store.
pub fn resolve_row(query_graph: &QueryGraph, graph: &Graph, record: &[Binding]) -> ResultRow {
    record
        .iter()
        .map(|binding| match *binding {
            Binding::Node(key) => {
                let node = query_graph.node(key);
                let id = node.id.persisted();
                let properties = id
                    .and_then(|id| graph.node(NodeId(id)))
                    .map(|record| record.properties.clone())
                    .unwrap_or_else(|| node.properties.clone());
                RowValue::Node {
                    id,
                    label: node.label.clone(),
                    properties,
                }
            }
            Binding::Edge(key) => {
                let edge = query_graph.edge(key);
                let id = edge.id.persisted();
                let properties = id
                    .and_then(|id| graph.edge(EdgeId(id)))
                    .map(|record| record.properties.clone())
                    .unwrap_or_else(|| edge.properties.clone());
                RowValue::Edge {
                    id,
                    relationship: edge.relationship.clone(),
                    src: query_graph.node(edge.src).id.persisted(),
                    dest: query_graph.node(edge.dest).id.persisted(),
                    properties,
                }
            }
        })
        .collect()
}
