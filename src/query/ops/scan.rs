//! Label scan binding one alias to persisted nodes.

use tracing::trace;

use super::{BoxOperator, ExecutionContext, OpStatus, Operator};
use crate::query::query_graph::{Node, NodeKey, NodeSlot, QueryGraph};
use crate::storage::catalog::StoreKind;
use crate::storage::PropertySet;
use crate::types::{EntityId, GraphError, LabelId, NodeId, Result};

/// Produces one row per persisted node matching a label and property filter.
///
/// With a child, the scan restarts for every child row, yielding the
/// cartesian product of the child's rows and the matching nodes.
pub struct NodeScan {
    alias: String,
    label: Option<String>,
    filter: PropertySet,
    child: Option<BoxOperator>,
    slot: NodeSlot,
    placeholder: NodeKey,
    candidates: Vec<NodeId>,
    cursor: usize,
    loaded: bool,
    closed: bool,
}

impl NodeScan {
    /// Creates a scan binding `alias`, which must already be in `query_graph`.
    pub fn new(
        query_graph: &QueryGraph,
        alias: &str,
        label: Option<String>,
        child: Option<BoxOperator>,
    ) -> Result<Self> {
        let slot = query_graph
            .node_ref(alias)
            .ok_or_else(|| GraphError::UnknownAlias(alias.to_owned()))?;
        Ok(Self {
            alias: alias.to_owned(),
            label,
            filter: PropertySet::new(),
            child,
            slot,
            placeholder: query_graph.node_key(slot),
            candidates: Vec::new(),
            cursor: 0,
            loaded: false,
            closed: false,
        })
    }

    /// Only yields nodes carrying every property of `filter` with an equal value.
    pub fn with_filter(mut self, filter: PropertySet) -> Self {
        self.filter = filter;
        self
    }

    fn load(&mut self, ctx: &ExecutionContext) {
        let store = &ctx.graph;
        let graph = store.graph().read();
        let ids = match self.label.as_deref() {
            None => (0..graph.node_count()).map(NodeId).collect(),
            Some(name) => {
                let label = store
                    .schema()
                    .read()
                    .get(StoreKind::Node, store.name(), name)
                    .map(|entry| LabelId(entry.id));
                label.map(|id| graph.nodes_with_label(id)).unwrap_or_default()
            }
        };
        self.candidates = ids
            .into_iter()
            .filter(|id| {
                graph.node(*id).is_some_and(|record| {
                    self.filter
                        .iter()
                        .all(|prop| record.properties.get(&prop.name) == Some(&prop.value))
                })
            })
            .collect();
        self.cursor = 0;
        self.loaded = true;
        trace!(alias = %self.alias, candidates = self.candidates.len(), "scan.load");
    }

    fn bind(&self, ctx: &mut ExecutionContext, id: NodeId) -> Result<()> {
        let (label, properties) = {
            let store = &ctx.graph;
            let graph = store.graph().read();
            let record = graph.node(id).ok_or(GraphError::NotFound)?;
            let label = if record.label.is_some() {
                store
                    .schema()
                    .read()
                    .name_of(StoreKind::Node, store.name(), record.label.0)
                    .map(str::to_owned)
            } else {
                None
            };
            (label, record.properties.clone())
        };
        let node = Node {
            id: EntityId::Persisted(id.0),
            label,
            properties,
        };
        let key = ctx.query_graph.alloc_node(node);
        ctx.query_graph.set_node_slot(self.slot, key);
        Ok(())
    }
}

impl Operator for NodeScan {
    fn name(&self) -> &'static str {
        "NodeScan"
    }

    fn consume(&mut self, ctx: &mut ExecutionContext) -> Result<OpStatus> {
        loop {
            if let Some(&id) = self.candidates.get(self.cursor) {
                self.cursor += 1;
                self.bind(ctx, id)?;
                return Ok(OpStatus::Ready);
            }
            match self.child.as_mut() {
                None if self.loaded => return Ok(OpStatus::Depleted),
                None => {}
                Some(child) => {
                    if child.consume(ctx)? == OpStatus::Depleted {
                        return Ok(OpStatus::Depleted);
                    }
                }
            }
            self.load(ctx);
        }
    }

    fn reset(&mut self, ctx: &mut ExecutionContext) -> Result<()> {
        self.candidates.clear();
        self.cursor = 0;
        self.loaded = false;
        ctx.query_graph.set_node_slot(self.slot, self.placeholder);
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
        self.candidates = Vec::new();
        match self.child.as_mut() {
            Some(child) => child.close(ctx),
            None => Ok(()),
        }
    }
}
