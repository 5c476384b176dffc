//! Matrix-backed property graph store.
//!
//! Every label and relationship type owns a square [`SparseMatrix`] sized to
//! the node count; a global adjacency matrix records every connection. Nodes
//! and edges are created in bulk so that matrix growth happens at most once
//! per call regardless of how many entities are inserted.

use std::sync::Arc;

use tracing::{debug, trace};

use super::matrix::SparseMatrix;
use super::metrics::{default_metrics, StorageMetrics};
use super::options::GraphOptions;
use super::types::{EdgeRecord, NodeRecord, PropertySet, Triple};
use crate::types::{EdgeId, GraphError, LabelId, NodeId, RelationId, Result};

/// In-process graph store.
pub struct Graph {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    adjacency: SparseMatrix,
    labels: Vec<SparseMatrix>,
    relations: Vec<SparseMatrix>,
    resize_count: u64,
    metrics: Arc<dyn StorageMetrics>,
}

/// Mutable iterator over node records returned by [`Graph::create_nodes`].
pub struct NodeIter<'a> {
    inner: std::slice::IterMut<'a, NodeRecord>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a mut NodeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for NodeIter<'_> {}

/// Mutable iterator over edge records returned by [`Graph::connect_nodes`].
pub struct EdgeIter<'a> {
    inner: std::slice::IterMut<'a, EdgeRecord>,
}

impl<'a> Iterator for EdgeIter<'a> {
    type Item = &'a mut EdgeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for EdgeIter<'_> {}

impl Graph {
    /// Opens an empty graph with the supplied options.
    pub fn open(opts: GraphOptions) -> Self {
        Self {
            nodes: Vec::with_capacity(opts.initial_capacity),
            edges: Vec::new(),
            adjacency: SparseMatrix::new(0),
            labels: Vec::new(),
            relations: Vec::new(),
            resize_count: 0,
            metrics: opts.metrics.unwrap_or_else(default_metrics),
        }
    }

    /// Number of persisted nodes.
    pub fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    /// Number of persisted edges.
    pub fn edge_count(&self) -> u64 {
        self.edges.len() as u64
    }

    /// Number of label classes.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of relation classes.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Number of structural matrix changes performed so far.
    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }

    /// Allocates a new label class and returns its id.
    pub fn add_label_class(&mut self) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(SparseMatrix::new(self.node_count()));
        self.metrics.class_added("label");
        debug!(label = %id, "graph.add_label_class");
        id
    }

    /// Allocates a new relation class and returns its id.
    pub fn add_relation_class(&mut self) -> RelationId {
        let id = RelationId(self.relations.len() as u32);
        self.relations.push(SparseMatrix::new(self.node_count()));
        self.metrics.class_added("relation");
        debug!(relation = %id, "graph.add_relation_class");
        id
    }

    /// Allocates one node per entry of `labels` and returns the new records in order.
    ///
    /// Records are pre-filled with sequential ids starting at the previous node
    /// count and an empty property set.
    pub fn create_nodes(&mut self, labels: &[LabelId]) -> Result<NodeIter<'_>> {
        for label in labels {
            if label.is_some() && label.0 as usize >= self.labels.len() {
                return Err(GraphError::Invalid("unknown label class"));
            }
        }
        let base = self.nodes.len();
        let total = (base + labels.len()) as u64;
        self.grow(total);
        for (offset, label) in labels.iter().enumerate() {
            let id = (base + offset) as u64;
            if label.is_some() {
                self.labels[label.0 as usize].set(id, id)?;
            }
            self.nodes.push(NodeRecord {
                id: NodeId(id),
                label: *label,
                properties: PropertySet::new(),
            });
        }
        if !labels.is_empty() {
            self.metrics.nodes_created(labels.len() as u64);
        }
        trace!(base, count = labels.len(), "graph.create_nodes");
        Ok(NodeIter {
            inner: self.nodes[base..].iter_mut(),
        })
    }

    /// Connects every triple and returns the new edge records in triple order.
    ///
    /// All triples are validated before any matrix is touched, so a rejected
    /// batch leaves the store unchanged.
    pub fn connect_nodes(&mut self, triples: &[Triple]) -> Result<EdgeIter<'_>> {
        let node_count = self.node_count();
        for triple in triples {
            if triple.src.0 >= node_count {
                return Err(GraphError::Invalid("edge source node missing"));
            }
            if triple.dest.0 >= node_count {
                return Err(GraphError::Invalid("edge destination node missing"));
            }
            if triple.relation.is_some() && triple.relation.0 as usize >= self.relations.len() {
                return Err(GraphError::Invalid("unknown relation class"));
            }
        }
        let base = self.edges.len();
        for (offset, triple) in triples.iter().enumerate() {
            self.adjacency.set(triple.src.0, triple.dest.0)?;
            if triple.relation.is_some() {
                self.relations[triple.relation.0 as usize].set(triple.src.0, triple.dest.0)?;
            }
            self.edges.push(EdgeRecord {
                id: EdgeId((base + offset) as u64),
                src: triple.src,
                dest: triple.dest,
                relation: triple.relation,
                properties: PropertySet::new(),
            });
        }
        if !triples.is_empty() {
            self.metrics.edges_created(triples.len() as u64);
        }
        trace!(base, count = triples.len(), "graph.connect_nodes");
        Ok(EdgeIter {
            inner: self.edges[base..].iter_mut(),
        })
    }

    /// Returns the node record for `id`.
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.0 as usize)
    }

    /// Returns the edge record for `id`.
    pub fn edge(&self, id: EdgeId) -> Option<&EdgeRecord> {
        self.edges.get(id.0 as usize)
    }

    /// All node records in id order.
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    /// All edge records in id order.
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// Global adjacency matrix.
    pub fn adjacency(&self) -> &SparseMatrix {
        &self.adjacency
    }

    /// Label matrix for `label`.
    pub fn label_matrix(&self, label: LabelId) -> Option<&SparseMatrix> {
        self.labels.get(label.0 as usize)
    }

    /// Relation matrix for `relation`.
    pub fn relation_matrix(&self, relation: RelationId) -> Option<&SparseMatrix> {
        self.relations.get(relation.0 as usize)
    }

    /// Ids of every node carrying `label`, ascending.
    pub fn nodes_with_label(&self, label: LabelId) -> Vec<NodeId> {
        self.label_matrix(label)
            .map(|m| m.diagonal().into_iter().map(NodeId).collect())
            .unwrap_or_default()
    }

    fn grow(&mut self, dim: u64) {
        let mut changed = self.adjacency.resize(dim);
        for matrix in self.labels.iter_mut().chain(self.relations.iter_mut()) {
            changed |= matrix.resize(dim);
        }
        if changed {
            self.resize_count += 1;
            self.metrics.matrix_resized();
        }
    }
}
