//! Graph storage engine and core data structures.
//!
//! Stores nodes and edges as records backed by sparse boolean matrices: one
//! diagonal matrix per label, one matrix per relationship type and a global
//! adjacency matrix. Writes happen in bulk so structural changes to the
//! matrices are amortised across a whole batch.

/// Schema registry for labels and relationship types.
///
/// Maps names to matrix classes and tracks the property names seen per class.
pub mod catalog;

mod graph;
mod matrix;
mod metrics;
mod options;
mod types;

/// Core graph storage implementation.
pub use graph::{EdgeIter, Graph, NodeIter};
/// Sparse boolean matrix used for label, relation and adjacency classes.
pub use matrix::SparseMatrix;
/// Storage metrics collection interface.
pub use metrics::{default_metrics, CounterMetrics, NoopMetrics, StorageMetrics};
/// Graph configuration options.
pub use options::GraphOptions;
/// Storage record types.
pub use types::{EdgeRecord, NodeRecord, Property, PropertySet, Triple};
