use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hook for tracking write-path activity on a [`super::Graph`].
///
/// Implementations receive one call per bulk operation rather than per entity,
/// matching how the store batches creation.
pub trait StorageMetrics: Send + Sync {
    /// Records a bulk node allocation of `count` nodes.
    fn nodes_created(&self, count: u64);

    /// Records a bulk connect of `count` edges.
    fn edges_created(&self, count: u64);

    /// Records a new label or relation class.
    fn class_added(&self, kind: &'static str);

    /// Records one structural matrix resize.
    fn matrix_resized(&self);
}

/// A no-op implementation of [`StorageMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl StorageMetrics for NoopMetrics {
    fn nodes_created(&self, _count: u64) {}
    fn edges_created(&self, _count: u64) {}
    fn class_added(&self, _kind: &'static str) {}
    fn matrix_resized(&self) {}
}

/// Atomic counter implementation of [`StorageMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of nodes created.
    pub nodes_created: AtomicU64,
    /// Number of edges created.
    pub edges_created: AtomicU64,
    /// Number of bulk node allocations.
    pub node_batches: AtomicU64,
    /// Number of bulk connects.
    pub edge_batches: AtomicU64,
    /// Number of label classes added.
    pub label_classes: AtomicU64,
    /// Number of relation classes added.
    pub relation_classes: AtomicU64,
    /// Number of matrix resizes.
    pub matrix_resizes: AtomicU64,
}

impl StorageMetrics for CounterMetrics {
    fn nodes_created(&self, count: u64) {
        self.nodes_created.fetch_add(count, Ordering::Relaxed);
        self.node_batches.fetch_add(1, Ordering::Relaxed);
    }

    fn edges_created(&self, count: u64) {
        self.edges_created.fetch_add(count, Ordering::Relaxed);
        self.edge_batches.fetch_add(1, Ordering::Relaxed);
    }

    fn class_added(&self, kind: &'static str) {
        match kind {
            "label" => {
                self.label_classes.fetch_add(1, Ordering::Relaxed);
            }
            "relation" => {
                self.relation_classes.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn matrix_resized(&self) {
        self.matrix_resizes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation ([`NoopMetrics`]) wrapped in an [`Arc`].
pub fn default_metrics() -> Arc<dyn StorageMetrics> {
    Arc::new(NoopMetrics)
}
