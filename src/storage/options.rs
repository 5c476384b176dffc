use std::sync::Arc;

use super::metrics::{CounterMetrics, StorageMetrics};
use crate::config::EngineConfig;

/// Configuration options supplied when opening a [`super::Graph`].
#[derive(Clone, Default)]
pub struct GraphOptions {
    /// Number of node rows to reserve up front.
    pub initial_capacity: usize,
    /// Optional metrics collection implementation.
    pub metrics: Option<Arc<dyn StorageMetrics>>,
}

impl GraphOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of node rows reserved when the graph is opened.
    pub fn initial_capacity(mut self, rows: usize) -> Self {
        self.initial_capacity = rows;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn StorageMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl From<&EngineConfig> for GraphOptions {
    fn from(cfg: &EngineConfig) -> Self {
        let opts = GraphOptions::new().initial_capacity(cfg.initial_node_capacity);
        if cfg.collect_metrics {
            opts.metrics(Arc::new(CounterMetrics::default()))
        } else {
            opts
        }
    }
}
