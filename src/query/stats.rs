//! Write statistics reported with a result set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters incremented by write operators while a plan runs.
///
/// Counters accumulate so several write operators can share one record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSetStats {
    /// Label classes allocated.
    pub labels_added: u64,
    /// Nodes persisted.
    pub nodes_created: u64,
    /// Relationships persisted.
    pub relationships_created: u64,
    /// Properties moved into persisted entities.
    pub properties_set: u64,
}

impl ResultSetStats {
    /// Returns `true` when nothing was written.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Adds every counter of `other` to `self`.
    pub fn merge(&mut self, other: &ResultSetStats) {
        self.labels_added += other.labels_added;
        self.nodes_created += other.nodes_created;
        self.relationships_created += other.relationships_created;
        self.properties_set += other.properties_set;
    }
}

impl fmt::Display for ResultSetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Labels added: {}", self.labels_added)?;
        writeln!(f, "Nodes created: {}", self.nodes_created)?;
        writeln!(f, "Relationships created: {}", self.relationships_created)?;
        write!(f, "Properties set: {}", self.properties_set)
    }
}
