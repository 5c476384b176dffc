#![forbid(unsafe_code)]
//! Schema registry mapping label and relationship-type names to matrix classes.
//!
//! Entries are keyed by store kind, graph name and entry name. The entry with
//! no name is the per-graph "all" registry that accumulates every property
//! name seen for that kind.

use std::collections::hash_map::Entry;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::trace;

/// Which class of entity a schema entry describes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StoreKind {
    /// Node labels.
    Node,
    /// Relationship types.
    Edge,
}

impl StoreKind {
    fn as_str(self) -> &'static str {
        match self {
            StoreKind::Node => "node",
            StoreKind::Edge => "edge",
        }
    }
}

/// Registered label or relationship type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Label or relation-type name, `None` for the "all" entry.
    pub name: Option<String>,
    /// Matrix class id (label id or relation id).
    pub id: u32,
    properties: BTreeSet<String>,
}

impl SchemaEntry {
    /// Merges property names into the entry; known names are ignored.
    pub fn update_schema<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            if !self.properties.contains(name) {
                self.properties.insert(name.to_owned());
            }
        }
    }

    /// Property names known for this entry, sorted.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }

    /// Returns `true` when `name` has been registered.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }
}

/// Lookup counters for a [`SchemaRegistry`].
#[derive(Default)]
pub struct RegistryMetrics {
    lookup_calls: AtomicU64,
    lookup_hits: AtomicU64,
    lookup_misses: AtomicU64,
    creates: AtomicU64,
}

/// Point-in-time copy of [`RegistryMetrics`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistryMetricsSnapshot {
    /// Number of `lookup` calls.
    pub lookup_calls: u64,
    /// Lookups that found an entry.
    pub lookup_hits: u64,
    /// Lookups that found nothing.
    pub lookup_misses: u64,
    /// Entries created.
    pub creates: u64,
}

impl RegistryMetricsSnapshot {
    /// Fraction of lookups served by an existing entry.
    pub fn hit_rate(&self) -> f64 {
        if self.lookup_calls == 0 {
            return 0.0;
        }
        self.lookup_hits as f64 / self.lookup_calls as f64
    }
}

impl RegistryMetrics {
    /// Returns a snapshot of the counters.
    pub fn snapshot(&self) -> RegistryMetricsSnapshot {
        RegistryMetricsSnapshot {
            lookup_calls: self.lookup_calls.load(Ordering::Relaxed),
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            creates: self.creates.load(Ordering::Relaxed),
        }
    }

    fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

type Key = (StoreKind, String, Option<String>);

/// In-memory schema registry shared by every graph hosted in one process.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: FxHashMap<Key, SchemaEntry>,
    metrics: Arc<RegistryMetrics>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the lookup counters.
    pub fn metrics(&self) -> Arc<RegistryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Snapshot of the lookup counters.
    pub fn metrics_snapshot(&self) -> RegistryMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Looks up a named entry.
    pub fn lookup(
        &mut self,
        kind: StoreKind,
        graph: &str,
        name: &str,
    ) -> Option<&mut SchemaEntry> {
        self.metrics.inc(&self.metrics.lookup_calls);
        let key = (kind, graph.to_owned(), Some(name.to_owned()));
        match self.entries.get_mut(&key) {
            Some(entry) => {
                self.metrics.inc(&self.metrics.lookup_hits);
                trace!(kind = kind.as_str(), graph, name, id = entry.id, "schema.lookup.hit");
                Some(entry)
            }
            None => {
                self.metrics.inc(&self.metrics.lookup_misses);
                trace!(kind = kind.as_str(), graph, name, "schema.lookup.miss");
                None
            }
        }
    }

    /// Shared-access variant of [`SchemaRegistry::lookup`] for readers.
    pub fn get(&self, kind: StoreKind, graph: &str, name: &str) -> Option<&SchemaEntry> {
        self.metrics.inc(&self.metrics.lookup_calls);
        let key = (kind, graph.to_owned(), Some(name.to_owned()));
        let entry = self.entries.get(&key);
        match entry {
            Some(_) => self.metrics.inc(&self.metrics.lookup_hits),
            None => self.metrics.inc(&self.metrics.lookup_misses),
        }
        entry
    }

    /// Registers `name` with matrix class `id`, replacing any previous entry.
    pub fn create(&mut self, kind: StoreKind, graph: &str, name: &str, id: u32) -> &mut SchemaEntry {
        self.metrics.inc(&self.metrics.creates);
        trace!(kind = kind.as_str(), graph, name, id, "schema.create");
        let key = (kind, graph.to_owned(), Some(name.to_owned()));
        let entry = SchemaEntry {
            name: Some(name.to_owned()),
            id,
            properties: BTreeSet::new(),
        };
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    /// Returns the "all" entry for `kind` in `graph`, creating it on first use.
    pub fn all(&mut self, kind: StoreKind, graph: &str) -> &mut SchemaEntry {
        self.entries
            .entry((kind, graph.to_owned(), None))
            .or_insert_with(|| SchemaEntry {
                name: None,
                id: u32::MAX,
                properties: BTreeSet::new(),
            })
    }

    /// Name registered for class `id`, without touching the lookup counters.
    pub fn name_of(&self, kind: StoreKind, graph: &str, id: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|((k, g, name), entry)| {
                *k == kind && g == graph && name.is_some() && entry.id == id
            })
            .and_then(|(_, entry)| entry.name.as_deref())
    }

    /// Number of named entries of `kind` registered for `graph`.
    pub fn len(&self, kind: StoreKind, graph: &str) -> usize {
        self.entries
            .keys()
            .filter(|(k, g, name)| *k == kind && g == graph && name.is_some())
            .count()
    }

    /// Returns `true` when no named entry of `kind` exists for `graph`.
    pub fn is_empty(&self, kind: StoreKind, graph: &str) -> bool {
        self.len(kind, graph) == 0
    }
}
