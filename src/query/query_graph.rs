//! Alias-indexed working set of one query execution.
//!
//! Entities live in append-only arenas addressed by [`NodeKey`] / [`EdgeKey`].
//! Each alias owns one slot ([`NodeSlot`] / [`EdgeSlot`]) that points at an
//! arena entry. Replacing the entity behind an alias rewrites the slot, so
//! every holder of the slot handle observes the replacement without another
//! alias lookup, while edges keep referring to the exact arena entries they
//! were built from.

use rustc_hash::FxHashMap;

use super::ast::{CreateClause, MatchClause, Pattern};
use crate::storage::PropertySet;
use crate::types::{EntityId, GraphError, Result};

/// Stable address of a node in the arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeKey(usize);

/// Stable address of an edge in the arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EdgeKey(usize);

/// Alias slot holding the current node for one alias.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeSlot(usize);

/// Alias slot holding the current edge for one alias.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EdgeSlot(usize);

/// Node handle held by the query graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    /// Identity state.
    pub id: EntityId,
    /// Label name.
    pub label: Option<String>,
    /// Properties; emptied once moved into the store at commit.
    pub properties: PropertySet,
}

impl Node {
    /// Creates an unbound node.
    pub fn new(label: Option<String>, properties: PropertySet) -> Self {
        Self {
            id: EntityId::Unbound,
            label,
            properties,
        }
    }
}

/// Edge handle held by the query graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Identity state.
    pub id: EntityId,
    /// Relationship type name.
    pub relationship: Option<String>,
    /// Source node entry.
    pub src: NodeKey,
    /// Destination node entry.
    pub dest: NodeKey,
    /// Properties; emptied once moved into the store at commit.
    pub properties: PropertySet,
}

impl Edge {
    /// Creates an unbound edge between two node entries.
    pub fn new(
        src: NodeKey,
        dest: NodeKey,
        relationship: Option<String>,
        properties: PropertySet,
    ) -> Self {
        Self {
            id: EntityId::Unbound,
            relationship,
            src,
            dest,
            properties,
        }
    }
}

/// Entity returned by [`QueryGraph::entity_by_alias`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EntityRef<'a> {
    /// Alias names a node.
    Node(&'a Node),
    /// Alias names an edge.
    Edge(&'a Edge),
}

/// Mapping from aliases to the entities currently bound to them.
#[derive(Clone, Debug, Default)]
pub struct QueryGraph {
    node_arena: Vec<Node>,
    edge_arena: Vec<Edge>,
    node_slots: Vec<NodeKey>,
    edge_slots: Vec<EdgeKey>,
    node_aliases: FxHashMap<String, NodeSlot>,
    edge_aliases: FxHashMap<String, EdgeSlot>,
    node_slot_names: Vec<String>,
    edge_slot_names: Vec<String>,
}

impl QueryGraph {
    /// Creates an empty query graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the placeholder graph for a query.
    ///
    /// Aliases of the `MATCH` pattern are added before those of the `CREATE`
    /// pattern and nodes before edges; an alias named by both clauses keeps
    /// the entity declared by the `MATCH` clause. Anonymous entities must have
    /// been named beforehand with [`super::ast::QueryAst::name_anonymous_entities`].
    pub fn build(match_clause: Option<&MatchClause>, create: Option<&CreateClause>) -> Result<Self> {
        let patterns: Vec<&Pattern> = match_clause
            .map(|c| &c.pattern)
            .into_iter()
            .chain(create.map(|c| &c.pattern))
            .collect();
        let mut graph = QueryGraph::new();
        for pattern in &patterns {
            for node in &pattern.nodes {
                let alias = node
                    .alias
                    .as_ref()
                    .ok_or(GraphError::Contract("pattern node has no alias"))?;
                if graph.node_ref(alias.as_str()).is_some() {
                    continue;
                }
                graph.add_node(
                    alias.as_str(),
                    Node::new(node.label.clone(), node.properties.clone()),
                )?;
            }
        }
        for pattern in &patterns {
            for edge in &pattern.edges {
                let alias = edge
                    .alias
                    .as_ref()
                    .ok_or(GraphError::Contract("pattern edge has no alias"))?;
                if graph.edge_ref(alias.as_str()).is_some() {
                    continue;
                }
                let src = graph.endpoint(pattern, edge.src, alias.as_str())?;
                let dest = graph.endpoint(pattern, edge.dest, alias.as_str())?;
                graph.connect_nodes(
                    Edge::new(src, dest, edge.relationship.clone(), edge.properties.clone()),
                    alias.as_str(),
                )?;
            }
        }
        Ok(graph)
    }

    fn endpoint(&self, pattern: &Pattern, index: usize, edge: &str) -> Result<NodeKey> {
        let alias = pattern.node_alias(index)?;
        self.node_ref(alias)
            .map(|slot| self.node_key(slot))
            .ok_or_else(|| GraphError::MissingEndpoint {
                edge: edge.to_owned(),
                endpoint: alias.to_owned(),
            })
    }

    /// Inserts `node` under a new alias.
    pub fn add_node(&mut self, alias: impl Into<String>, node: Node) -> Result<NodeSlot> {
        let alias = alias.into();
        self.check_unique(&alias)?;
        let key = self.alloc_node(node);
        let slot = NodeSlot(self.node_slots.len());
        self.node_slots.push(key);
        self.node_slot_names.push(alias.clone());
        self.node_aliases.insert(alias, slot);
        Ok(slot)
    }

    /// Inserts `edge` under a new alias; both endpoints must be bound in this graph.
    pub fn connect_nodes(&mut self, edge: Edge, alias: impl Into<String>) -> Result<EdgeSlot> {
        let alias = alias.into();
        self.check_unique(&alias)?;
        for endpoint in [edge.src, edge.dest] {
            if !self.contains_node(endpoint) {
                return Err(GraphError::MissingEndpoint {
                    edge: alias,
                    endpoint: format!("#{}", endpoint.0),
                });
            }
        }
        let key = self.alloc_edge(edge);
        let slot = EdgeSlot(self.edge_slots.len());
        self.edge_slots.push(key);
        self.edge_slot_names.push(alias.clone());
        self.edge_aliases.insert(alias, slot);
        Ok(slot)
    }

    fn check_unique(&self, alias: &str) -> Result<()> {
        if self.node_aliases.contains_key(alias) || self.edge_aliases.contains_key(alias) {
            return Err(GraphError::DuplicateAlias(alias.to_owned()));
        }
        Ok(())
    }

    /// Stores a node in the arena without binding it to an alias.
    pub fn alloc_node(&mut self, node: Node) -> NodeKey {
        self.node_arena.push(node);
        NodeKey(self.node_arena.len() - 1)
    }

    /// Stores an edge in the arena without binding it to an alias.
    pub fn alloc_edge(&mut self, edge: Edge) -> EdgeKey {
        self.edge_arena.push(edge);
        EdgeKey(self.edge_arena.len() - 1)
    }

    /// Slot bound to a node alias.
    pub fn node_ref(&self, alias: &str) -> Option<NodeSlot> {
        self.node_aliases.get(alias).copied()
    }

    /// Slot bound to an edge alias.
    pub fn edge_ref(&self, alias: &str) -> Option<EdgeSlot> {
        self.edge_aliases.get(alias).copied()
    }

    /// Arena entry a node slot currently points at.
    pub fn node_key(&self, slot: NodeSlot) -> NodeKey {
        self.node_slots[slot.0]
    }

    /// Arena entry an edge slot currently points at.
    pub fn edge_key(&self, slot: EdgeSlot) -> EdgeKey {
        self.edge_slots[slot.0]
    }

    /// Rebinds a node slot to another arena entry.
    pub fn set_node_slot(&mut self, slot: NodeSlot, key: NodeKey) {
        self.node_slots[slot.0] = key;
    }

    /// Rebinds an edge slot to another arena entry.
    pub fn set_edge_slot(&mut self, slot: EdgeSlot, key: EdgeKey) {
        self.edge_slots[slot.0] = key;
    }

    /// Alias owning a node slot.
    pub fn node_alias(&self, slot: NodeSlot) -> &str {
        &self.node_slot_names[slot.0]
    }

    /// Alias owning an edge slot.
    pub fn edge_alias(&self, slot: EdgeSlot) -> &str {
        &self.edge_slot_names[slot.0]
    }

    /// Node stored at `key`.
    pub fn node(&self, key: NodeKey) -> &Node {
        &self.node_arena[key.0]
    }

    /// Mutable node stored at `key`.
    pub fn node_mut(&mut self, key: NodeKey) -> &mut Node {
        &mut self.node_arena[key.0]
    }

    /// Edge stored at `key`.
    pub fn edge(&self, key: EdgeKey) -> &Edge {
        &self.edge_arena[key.0]
    }

    /// Mutable edge stored at `key`.
    pub fn edge_mut(&mut self, key: EdgeKey) -> &mut Edge {
        &mut self.edge_arena[key.0]
    }

    /// Node currently bound to `alias`.
    pub fn get_node_by_alias(&self, alias: &str) -> Option<&Node> {
        self.node_ref(alias).map(|slot| self.node(self.node_key(slot)))
    }

    /// Edge currently bound to `alias`.
    pub fn get_edge_by_alias(&self, alias: &str) -> Option<&Edge> {
        self.edge_ref(alias).map(|slot| self.edge(self.edge_key(slot)))
    }

    /// Node or edge currently bound to `alias`.
    pub fn entity_by_alias(&self, alias: &str) -> Option<EntityRef<'_>> {
        self.get_node_by_alias(alias)
            .map(EntityRef::Node)
            .or_else(|| self.get_edge_by_alias(alias).map(EntityRef::Edge))
    }

    /// Returns `true` when some alias is currently bound to the node entry `key`.
    pub fn contains_node(&self, key: NodeKey) -> bool {
        self.node_slots.contains(&key)
    }

    /// Returns `true` when some alias is currently bound to the edge entry `key`.
    pub fn contains_edge(&self, key: EdgeKey) -> bool {
        self.edge_slots.contains(&key)
    }

    /// Number of node aliases.
    pub fn node_count(&self) -> usize {
        self.node_slots.len()
    }

    /// Number of edge aliases.
    pub fn edge_count(&self) -> usize {
        self.edge_slots.len()
    }
}
