//! Clause-level abstract syntax tree consumed by the write path.
//!
//! Only the shape the execution plan needs is modelled: the node and edge
//! patterns of a `MATCH` clause and of a `CREATE` clause, plus the aliases to
//! return. Edge patterns refer to their endpoints by position in the
//! pattern's node list so anonymous endpoints can be expressed.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::storage::PropertySet;
use crate::types::{GraphError, Result};

/// Identifier assigned to a binding (node or edge) within the query.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Var(pub String);

impl Var {
    /// Creates a variable from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Var(name.into())
    }

    /// Borrowed name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Node pattern such as `(a:Person {name: "Al"})`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePattern {
    /// Variable binding, `None` for anonymous nodes.
    #[serde(default)]
    pub alias: Option<Var>,
    /// Optional label.
    #[serde(default)]
    pub label: Option<String>,
    /// Property literals.
    #[serde(default)]
    pub properties: PropertySet,
}

impl NodePattern {
    /// Creates a node pattern bound to `alias`.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(Var::new(alias)),
            ..Self::default()
        }
    }

    /// Creates an anonymous node pattern.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a property literal.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<super::Value>) -> Self {
        self.properties.set(name, value);
        self
    }
}

/// Directed edge pattern such as `(a)-[r:KNOWS]->(b)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgePattern {
    /// Variable binding, `None` for anonymous edges.
    #[serde(default)]
    pub alias: Option<Var>,
    /// Optional relationship type.
    #[serde(default)]
    pub relationship: Option<String>,
    /// Index of the source node in the enclosing pattern.
    pub src: usize,
    /// Index of the destination node in the enclosing pattern.
    pub dest: usize,
    /// Property literals.
    #[serde(default)]
    pub properties: PropertySet,
}

impl EdgePattern {
    /// Creates an anonymous edge between two node positions.
    pub fn new(src: usize, dest: usize) -> Self {
        Self {
            alias: None,
            relationship: None,
            src,
            dest,
            properties: PropertySet::new(),
        }
    }

    /// Sets the variable binding.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(Var::new(alias));
        self
    }

    /// Sets the relationship type.
    pub fn relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    /// Adds a property literal.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<super::Value>) -> Self {
        self.properties.set(name, value);
        self
    }
}

/// Pattern made of nodes and the edges connecting them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Node patterns; the same alias may appear more than once.
    #[serde(default)]
    pub nodes: Vec<NodePattern>,
    /// Edge patterns referring to positions in `nodes`.
    #[serde(default)]
    pub edges: Vec<EdgePattern>,
}

impl Pattern {
    /// Creates an empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node pattern and returns its position.
    pub fn push_node(&mut self, node: NodePattern) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends an edge pattern.
    pub fn push_edge(&mut self, edge: EdgePattern) {
        self.edges.push(edge);
    }

    /// Alias of the node at `index`.
    ///
    /// Fails when the position is out of range or the node is still anonymous.
    pub fn node_alias(&self, index: usize) -> Result<&str> {
        let node = self
            .nodes
            .get(index)
            .ok_or(GraphError::Invalid("edge endpoint index out of range"))?;
        node.alias
            .as_ref()
            .map(Var::as_str)
            .ok_or(GraphError::Contract("pattern node has no alias"))
    }

    /// Iterates over every alias bound in the pattern, nodes first.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter_map(|n| n.alias.as_ref())
            .chain(self.edges.iter().filter_map(|e| e.alias.as_ref()))
            .map(Var::as_str)
    }

    fn name_anonymous(&mut self, next: &mut usize, taken: &FxHashSet<String>) {
        let slots = self
            .nodes
            .iter_mut()
            .map(|n| &mut n.alias)
            .chain(self.edges.iter_mut().map(|e| &mut e.alias));
        for alias in slots {
            if alias.is_some() {
                continue;
            }
            let mut candidate = format!("anon_{next}");
            *next += 1;
            while taken.contains(&candidate) {
                candidate = format!("anon_{next}");
                *next += 1;
            }
            *alias = Some(Var(candidate));
        }
    }
}

/// `MATCH` clause.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    /// Matched pattern.
    pub pattern: Pattern,
}

/// `CREATE` clause.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClause {
    /// Pattern to materialise.
    pub pattern: Pattern,
}

/// Whole query as seen by the execution plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryAst {
    /// Optional `MATCH` clause.
    #[serde(default, rename = "match")]
    pub match_clause: Option<MatchClause>,
    /// Optional `CREATE` clause.
    #[serde(default)]
    pub create: Option<CreateClause>,
    /// Aliases to project into result rows.
    #[serde(default)]
    pub returns: Vec<Var>,
}

impl QueryAst {
    /// Gives every anonymous entity a generated alias (`anon_0`, `anon_1`, ...).
    ///
    /// Numbering runs over the `MATCH` pattern first, then the `CREATE`
    /// pattern, so repeated calls are stable and no-ops after the first.
    /// Numbers whose alias is already written in either clause are skipped.
    pub fn name_anonymous_entities(&mut self) {
        let taken: FxHashSet<String> = self
            .patterns()
            .flat_map(|pattern| pattern.aliases())
            .map(str::to_owned)
            .collect();
        let mut next = 0usize;
        if let Some(clause) = self.match_clause.as_mut() {
            clause.pattern.name_anonymous(&mut next, &taken);
        }
        if let Some(clause) = self.create.as_mut() {
            clause.pattern.name_anonymous(&mut next, &taken);
        }
    }

    fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.match_clause
            .iter()
            .map(|c| &c.pattern)
            .chain(self.create.iter().map(|c| &c.pattern))
    }
}
