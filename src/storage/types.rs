use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::Value;
use crate::types::{EdgeId, LabelId, NodeId, RelationId};

/// Named property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property key.
    pub name: String,
    /// Property value.
    pub value: Value,
}

impl Property {
    /// Creates a new property entry.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered set of properties; names are unique and keep insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet {
    entries: Vec<Property>,
}

impl PropertySet {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a property, keeping the original position on overwrite.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Property { name, value }),
        }
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the set holds no property.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.entries.iter()
    }

    /// Iterates over the property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }
}

impl FromIterator<Property> for PropertySet {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for prop in iter {
            set.set(prop.name, prop.value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, prop) in self.entries.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", prop.name, prop.value)?;
        }
        write!(f, "}}")
    }
}

/// Persisted node row.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    /// Final node id.
    pub id: NodeId,
    /// Label class, [`LabelId::NONE`] when unlabeled.
    pub label: LabelId,
    /// Owned property set.
    pub properties: PropertySet,
}

/// Persisted edge row.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    /// Final edge id.
    pub id: EdgeId,
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dest: NodeId,
    /// Relation class, [`RelationId::NONE`] when untyped.
    pub relation: RelationId,
    /// Owned property set.
    pub properties: PropertySet,
}

/// Flat `(source, destination, relation)` encoding used for bulk connects.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Triple {
    /// Source node id.
    pub src: NodeId,
    /// Destination node id.
    pub dest: NodeId,
    /// Relation class of the new edge.
    pub relation: RelationId,
}

impl Triple {
    /// Creates a new triple.
    pub fn new(src: NodeId, dest: NodeId, relation: RelationId) -> Self {
        Self {
            src,
            dest,
            relation,
        }
    }
}
