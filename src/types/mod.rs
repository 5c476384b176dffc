#![forbid(unsafe_code)]
//! Identifier newtypes and the crate-wide error type.

use std::fmt;

/// Dense identifier of a persisted node.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u64);

/// Identifier of a persisted edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u64);

/// Identifier of a label class (one label matrix per id).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct LabelId(pub u32);

/// Identifier of a relationship-type class (one relation matrix per id).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RelationId(pub u32);

impl LabelId {
    /// Reserved id for nodes created without a label.
    pub const NONE: LabelId = LabelId(u32::MAX);

    /// Returns `true` unless this is [`LabelId::NONE`].
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

impl RelationId {
    /// Reserved id for edges created without a relationship type.
    pub const NONE: RelationId = RelationId(u32::MAX);

    /// Returns `true` unless this is [`RelationId::NONE`].
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Identity state of an entity held by the query graph.
///
/// Entities named by a pattern start `Unbound`. Entities instantiated by a
/// write operator carry a `Provisional` id until the commit assigns the final
/// `Persisted` id; entities bound from the store are `Persisted` from the start.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum EntityId {
    /// Not yet associated with any stored entity.
    #[default]
    Unbound,
    /// Placeholder id handed out before commit.
    Provisional(u64),
    /// Final id assigned by the store.
    Persisted(u64),
}

impl EntityId {
    /// Returns the numeric id, provisional or persisted.
    pub fn raw(self) -> Option<u64> {
        match self {
            EntityId::Unbound => None,
            EntityId::Provisional(id) | EntityId::Persisted(id) => Some(id),
        }
    }

    /// Returns the persisted id, if any.
    pub fn persisted(self) -> Option<u64> {
        match self {
            EntityId::Persisted(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == LabelId::NONE {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == RelationId::NONE {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Unbound => write!(f, "unbound"),
            EntityId::Provisional(id) => write!(f, "provisional({id})"),
            EntityId::Persisted(id) => write!(f, "{id}"),
        }
    }
}

impl From<u32> for LabelId {
    fn from(value: u32) -> Self {
        LabelId(value)
    }
}

impl From<LabelId> for u32 {
    fn from(value: LabelId) -> Self {
        value.0
    }
}

impl From<u32> for RelationId {
    fn from(value: u32) -> Self {
        RelationId(value)
    }
}

impl From<RelationId> for u32 {
    fn from(value: RelationId) -> Self {
        value.0
    }
}

/// Errors surfaced by the store, the query graph and the operators.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    /// IO failure (configuration files, CLI input).
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// JSON payload could not be decoded.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// The plan handed to an operator violates its construction contract.
    #[error("contract violation: {0}")]
    Contract(&'static str),
    /// An alias was inserted twice into the same query graph.
    #[error("alias '{0}' already bound in query graph")]
    DuplicateAlias(String),
    /// An alias lookup failed.
    #[error("unknown alias '{0}'")]
    UnknownAlias(String),
    /// An edge refers to an endpoint that is not part of the query graph.
    #[error("edge '{edge}' endpoint '{endpoint}' missing from query graph")]
    MissingEndpoint {
        /// Alias of the edge being connected.
        edge: String,
        /// Alias of the endpoint that could not be found.
        endpoint: String,
    },
    /// Invalid argument handed to the store.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Error reported by an upstream operator.
    #[error("upstream operator failed: {0}")]
    Upstream(String),
    /// Requested entity does not exist.
    #[error("not found")]
    NotFound,
    /// Subscriber installation failed.
    #[error("logging: {0}")]
    Logging(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;
