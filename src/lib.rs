//! Matrix-backed property graph with a bulk-committing `CREATE` write path.
//!
//! Queries are expressed as a clause-level AST ([`query::ast::QueryAst`]) and
//! executed by [`query::ExecutionPlan`] against a [`query::ops::GraphContext`].
//! Created nodes and edges are staged per row in the query graph and written
//! to the [`storage::Graph`] in one batch when the plan closes.

#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod query;
pub mod storage;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use query::ops::GraphContext;
pub use query::{ExecutionPlan, ResultSet, ResultSetStats};
pub use types::{GraphError, Result};
