#![forbid(unsafe_code)]

//! Query execution for the write path.
//!
//! This module turns a clause-level AST into a chain of pull-based operators,
//! runs it over an alias-indexed query graph and commits created entities to
//! the store in bulk.

/// Abstract syntax tree for `MATCH` / `CREATE` / `RETURN` queries.
///
/// Defines node and edge patterns with aliases, labels and property literals.
pub mod ast;

/// Execution operators.
///
/// The operator trait and its scan, create and projection implementations.
pub mod ops;

/// Execution plan assembly and driving.
pub mod plan;

/// Alias-indexed working set shared by the operators of one plan.
pub mod query_graph;

/// Write statistics.
pub mod stats;

/// Typed property values.
pub mod value;

pub use plan::{ExecutionPlan, ResultSet};
pub use query_graph::QueryGraph;
pub use stats::ResultSetStats;
pub use value::Value;
