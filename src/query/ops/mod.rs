//! Pull-based operators making up an execution tree.
//!
//! Every operator owns its child (if any) as a boxed [`Operator`] and pulls one
//! row at a time from it. Rows are not materialised: an operator that produces
//! a row does so by rebinding aliases in the shared [`QueryGraph`] carried by
//! the [`ExecutionContext`].

mod create;
mod produce;
mod scan;

use std::sync::Arc;

use parking_lot::RwLock;

use super::query_graph::QueryGraph;
use super::stats::ResultSetStats;
use crate::storage::catalog::SchemaRegistry;
use crate::storage::{Graph, GraphOptions};
use crate::types::Result;

pub use create::{CreateOp, EdgeCreateCtx, NodeCreateCtx};
pub use produce::{resolve_row, Binding, ProduceResults, ResultRow, RowValue};
pub use scan::NodeScan;

/// Outcome of one [`Operator::consume`] call; errors travel as `Err`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpStatus {
    /// A row was produced.
    Ready,
    /// No more rows.
    Depleted,
}

/// Node of an execution tree.
pub trait Operator: Send {
    /// Short operator name used in logs.
    fn name(&self) -> &'static str;

    /// Pulls the next row.
    fn consume(&mut self, ctx: &mut ExecutionContext) -> Result<OpStatus>;

    /// Rewinds the operator so it can be driven again.
    fn reset(&mut self, ctx: &mut ExecutionContext) -> Result<()>;

    /// Releases the operator; called once when the plan is torn down.
    fn close(&mut self, ctx: &mut ExecutionContext) -> Result<()>;
}

/// Boxed operator as stored in an execution tree.
pub type BoxOperator = Box<dyn Operator>;

/// A named graph together with its schema registry.
pub struct GraphContext {
    name: String,
    graph: RwLock<Graph>,
    schema: RwLock<SchemaRegistry>,
}

impl GraphContext {
    /// Opens an empty graph called `name`.
    pub fn new(name: impl Into<String>, opts: GraphOptions) -> Self {
        Self {
            name: name.into(),
            graph: RwLock::new(Graph::open(opts)),
            schema: RwLock::new(SchemaRegistry::new()),
        }
    }

    /// Graph name used to key schema entries.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock guarding the store.
    pub fn graph(&self) -> &RwLock<Graph> {
        &self.graph
    }

    /// Lock guarding the schema registry.
    pub fn schema(&self) -> &RwLock<SchemaRegistry> {
        &self.schema
    }
}

/// State shared by every operator of one running plan.
pub struct ExecutionContext {
    /// Target graph.
    pub graph: Arc<GraphContext>,
    /// Alias bindings of the running query.
    pub query_graph: QueryGraph,
    /// Write statistics.
    pub stats: ResultSetStats,
    /// Rows captured by [`ProduceResults`], resolved once the plan is closed.
    pub records: Vec<Vec<Binding>>,
}

impl ExecutionContext {
    /// Creates a context over `graph` with the given query graph.
    pub fn new(graph: Arc<GraphContext>, query_graph: QueryGraph) -> Self {
        Self {
            graph,
            query_graph,
            stats: ResultSetStats::default(),
            records: Vec::new(),
        }
    }
}

/// Yields exactly one empty row; feeds write operators that project results
/// without a `MATCH` clause.
#[derive(Debug, Default)]
pub struct SingleRow {
    done: bool,
}

impl Operator for SingleRow {
    fn name(&self) -> &'static str {
        "SingleRow"
    }

    fn consume(&mut self, _ctx: &mut ExecutionContext) -> Result<OpStatus> {
        if self.done {
            return Ok(OpStatus::Depleted);
        }
        self.done = true;
        Ok(OpStatus::Ready)
    }

    fn reset(&mut self, _ctx: &mut ExecutionContext) -> Result<()> {
        self.done = false;
        Ok(())
    }

    fn close(&mut self, _ctx: &mut ExecutionContext) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::GraphError;

    /// Operator replaying a fixed list of outcomes, then reporting depletion.
    pub(crate) struct Scripted {
        pub(crate) script: Vec<Result<OpStatus>>,
        pub(crate) pulls: usize,
    }

    impl Scripted {
        pub(crate) fn rows(n: usize) -> Self {
            Self::new((0..n).map(|_| Ok(OpStatus::Ready)).collect())
        }

        pub(crate) fn new(script: Vec<Result<OpStatus>>) -> Self {
            Self {
                script,
                pulls: 0,
            }
        }

        pub(crate) fn failing_after(n: usize) -> Self {
            let mut script: Vec<Result<OpStatus>> = (0..n).map(|_| Ok(OpStatus::Ready)).collect();
            script.push(Err(GraphError::Upstream("scripted failure".into())));
            Self::new(script)
        }
    }

    impl Operator for Scripted {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn consume(&mut self, _ctx: &mut ExecutionContext) -> Result<OpStatus> {
            let idx = self.pulls;
            self.pulls += 1;
            if idx < self.script.len() {
                std::mem::replace(&mut self.script[idx], Ok(OpStatus::Depleted))
            } else {
                Ok(OpStatus::Depleted)
            }
        }

        fn reset(&mut self, _ctx: &mut ExecutionContext) -> Result<()> {
            Ok(())
        }

        fn close(&mut self, _ctx: &mut ExecutionContext) -> Result<()> {
            Ok(())
        }
    }
}
