//! Execution plan assembly and driving.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, warn};

use super::ast::QueryAst;
use super::ops::{
    resolve_row, BoxOperator, CreateOp, ExecutionContext, GraphContext, NodeScan, OpStatus,
    ProduceResults, ResultRow, SingleRow,
};
use super::query_graph::QueryGraph;
use super::stats::ResultSetStats;
use crate::types::{GraphError, Result};

/// Output of one executed query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Projected aliases.
    pub columns: Vec<String>,
    /// Projected rows.
    pub rows: Vec<ResultRow>,
    /// Write statistics.
    pub stats: ResultSetStats,
}

/// Operator tree plus the context it runs in.
///
/// The tree is a chain: one [`NodeScan`] per distinct `MATCH` alias, then a
/// [`CreateOp`] when the query has a `CREATE` clause, then
/// [`ProduceResults`] when it returns aliases.
pub struct ExecutionPlan {
    root: BoxOperator,
    ctx: ExecutionContext,
    columns: Vec<String>,
    operators: Vec<&'static str>,
}

impl ExecutionPlan {
    /// Builds the plan for `ast` against `graph`.
    pub fn new(graph: Arc<GraphContext>, mut ast: QueryAst) -> Result<Self> {
        ast.name_anonymous_entities();
        let query_graph = QueryGraph::build(ast.match_clause.as_ref(), ast.create.as_ref())?;
        let mut operators = Vec::new();
        let mut root: Option<BoxOperator> = None;

        if let Some(clause) = ast.match_clause.as_ref() {
            if !clause.pattern.edges.is_empty() {
                return Err(GraphError::Invalid("edge patterns in MATCH are not supported"));
            }
            let mut seen = FxHashSet::default();
            for node in &clause.pattern.nodes {
                let Some(alias) = node.alias.as_ref().map(|var| var.as_str()) else {
                    return Err(GraphError::Contract("pattern node has no alias"));
                };
                if !seen.insert(alias) {
                    continue;
                }
                let scan = NodeScan::new(&query_graph, alias, node.label.clone(), root.take())?
                    .with_filter(node.properties.clone());
                operators.push("NodeScan");
                root = Some(Box::new(scan));
            }
        }

        if let Some(create) = ast.create.as_ref() {
            if root.is_none() && !ast.returns.is_empty() {
                operators.push("SingleRow");
                root = Some(Box::new(SingleRow::default()));
            }
            let op = CreateOp::new(&query_graph, create, ast.match_clause.as_ref(), root.take())?;
            operators.push("Create");
            root = Some(Box::new(op));
        }

        let columns: Vec<String> = ast.returns.iter().map(|var| var.0.clone()).collect();
        if !columns.is_empty() {
            let child = root
                .take()
                .ok_or(GraphError::Contract("RETURN needs a MATCH or CREATE clause"))?;
            operators.push("ProduceResults");
            root = Some(Box::new(ProduceResults::new(&query_graph, &columns, child)?));
        }

        let root = root.ok_or(GraphError::Contract("query has no clauses"))?;
        debug!(operators = ?operators, graph = graph.name(), "plan.built");
        Ok(Self {
            root,
            ctx: ExecutionContext::new(graph, query_graph),
            columns,
            operators,
        })
    }

    /// Operator names from the leaf up to the root.
    pub fn operators(&self) -> &[&'static str] {
        &self.operators
    }

    /// Drives the plan to depletion and closes it.
    ///
    /// The tree is closed even when a row fails, so rows produced before the
    /// failure are still committed; the failure is returned afterwards.
    pub fn execute(mut self) -> Result<ResultSet> {
        let driven = self.drive();
        let closed = self.root.close(&mut self.ctx);
        if let Err(err) = &driven {
            warn!(error = %err, root = self.root.name(), "plan.aborted");
        }
        let rows = driven?;
        closed?;

        let store = self.ctx.graph.graph().read();
        let rows_out: Vec<ResultRow> = self
            .ctx
            .records
            .iter()
            .map(|record| resolve_row(&self.ctx.query_graph, &store, record))
            .collect();
        debug!(rows, stats = ?self.ctx.stats, "plan.finished");
        Ok(ResultSet {
            columns: self.columns,
            rows: rows_out,
            stats: self.ctx.stats,
        })
    }

    fn drive(&mut self) -> Result<u64> {
        let mut rows = 0u64;
        while self.root.consume(&mut self.ctx)? == OpStatus::Ready {
            rows += 1;
        }
        Ok(rows)
    }
}
