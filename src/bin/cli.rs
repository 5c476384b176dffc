//! Binary entry point for the matrixgraph CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use matrixgraph::logging::init_logging;
use matrixgraph::query::ast::QueryAst;
use matrixgraph::storage::GraphOptions;
use matrixgraph::{EngineConfig, ExecutionPlan, GraphContext, ResultSet, ResultSetStats};

#[derive(Parser, Debug)]
#[command(
    name = "matrixgraph",
    version,
    about = "Run CREATE/MATCH queries against an in-memory matrix graph",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "MATRIXGRAPH_CONFIG",
        help = "Configuration file (defaults to the per-user config path)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Execute a JSON-encoded query (or array of queries) against a fresh graph")]
    Run {
        #[arg(long, value_name = "FILE", help = "JSON file holding the query AST")]
        query: PathBuf,

        #[arg(long, help = "Override the configured graph name")]
        graph: Option<String>,
    },

    #[command(about = "Print the effective configuration as TOML")]
    Config {
        #[arg(long, help = "Also write the configuration to the config path")]
        write: bool,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryFile {
    Many(Vec<QueryAst>),
    One(QueryAst),
}

#[derive(Serialize)]
struct RunReport {
    graph: String,
    queries: Vec<ResultSet>,
    totals: ResultSetStats,
    node_count: u64,
    edge_count: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.clone())?;
    if let Err(err) = init_logging(&config.log_filter) {
        eprintln!("warning: {err}");
    }

    match cli.command {
        Command::Run { query, graph } => {
            let report = run_queries(&config, &query, graph)?;
            emit(&cli.format, &report, |_| print_run_text(&report))?;
        }
        Command::Config { write } => {
            let rendered = config.to_toml()?;
            emit(&cli.format, &config, |_| print!("{rendered}"))?;
            if write {
                let path = config.persist(cli.config.as_deref())?;
                eprintln!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn run_queries(
    config: &EngineConfig,
    path: &Path,
    graph_name: Option<String>,
) -> Result<RunReport, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let queries = match serde_json::from_str::<QueryFile>(&contents)? {
        QueryFile::Many(queries) => queries,
        QueryFile::One(query) => vec![query],
    };
    let name = graph_name.unwrap_or_else(|| config.graph_name.clone());
    let graph = Arc::new(GraphContext::new(name.clone(), GraphOptions::from(config)));

    let mut results = Vec::with_capacity(queries.len());
    let mut totals = ResultSetStats::default();
    for (index, ast) in queries.into_iter().enumerate() {
        let plan = ExecutionPlan::new(Arc::clone(&graph), ast)?;
        let result = plan.execute()?;
        info!(query = index, nodes = result.stats.nodes_created, "cli.query");
        totals.merge(&result.stats);
        results.push(result);
    }

    let store = graph.graph().read();
    Ok(RunReport {
        graph: name,
        queries: results,
        totals,
        node_count: store.node_count(),
        edge_count: store.edge_count(),
    })
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_run_text(report: &RunReport) {
    for (index, result) in report.queries.iter().enumerate() {
        println!("Query {index}:");
        for line in result.stats.to_string().lines() {
            println!("  {line}");
        }
        if !result.columns.is_empty() {
            println!("  Columns: {}", result.columns.join(", "));
            for row in &result.rows {
                match serde_json::to_string(row) {
                    Ok(json) => println!("  {json}"),
                    Err(err) => println!("  <unprintable row: {err}>"),
                }
            }
        }
    }
    println!(
        "Graph '{}': {} nodes, {} edges",
        report.graph, report.node_count, report.edge_count
    );
}
