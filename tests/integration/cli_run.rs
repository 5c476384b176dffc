#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const PATH_QUERY: &str = r#"{
    "create": {"pattern": {
        "nodes": [
            {"alias": "a", "label": "Person",
             "properties": [{"name": "name", "value": {"t": "String", "v": "Al"}}]},
            {"alias": "b", "label": "Person",
             "properties": [{"name": "name", "value": {"t": "String", "v": "Bo"}}]}
        ],
        "edges": [{"relationship": "KNOWS", "src": 0, "dest": 1}]
    }},
    "returns": ["a"]
}"#;

const FOLLOW_UP: &str = r#"[
    {"create": {"pattern": {"nodes": [{"alias": "c", "label": "City"}]}}},
    {
        "match": {"pattern": {"nodes": [{"alias": "c", "label": "City"}]}},
        "create": {"pattern": {
            "nodes": [{"alias": "c"}, {"alias": "m", "label": "Mayor"}],
            "edges": [{"relationship": "RUNS", "src": 1, "dest": 0}]
        }}
    }
]"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn config_file(dir: &Path) -> PathBuf {
    write_file(
        dir,
        "config.toml",
        "graph_name = \"cli_graph\"\ninitial_node_capacity = 8\nlog_filter = \"matrixgraph=warn\"\n",
    )
}

#[test]
fn run_json_reports_stats_and_rows() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_file(dir.path());
    let query = write_file(dir.path(), "path.json", PATH_QUERY);

    let output = cargo_bin_cmd!("matrixgraph")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "run", "--query"])
        .arg(&query)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).expect("json report");

    assert_eq!(report["graph"], "cli_graph");
    assert_eq!(report["node_count"], 2);
    assert_eq!(report["edge_count"], 1);
    let stats = &report["queries"][0]["stats"];
    assert_eq!(stats["nodes_created"], 2);
    assert_eq!(stats["relationships_created"], 1);
    assert_eq!(stats["labels_added"], 1);
    assert_eq!(report["queries"][0]["columns"][0], "a");
    assert_eq!(report["queries"][0]["rows"][0][0]["kind"], "node");
    assert_eq!(report["queries"][0]["rows"][0][0]["id"], 0);
}

#[test]
fn run_text_accumulates_over_query_array() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_file(dir.path());
    let query = write_file(dir.path(), "batch.json", FOLLOW_UP);

    let output = cargo_bin_cmd!("matrixgraph")
        .arg("--config")
        .arg(&config)
        .args(["run", "--graph", "towns", "--query"])
        .arg(&query)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");

    assert!(text.contains("Query 0:"), "stdout: {text}");
    assert!(text.contains("Query 1:"), "stdout: {text}");
    assert!(text.contains("Relationships created: 1"), "stdout: {text}");
    assert!(text.contains("Graph 'towns': 2 nodes, 1 edges"), "stdout: {text}");
}

#[test]
fn run_rejects_invalid_plan() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_file(dir.path());
    let query = write_file(
        dir.path(),
        "bad.json",
        r#"{"match": {"pattern": {"nodes": [{"alias": "a"}]}}, "create": {"pattern": {"nodes": [{"alias": "a"}]}}}"#,
    );

    let output = cargo_bin_cmd!("matrixgraph")
        .arg("--config")
        .arg(&config)
        .args(["run", "--query"])
        .arg(&query)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.contains("contract violation"), "stderr: {stderr}");
}

#[test]
fn config_prints_and_writes_effective_settings() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_file(dir.path());

    let output = cargo_bin_cmd!("matrixgraph")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "config"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json config");
    assert_eq!(json["graph_name"], "cli_graph");
    assert_eq!(json["initial_node_capacity"], 8);
    assert_eq!(json["collect_metrics"], false);

    let target = dir.path().join("nested").join("written.toml");
    cargo_bin_cmd!("matrixgraph")
        .arg("--config")
        .arg(&target)
        .args(["config", "--write"])
        .assert()
        .success();
    let written = fs::read_to_string(&target).expect("written config");
    assert!(written.contains("graph_name = \"default\""), "{written}");
}
