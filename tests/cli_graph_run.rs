use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "modsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn graph_run_completes_a_two_module_chain() {
    let dir = unique_temp_dir("graph-run-chain");
    let spec = write_file(
        &dir,
        "sim.json",
        r#"
{
    "schema_version": 1,
    "steps": 20,
    "modules": [
        { "name": "src", "kind": "counter", "outputs": 4 },
        { "name": "dst", "kind": "relay", "inputs": 4, "outputs": 4 }
    ],
    "connections": [
        { "src": "src", "dst": "dst", "links": [[0, 0], [1, 1], [2, 2], [3, 3]] }
    ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_graph_run"))
        .args(["--spec", spec.to_str().unwrap()])
        .output()
        .expect("run graph_run");
    assert!(
        output.status.success(),
        "graph_run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("run_done steps=20 modules=2 completed=2"),
        "unexpected stdout: {stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn graph_run_steps_flag_overrides_the_spec() {
    let dir = unique_temp_dir("graph-run-steps");
    let spec = write_file(
        &dir,
        "sim.json",
        r#"
{
    "schema_version": 1,
    "steps": 1000,
    "modules": [ { "name": "solo", "kind": "counter", "outputs": 1 } ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_graph_run"))
        .args(["--spec", spec.to_str().unwrap(), "--steps", "3"])
        .output()
        .expect("run graph_run");
    assert!(
        output.status.success(),
        "graph_run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("run_done steps=3 modules=1 completed=1"),
        "unexpected stdout: {stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn graph_run_writes_routing_json_into_the_debug_dir() {
    let dir = unique_temp_dir("graph-run-debug");
    let spec = write_file(
        &dir,
        "sim.json",
        r#"
{
    "schema_version": 1,
    "steps": 1,
    "modules": [
        { "name": "src", "kind": "counter", "outputs": 2 },
        { "name": "dst", "kind": "relay", "inputs": 2, "outputs": 2 }
    ],
    "connections": [
        { "src": "src", "dst": "dst", "links": [[0, 0], [1, 1]] }
    ]
}
        "#,
    );
    let debug_dir = dir.join("debug");

    let output = Command::new(env!("CARGO_BIN_EXE_graph_run"))
        .args([
            "--spec",
            spec.to_str().unwrap(),
            "--debug-dir",
            debug_dir.to_str().unwrap(),
        ])
        .output()
        .expect("run graph_run");
    assert!(
        output.status.success(),
        "graph_run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = fs::read_to_string(debug_dir.join("routing.json")).expect("read routing.json");
    let v: Value = serde_json::from_str(&raw).expect("parse routing.json");
    assert!(
        v.get("incoming").and_then(|i| i.as_array()).is_some(),
        "routing.json must carry the incoming adjacency"
    );
    assert!(
        v.get("outgoing").and_then(|o| o.as_array()).is_some(),
        "routing.json must carry the outgoing adjacency"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn graph_run_exits_nonzero_when_a_module_fails() {
    let dir = unique_temp_dir("graph-run-failure");
    let spec = write_file(
        &dir,
        "sim.json",
        r#"
{
    "schema_version": 1,
    "steps": 50,
    "modules": [ { "name": "boom", "kind": "fail_after", "outputs": 1, "fail_at": 5 } ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_graph_run"))
        .args(["--spec", spec.to_str().unwrap()])
        .output()
        .expect("run graph_run");
    assert_eq!(output.status.code(), Some(2), "expected exit code 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("boom"),
        "stderr should name the failed module: {stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
