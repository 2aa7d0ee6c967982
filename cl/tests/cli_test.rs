//! End-to-end tests for the `cl` binary

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write config");
    file
}

fn cl() -> Command {
    let mut cmd = Command::cargo_bin("cl").expect("cl binary should build");
    cmd.env("NO_COLOR", "1");
    cmd
}

const CHAIN: &str = "\
log-level: warn
coordinator:
  reconcile-period-ms: 20
graph:
  nodes:
    - name: planner
      activates: [camera]
    - name: camera
      activates: [driver]
    - name: driver
";

#[test]
fn test_validate_prints_summary() {
    let config = config_file(CHAIN);
    cl().arg("--config")
        .arg(config.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 nodes, 2 activation edges"))
        .stdout(predicate::str::contains("Roots: planner"));
}

#[test]
fn test_validate_rejects_unknown_target() {
    let config = config_file("graph:\n  nodes:\n    - name: planner\n      activates: [ghost]\n");
    cl().arg("--config")
        .arg(config.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown node 'ghost'"));
}

#[test]
fn test_missing_config_fails() {
    cl().args(["--config", "/nonexistent/cascade.yml", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_simulate_activates_chain() {
    let config = config_file(CHAIN);
    cl().arg("--config")
        .arg(config.path())
        .args(["simulate", "--duration-ms", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Final states"))
        .stdout(predicate::str::is_match(r"driver\s+active").unwrap());
}

#[test]
fn test_simulate_crash_deactivates_downstream() {
    let config = config_file(CHAIN);
    cl().arg("--config")
        .arg(config.path())
        .args(["simulate", "--duration-ms", "800", "--crash", "planner", "--crash-after-ms", "300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crashed"))
        .stdout(predicate::str::is_match(r"camera\s+inactive").unwrap());
}

#[test]
fn test_simulate_without_graph_fails() {
    let config = config_file("log-level: warn\n");
    cl().arg("--config")
        .arg(config.path())
        .arg("simulate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No nodes configured"));
}
