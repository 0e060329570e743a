//! CLI Interface E2E Tests
//!
//! These tests run the loopstat binary: help and version output, demo runs
//! in every format, partial reports, and the config subcommand.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the path to the loopstat binary
fn loopstat_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_loopstat"))
}

/// A command isolated from any config file or LOOPSTAT_* variable on the machine
fn loopstat(dir: &TempDir) -> Command {
    let mut cmd = Command::new(loopstat_bin());
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("LOOPSTAT_CONFIG")
        .env_remove("LOOPSTAT_VERBOSE")
        .env_remove("LOOPSTAT_HOST_ID")
        .env_remove("LOOPSTAT_THREADS")
        .env_remove("LOOPSTAT_GATHER_TIMEOUT_MS")
        .env_remove("LOOPSTAT_FORMAT")
        .env_remove("LOOPSTAT_EVENTS_JSON")
        .env("LOOPSTAT_NO_COLOR", "true");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

#[test]
fn test_cli_help() {
    let dir = temp_dir();
    loopstat(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage").and(predicate::str::contains("demo")));
}

#[test]
fn test_cli_version() {
    let dir = temp_dir();
    loopstat(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("loopstat"));
}

/// One tabular section per host, each with its header row
#[test]
fn test_demo_tabular() {
    let dir = temp_dir();
    let output = loopstat(&dir)
        .args(["demo", "--hosts", "2", "--threads", "2", "--loops", "1", "--iterations", "1"])
        .output()
        .expect("Failed to run loopstat");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout is not UTF-8");
    assert_eq!(stdout.matches("STATTYPE,HOST,LOOP,INSTANCE,CATEGORY,").count(), 2);
    assert!(stdout.contains("STAT,0,loop0,0,Iterations,"));
    assert!(stdout.contains("STAT,1,loop0,0,Iterations,"));
    assert!(!stdout.contains("PARTIAL REPORT"));
}

#[test]
fn test_demo_records_format() {
    let dir = temp_dir();
    loopstat(&dir)
        .args(["demo", "--hosts", "1", "--threads", "1", "--format", "records"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "HOST,LOOP,INSTANCE,CATEGORY,THREAD,VAL\n",
        ));
}

#[test]
fn test_demo_structured_format() {
    let dir = temp_dir();
    let output = loopstat(&dir)
        .args(["demo", "--hosts", "1", "--threads", "2", "--format", "structured"])
        .output()
        .expect("Failed to run loopstat");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("structured report is not JSON");
    assert!(value.as_array().is_some_and(|rows| !rows.is_empty()));
}

#[test]
fn test_demo_dropped_host_partial_report() {
    let dir = temp_dir();
    loopstat(&dir)
        .args([
            "demo",
            "--hosts",
            "2",
            "--threads",
            "1",
            "--drop-host",
            "1",
            "--timeout-ms",
            "50",
        ])
        .assert()
        .success()
        .stdout(predicate::str::ends_with(
            "# PARTIAL REPORT: missing hosts [1]\n",
        ));
}

#[test]
fn test_demo_strict_partial_report_fails() {
    let dir = temp_dir();
    loopstat(&dir)
        .args([
            "demo",
            "--hosts",
            "2",
            "--threads",
            "1",
            "--drop-host",
            "1",
            "--timeout-ms",
            "20",
            "--strict",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("demo run failed"));
}

#[test]
fn test_demo_drop_host_requires_timeout() {
    let dir = temp_dir();
    loopstat(&dir)
        .args(["demo", "--hosts", "2", "--drop-host", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout-ms"));
}

#[test]
fn test_demo_output_file() {
    let dir = temp_dir();
    let report_path = dir.path().join("out").join("report.csv");
    std::fs::create_dir_all(report_path.parent().unwrap()).unwrap();

    loopstat(&dir)
        .args(["demo", "--hosts", "1", "--threads", "1", "--output"])
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let report = std::fs::read_to_string(&report_path).expect("report file missing");
    assert!(report.starts_with("STATTYPE,"));
}

#[test]
fn test_config_prints_sections() {
    let dir = temp_dir();
    loopstat(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[collector]").and(predicate::str::contains("[demo]")),
        );
}

#[test]
fn test_config_write_then_load() {
    let dir = temp_dir();
    let config_path = dir.path().join("saved.toml");

    loopstat(&dir)
        .args(["config", "--write"])
        .arg(&config_path)
        .assert()
        .success();
    assert!(config_path.exists(), "Config file should exist");

    loopstat(&dir)
        .arg("--config")
        .arg(&config_path)
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hosts\": 2"));
}

/// A loopstat.toml in the working directory is picked up without --config
#[test]
fn test_config_file_in_current_dir() {
    let dir = temp_dir();
    std::fs::write(
        dir.path().join("loopstat.toml"),
        "[collector]\nthreads = 1\nformat = \"records\"\n\n[demo]\nhosts = 1\nloops = 1\niterations = 1\n",
    )
    .unwrap();

    loopstat(&dir)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "HOST,LOOP,INSTANCE,CATEGORY,THREAD,VAL\n",
        ));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = temp_dir();
    loopstat(&dir)
        .args(["--config", "does-not-exist.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}
