//! Smoke tests for the dashboard-e2e CLI
//!
//! These run the real binary against `sh`, so they need a POSIX shell.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the dashboard-e2e binary, isolated from the caller's env
fn dashboard_e2e() -> Command {
    let mut cmd = Command::cargo_bin("dashboard-e2e").expect("dashboard-e2e binary should exist");
    let _ = cmd
        .env_remove("RUST_LOG")
        .env_remove("DASHBOARD_E2E_CONFIG")
        .env_remove("DASHBOARD_E2E_URL")
        .env_remove("DASHBOARD_E2E_NAMESPACE")
        .env_remove("DASHBOARD_E2E_CLI_TIMEOUT_MS")
        .env_remove("DASHBOARD_E2E_POLLING_INTERVAL_MS");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    dashboard_e2e()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    dashboard_e2e()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("wait-for"))
        .stdout(predicate::str::contains("wait-absent"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    dashboard_e2e().assert().failure();
}

#[test]
fn test_wait_for_help() {
    dashboard_e2e()
        .args(["wait-for", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--until-contains"))
        .stdout(predicate::str::contains("--timeout"));
}

// ============================================================================
// wait-for
// ============================================================================

#[test]
fn test_wait_for_immediate_match() {
    dashboard_e2e()
        .args(["-q", "wait-for", "--until-contains", "hello", "--", "echo", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));
}

#[test]
fn test_wait_for_exit_code() {
    dashboard_e2e()
        .args(["-q", "wait-for", "--timeout", "2000", "--", "true"])
        .assert()
        .success();
}

#[test]
fn test_wait_for_eventual_match() {
    let dir = TempDir::new().unwrap();
    let counter = dir.path().join("count");
    // Prints "ready" on the third run
    let script = format!(
        "n=$(cat {p} 2>/dev/null || echo 0); n=$((n+1)); echo $n > {p}; \
         if [ $n -ge 3 ]; then echo ready; else echo pending; fi",
        p = counter.display()
    );
    dashboard_e2e()
        .args([
            "-q",
            "wait-for",
            "--until-matches",
            "^ready",
            "--timeout",
            "10000",
            "--interval",
            "50",
            "--",
            "sh",
            "-c",
            script.as_str(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready"));
    assert_eq!(fs::read_to_string(&counter).unwrap().trim(), "3");
}

#[test]
fn test_wait_for_timeout_exit_code() {
    dashboard_e2e()
        .args([
            "--color",
            "never",
            "wait-for",
            "--until-contains",
            "never",
            "--timeout",
            "300",
            "--interval",
            "100",
            "--description",
            "impossible output",
            "--",
            "echo",
            "nope",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timed out after 300ms"))
        .stderr(predicate::str::contains("impossible output"));
}

#[test]
fn test_wait_for_missing_program() {
    dashboard_e2e()
        .args([
            "wait-for",
            "--timeout",
            "5000",
            "--",
            "definitely-not-a-real-binary-e2e",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to start"));
}

#[test]
fn test_wait_for_invalid_regex() {
    dashboard_e2e()
        .args(["wait-for", "--until-matches", "(", "--", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid regex"));
}

// ============================================================================
// wait-absent
// ============================================================================

#[test]
fn test_wait_absent_already_gone() {
    dashboard_e2e()
        .args(["-q", "wait-absent", "--contains", "ws-1", "--", "echo", "ws-2"])
        .assert()
        .success();
}

#[test]
fn test_wait_absent_times_out() {
    dashboard_e2e()
        .args([
            "wait-absent",
            "--contains",
            "ws-1",
            "--attempts",
            "3",
            "--interval",
            "50",
            "--",
            "echo",
            "ws-1",
        ])
        .assert()
        .code(2);
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_defaults_yaml() {
    dashboard_e2e()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("dashboard_url"))
        .stdout(predicate::str::contains("cli_tool: oc"));
}

#[test]
fn test_config_json_with_env_override() {
    dashboard_e2e()
        .args(["config", "--format", "json"])
        .env("DASHBOARD_E2E_CLI_TIMEOUT_MS", "1234")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cli_ms\": 1234"));
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("e2e.yaml");
    fs::write(&path, "namespace: from-file\ncli_tool: kubectl\n").unwrap();
    dashboard_e2e()
        .args(["--config", path.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace: from-file"))
        .stdout(predicate::str::contains("cli_tool: kubectl"));
}

#[test]
fn test_config_invalid_env() {
    dashboard_e2e()
        .arg("config")
        .env("DASHBOARD_E2E_POLLING_INTERVAL_MS", "0")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("polling.interval_ms"));
}
