//! CLI integration tests for the crashguard binary
//!
//! These tests run the compiled binary: demo rendering, configuration
//! loading, and the real crash path (panic hook, promoted signals and the
//! shutdown check), which ends the process with status 1.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command instance for the crashguard binary
#[allow(deprecated)]
fn crashguard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("crashguard").expect("Failed to find crashguard binary");
    cmd.env_remove("HTTP_HOST")
        .env_remove("REQUEST_METHOD")
        .env_remove("RUST_LOG")
        .env_remove("CRASHGUARD__CLI_MODE");
    cmd
}

// ============================================================================
// --help / --version tests
// ============================================================================

#[test]
fn test_help_lists_commands() {
    crashguard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("panic"))
        .stdout(predicate::str::contains("shutdown"));
}

#[test]
fn test_version_flag() {
    crashguard_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// demo command tests
// ============================================================================

#[test]
fn test_demo_database_error_cli() {
    crashguard_cmd()
        .args(["demo", "database-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CRASHGUARD ERROR REPORT"))
        .stdout(predicate::str::contains(
            "Database connection failed: Unable to connect to MySQL server",
        ))
        .stdout(predicate::str::contains("[REDACTED]"))
        .stdout(predicate::str::contains("secret123").not())
        .stdout(predicate::str::contains("rsa_private_key_here").not());
}

#[test]
fn test_demo_cli_has_no_ansi_when_piped() {
    crashguard_cmd()
        .args(["demo", "missing-id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_demo_not_found_shows_status() {
    crashguard_cmd()
        .args(["demo", "not-found", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HTTP Status: 404"));
}

#[test]
fn test_demo_html() {
    crashguard_cmd()
        .args(["demo", "not-found", "--format", "html"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("404 Not Found"))
        .stdout(predicate::str::contains("Copy as Markdown"));
}

#[test]
fn test_demo_markdown() {
    crashguard_cmd()
        .args(["demo", "missing-id", "-f", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# 🚨 Error Report"))
        .stdout(predicate::str::contains("`InvalidArgument`"))
        .stdout(predicate::str::contains("sk_live_abcd1234").not());
}

#[test]
fn test_demo_large_array_json() {
    let output = crashguard_cmd()
        .args(["demo", "large-array", "--format", "json"])
        .output()
        .expect("Failed to run crashguard");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("demo json should parse");
    let args = &report["trace"][1]["args"];
    assert_eq!(args[0]["count"], 11);
    assert_eq!(args[0]["value"]["..."], "(1 more items)");
    assert_eq!(args[1]["length"], 1500);
    assert!(args[1]["value"]
        .as_str()
        .unwrap()
        .ends_with("... (truncated)"));
}

#[test]
fn test_demo_unknown_scenario_fails() {
    crashguard_cmd()
        .args(["demo", "meltdown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ============================================================================
// Configuration file tests
// ============================================================================

#[test]
fn test_config_file_applies() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("crashguard.toml");
    std::fs::write(&path, "max_string_length = 20\n").expect("Failed to write config");

    crashguard_cmd()
        .args(["demo", "large-array", "--format", "markdown", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{}... (truncated)",
            "x".repeat(20)
        )));
}

#[test]
fn test_config_env_override() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("crashguard.toml");
    std::fs::write(&path, "redact_sensitive = true\n").expect("Failed to write config");

    crashguard_cmd()
        .env("CRASHGUARD__REDACT_SENSITIVE", "false")
        .args(["demo", "missing-id", "--format", "json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("secret123"));
}

#[test]
fn test_missing_config_file() {
    crashguard_cmd()
        .args(["demo", "missing-id", "--config", "/nonexistent/crashguard.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

// ============================================================================
// Crash path tests
// ============================================================================

#[test]
fn test_panic_is_reported_and_exits_one() {
    crashguard_cmd()
        .args(["panic", "--message", "kaboom"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CRASHGUARD ERROR REPORT"))
        .stderr(predicate::str::contains("Message: kaboom"))
        .stderr(predicate::str::contains("Type: panic"))
        .stderr(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_panic_renders_html_when_serving_request() {
    crashguard_cmd()
        .env("HTTP_HOST", "example.com")
        .env("REQUEST_METHOD", "POST")
        .args(["panic", "--message", "kaboom"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("example.com"));
}

#[test]
fn test_signal_above_threshold_is_reported() {
    crashguard_cmd()
        .args(["signal", "warning", "--message", "Undefined index: user_id"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SeverityError(warning)"))
        .stderr(predicate::str::contains("Undefined index: user_id"));
}

#[test]
fn test_signal_below_threshold_is_declined() {
    crashguard_cmd()
        .env("CRASHGUARD__REPORT_THRESHOLD", "error")
        .args(["signal", "notice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("declined"));
}

#[test]
fn test_shutdown_reports_fatal() {
    crashguard_cmd()
        .args(["shutdown", "fatal", "--message", "Allowed memory size exhausted"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SeverityError(fatal)"))
        .stderr(predicate::str::contains("Allowed memory size exhausted"));
}

#[test]
fn test_shutdown_ignores_warning() {
    crashguard_cmd()
        .args(["shutdown", "warning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is not fatal"));
}
