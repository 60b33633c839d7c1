//! End-to-end tests for the port-watch CLI
//!
//! Tests the CLI binary with real command execution, output verification, and exit codes.
#![allow(deprecated)] // cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::net::TcpListener;
use tempfile::{NamedTempFile, TempDir};

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config watching a single port on 127.0.0.1
fn single_port_config(name: &str, port: u16) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[monitor]
host = "127.0.0.1"
probe_timeout_ms = 500

[[ports]]
name = "{}"
port = {}
"#,
        name, port
    )
    .unwrap();
    file
}

// =============================================================================
// --once
// =============================================================================

#[test]
fn test_once_reports_closed_port() {
    let port = free_port();
    let config = single_port_config("api", port);

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--config")
        .arg(config.path())
        .arg("--once")
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(
            predicate::str::contains(format!("+ api: {}", port))
                .and(predicate::str::contains("Closed"))
                .and(predicate::str::contains("[close]").not()),
        );
}

#[test]
fn test_once_reports_listening_port_with_close_control() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = single_port_config("web", port);

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--config")
        .arg(config.path())
        .arg("--once")
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(
            predicate::str::contains(format!("+ web: {}", port))
                .and(predicate::str::contains("[close]")),
        );
    drop(listener);
}

// =============================================================================
// --close
// =============================================================================

#[test]
fn test_close_unused_port_with_yes() {
    let port = free_port();

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--close")
        .arg(port.to_string())
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Port {} closed successfully.",
            port
        )));
}

#[test]
fn test_close_declined_is_cancelled() {
    let port = free_port();

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--close")
        .arg(port.to_string())
        .write_stdin("n\n")
        .assert()
        .code(255)
        .stderr(
            predicate::str::contains(format!("Do you want to close port {}?", port))
                .and(predicate::str::contains("Operation cancelled")),
        );
}

#[test]
fn test_close_invalid_signal() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--close")
        .arg("8080")
        .arg("--yes")
        .arg("--signal")
        .arg("INVALID")
        .assert()
        .code(255)
        .stderr(predicate::str::contains("Invalid signal"));
}

#[test]
fn test_close_rejects_out_of_range_port() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--close").arg("70000").assert().failure();
}

// =============================================================================
// --init
// =============================================================================

#[test]
fn test_init_writes_config_to_given_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("port-watch").join("config.toml");

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--init")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created:"));

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[monitor]"));
    assert!(content.contains("[[ports]]"));
}

#[test]
fn test_init_force_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "# placeholder").unwrap();

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--init")
        .arg("--force")
        .arg("--config")
        .arg(&path)
        .assert()
        .success();
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .contains("close_signal"));
}

// =============================================================================
// Config errors and exit codes
// =============================================================================

#[test]
fn test_missing_explicit_config_exit_code() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--config")
        .arg("/nonexistent/port-watch/config.toml")
        .arg("--once")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("port-watch:"));
}

#[test]
fn test_duplicate_names_exit_code() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[[ports]]\nname = \"a\"\nport = 1\n\n[[ports]]\nname = \"a\"\nport = 2"
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--config")
        .arg(file.path())
        .arg("--once")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Duplicate port name: a"));
}

#[test]
fn test_zero_interval_rejected() {
    let port = free_port();
    let config = single_port_config("api", port);

    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--config")
        .arg(config.path())
        .arg("--interval-ms")
        .arg("0")
        .assert()
        .code(3);
}

// =============================================================================
// CLI argument validation
// =============================================================================

#[test]
fn test_conflicting_modes() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--once")
        .arg("--close")
        .arg("80")
        .assert()
        .code(255)
        .stderr(predicate::str::contains("cannot be combined"));
}

#[test]
fn test_force_without_init() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--force")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force requires --init"));
}

#[test]
fn test_help_option() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("port-watch")
            .and(predicate::str::contains("--once"))
            .and(predicate::str::contains("--close"))
            .and(predicate::str::contains("--init"))
            .and(predicate::str::contains("--signal")),
    );
}

#[test]
fn test_version_option() {
    let mut cmd = Command::cargo_bin("port-watch").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("port-watch"));
}
