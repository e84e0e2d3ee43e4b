use crate::common::{run_scanorch, stderr_of};
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_unknown_run_only_plugin_is_startup_error() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(dir.path(), &["--run-only", "nmap", "example.com"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("nmap"));
}

#[test]
fn test_missing_config_file_is_startup_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_scanorch"))
        .args(["--config-file", "/nonexistent/scanorch.toml", "example.com"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("/nonexistent/scanorch.toml"));
}

#[test]
fn test_invalid_workers_rejected_by_parser() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(dir.path(), &["--workers", "0", "example.com"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_version_exits_cleanly() {
    let output = Command::new(env!("CARGO_BIN_EXE_scanorch"))
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("scanorch"));
}
