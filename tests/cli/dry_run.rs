use crate::common::{run_scanorch, stdout_of};
use tempfile::TempDir;

#[test]
fn test_dry_run_lists_commands_without_running() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(dir.path(), &["--dry-run", "-o", "out", "example.com"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("Dry run: 5 plugin(s) against example.com"));
    assert!(stdout.contains("subfinder -d example.com -silent"));
    assert!(stdout.contains("after:   subfinder [disposition=success]"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_dry_run_active_mode_with_exclusion() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(
        dir.path(),
        &["--dry-run", "--mode", "active", "--exclude", "katana,sslscan", "example.com"],
    );

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("Dry run: 2 plugin(s)"));
    assert!(stdout.contains("httpx"));
    assert!(stdout.contains("wafw00f"));
    assert!(!stdout.contains("subfinder ("));
    assert!(!stdout.contains("katana"));
}
