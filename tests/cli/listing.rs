use crate::common::{run_scanorch, stdout_of};
use tempfile::TempDir;

#[test]
fn test_list_plugins_shows_builtin_catalog() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(dir.path(), &["--list-plugins"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    for name in ["subfinder", "httpx", "wafw00f", "sslscan", "katana"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
    assert!(stdout.contains("httpx [completed]"));
}

#[test]
fn test_list_plugins_includes_configured_tool() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("scanorch.toml"),
        r#"
[[tool]]
name = "whatweb"
binary = "whatweb"
args = ["--color=never", "{target}"]
scan_type = "active"
description = "Web technology fingerprinting"

[[tool]]
name = "sslscan"
binary = "sslscan"
scan_type = "active"
enabled = false
"#,
    )
    .unwrap();

    let output = run_scanorch(dir.path(), &["--list-plugins"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("whatweb"));
    assert!(stdout.contains("Web technology fingerprinting"));
    assert!(!stdout.contains("sslscan"));
}
