use crate::common::{read_json, run_scanorch, stdout_of};
use tempfile::TempDir;

#[test]
fn test_report_only_rebuilds_reports_from_saved_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("subfinder.txt"), "a.example.com\nb.example.com\n\n").unwrap();

    let output = run_scanorch(
        dir.path(),
        &["--report-only", "--run-only", "subfinder", "-o", "out", "example.com"],
    );

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("1 plugin(s): 1 succeeded, 0 failed"));

    let results = read_json(out.join("results.json"));
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["name"], "subfinder");
    assert_eq!(results[0]["disposition"], "success");
    assert_eq!(results[0]["results"]["lines"], 2);

    let artifact = read_json(out.join("subfinder.json"));
    assert_eq!(artifact["count"], 2);
    assert_eq!(artifact["items"][1], "b.example.com");

    let timings = read_json(out.join("timings.json"));
    assert_eq!(timings[0]["status"], "success");

    let html = std::fs::read_to_string(out.join("report.html")).unwrap();
    assert!(html.contains("Scan report: example.com"));
}

#[test]
fn test_report_only_missing_output_deadlocks_dependent() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(
        dir.path(),
        &[
            "--report-only",
            "--parallel",
            "--run-only",
            "subfinder,httpx",
            "--no-html",
            "-o",
            "out",
            "example.com",
        ],
    );

    // failed plugins do not change the exit code by default
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("2 plugin(s): 0 succeeded, 2 failed"));

    let results = read_json(dir.path().join("out").join("results.json"));
    assert_eq!(results[0]["disposition"], "fail");
    assert!(results[1]["results"]
        .as_str()
        .unwrap()
        .starts_with("Dependency deadlock:"));
    assert!(!dir.path().join("out").join("report.html").exists());
}

#[test]
fn test_fail_on_error_sets_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = run_scanorch(
        dir.path(),
        &["--report-only", "--run-only", "wafw00f", "--fail-on-error", "-o", "out", "example.com"],
    );

    assert_eq!(output.status.code(), Some(2));
}
