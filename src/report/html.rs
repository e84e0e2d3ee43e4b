//! HTML run report rendered through an embedded Tera template

use crate::report::error::{ReportError, ReportResult};
use crate::scheduler::api::RunOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const HTML_FILE: &str = "report.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Scan report: {{ target }}</title>
<style>
  body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; margin: 2em; color: #333; }
  h1 { border-bottom: 2px solid #3498db; padding-bottom: 0.3em; }
  table { border-collapse: collapse; width: 100%; margin: 1em 0; }
  th, td { padding: 0.5em 0.8em; border-bottom: 1px solid #ddd; text-align: left; vertical-align: top; }
  th { background: #3498db; color: #fff; }
  .success { color: #1e8449; } .fail, .failed { color: #c0392b; }
  .unavailable { color: #8e44ad; } .skipped { color: #7f8c8d; }
  pre { margin: 0; white-space: pre-wrap; font-size: 0.85em; }
  .meta { color: #7f8c8d; font-size: 0.9em; }
</style>
</head>
<body>
<h1>Scan report: {{ target }}</h1>
<p class="meta">Generated {{ generated_at }} &middot; {{ total }} plugin(s), {{ succeeded }} succeeded, {{ failed }} failed</p>
<h2>Results</h2>
<table>
<tr><th>Plugin</th><th>Status</th><th>Duration</th><th>Artifact</th><th>Details</th></tr>
{% for row in rows -%}
<tr>
  <td>{{ row.name }}</td>
  <td class="{{ row.status }}">{{ row.status }}</td>
  <td>{{ row.duration }}</td>
  <td>{% if row.artifact %}{{ row.artifact }}{% else %}-{% endif %}</td>
  <td><pre>{{ row.details }}</pre></td>
</tr>
{% endfor -%}
</table>
<h2>Timings</h2>
<table>
<tr><th>Plugin</th><th>Status</th><th>Started</th><th>Ended</th><th>Error</th></tr>
{% for timing in timings -%}
<tr>
  <td>{{ timing.plugin_name }}</td>
  <td class="{{ timing.status }}">{{ timing.status }}</td>
  <td>{% if timing.start_timestamp %}{{ timing.start_timestamp }}{% else %}-{% endif %}</td>
  <td>{% if timing.end_timestamp %}{{ timing.end_timestamp }}{% else %}-{% endif %}</td>
  <td>{% if timing.error %}{{ timing.error }}{% endif %}</td>
</tr>
{% endfor -%}
</table>
</body>
</html>
"#;

#[derive(Serialize)]
struct ResultRow {
    name: String,
    status: String,
    duration: String,
    artifact: Option<String>,
    details: String,
}

fn result_rows(outcome: &RunOutcome) -> ReportResult<Vec<ResultRow>> {
    outcome
        .results
        .iter()
        .map(|record| {
            let timing = outcome.timing(record.name());
            let status = timing
                .map(|t| t.status.to_string())
                .unwrap_or_else(|| record.disposition().to_string());
            let duration = timing
                .and_then(|t| t.duration_seconds)
                .map(|s| format!("{:.2}s", s))
                .unwrap_or_else(|| "-".to_string());
            let details = match record.message() {
                Some(message) => message.to_string(),
                None => serde_json::to_string_pretty(record.results())?,
            };

            Ok(ResultRow {
                name: record.name().to_string(),
                status,
                duration,
                artifact: record.artifact().map(|p| p.display().to_string()),
                details,
            })
        })
        .collect()
}

/// Render the report page; all values are HTML-escaped
pub fn render_html(
    target: &str,
    outcome: &RunOutcome,
    generated_at: DateTime<Utc>,
) -> ReportResult<String> {
    let failed = outcome.failed_count();
    let mut context = tera::Context::new();
    context.insert("target", target);
    context.insert("generated_at", &generated_at.to_rfc3339());
    context.insert("total", &outcome.results.len());
    context.insert("succeeded", &(outcome.results.len() - failed));
    context.insert("failed", &failed);
    context.insert("rows", &result_rows(outcome)?);
    context.insert("timings", &outcome.timings);

    Ok(tera::Tera::one_off(TEMPLATE, &context, true)?)
}

pub async fn write_html(dir: &Path, target: &str, outcome: &RunOutcome) -> ReportResult<PathBuf> {
    let html = render_html(target, outcome, Utc::now())?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| ReportError::io("create directory", dir, &err))?;
    let path = dir.join(HTML_FILE);
    tokio::fs::write(&path, html)
        .await
        .map_err(|err| ReportError::io("write", &path, &err))?;
    Ok(path)
}
