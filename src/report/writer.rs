//! JSON artefacts and the terminal summary

use crate::core::styles::StyleRole;
use crate::report::error::{ReportError, ReportResult};
use crate::scheduler::api::{RunOutcome, TimingRecord, TimingStatus};
use prettytable::format::consts::FORMAT_CLEAN;
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "results.json";
pub const TIMINGS_FILE: &str = "timings.json";

const DETAIL_WIDTH: usize = 60;

/// Write `results.json` and `timings.json` into `dir`
pub async fn write_results(dir: &Path, outcome: &RunOutcome) -> ReportResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| ReportError::io("create directory", dir, &err))?;

    let results = dir.join(RESULTS_FILE);
    write_json(&results, &outcome.results).await?;

    let timings = dir.join(TIMINGS_FILE);
    write_json(&timings, &outcome.timings).await?;

    Ok(vec![results, timings])
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> ReportResult<()> {
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, body)
        .await
        .map_err(|err| ReportError::io("write", path, &err))
}

fn status_role(status: TimingStatus) -> StyleRole {
    match status {
        TimingStatus::Success => StyleRole::Success,
        TimingStatus::Fail | TimingStatus::Failed => StyleRole::Fail,
        TimingStatus::Unavailable => StyleRole::Unavailable,
        TimingStatus::Skipped => StyleRole::Skipped,
    }
}

fn styled_cell(text: &str, role: StyleRole, color: bool) -> Cell {
    let cell = Cell::new(text);
    match role.to_prettytable_spec().filter(|_| color) {
        Some(spec) => cell.style_spec(&spec),
        None => cell,
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_duration(timing: Option<&TimingRecord>) -> String {
    match timing.and_then(|t| t.duration_seconds) {
        Some(seconds) => format!("{:.2}s", seconds),
        None => "-".to_string(),
    }
}

/// One row per result, in result order
pub fn summary_table(outcome: &RunOutcome, color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_CLEAN);
    table.set_titles(Row::new(
        ["Plugin", "Status", "Duration", "Detail"]
            .iter()
            .map(|title| styled_cell(title, StyleRole::Header, color))
            .collect(),
    ));

    for record in &outcome.results {
        let timing = outcome.timing(record.name());
        let status = timing
            .map(|t| t.status)
            .unwrap_or_else(|| record.disposition().into());
        let detail = match (record.message(), record.artifact()) {
            (Some(message), _) => message.to_string(),
            (None, Some(artifact)) => artifact.display().to_string(),
            (None, None) => "-".to_string(),
        };

        table.add_row(Row::new(vec![
            styled_cell(record.name(), StyleRole::Value, color),
            styled_cell(&status.to_string(), status_role(status), color),
            Cell::new(&format_duration(timing)),
            Cell::new(&truncate(&detail, DETAIL_WIDTH)),
        ]));
    }
    table
}

/// Plain-text summary, with a totals line
pub fn render_summary(outcome: &RunOutcome) -> String {
    format!(
        "{}\n{}\n",
        summary_table(outcome, false),
        totals_line(outcome)
    )
}

/// Print the summary to stdout, coloured when requested
pub fn print_summary(outcome: &RunOutcome, color: bool) {
    if color {
        // print_tty only fails when stdout is gone
        if summary_table(outcome, true).print_tty(true).is_err() {
            return;
        }
    } else {
        print!("{}", summary_table(outcome, false));
    }
    println!("{}", totals_line(outcome));
}

fn totals_line(outcome: &RunOutcome) -> String {
    let failed = outcome.failed_count();
    format!(
        "{} plugin(s): {} succeeded, {} failed",
        outcome.results.len(),
        outcome.results.len() - failed,
        failed
    )
}
