//! Public API for report generation

pub use crate::report::error::{ReportError, ReportResult};
pub use crate::report::html::{render_html, write_html, HTML_FILE};
pub use crate::report::writer::{
    print_summary, render_summary, summary_table, write_results, RESULTS_FILE, TIMINGS_FILE,
};
