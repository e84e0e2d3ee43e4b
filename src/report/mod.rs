//! Run reports
//!
//! Everything a run produced is written to the output directory as JSON
//! (`results.json`, `timings.json`) and optionally as a self-contained HTML
//! page; a summary table is printed to the terminal.

pub(crate) mod error;
pub(crate) mod html;
pub(crate) mod writer;

pub mod api;
