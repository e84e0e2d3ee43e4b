//! Dependency-aware orchestration of security scanning tools
//!
//! A set of scan plugins is run against a single target, sequentially or on
//! a bounded pool of workers. Every selected plugin yields exactly one result
//! record and one timing record, whatever happens to it.

pub mod app;
pub mod core;
pub mod plugin;
pub mod report;
pub mod scheduler;
