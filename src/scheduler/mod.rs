//! Scan Scheduler
//!
//! Runs a set of scan plugins against one target, either one after another
//! or on a bounded pool of worker tasks, honouring the declared dependencies
//! between plugins.
//!
//! # Overview
//!
//! - **Resolver**: decides whether a plugin's dependencies are met by the
//!   results completed so far
//! - **Engine**: runs a single plugin, turning every failure (including
//!   panics) into a failed result record plus a timing record
//! - **Scheduler**: selects plugins by scan type and drives the run
//!
//! # Parallel runs
//!
//! ```text
//!   pending ──(deps met, slot free)──▶ in flight ──(task done)──▶ completed
//!      │                                                             │
//!      └──────────── resubmission pass after every completion ◀──────┘
//! ```
//!
//! When nothing is in flight and no pending plugin is ready, the remaining
//! plugins can never run. They are failed with a dependency deadlock reason
//! and keep a `skipped` timing record.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use scanorch::core::logging::ScopedLogger;
//! use scanorch::plugin::api::PluginRegistry;
//! use scanorch::scheduler::api::{Scheduler, SchedulerOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = PluginRegistry::with_builtins();
//! let options = SchedulerOptions::new("example.com", "output").with_parallel(3);
//! let scheduler = Scheduler::new(options, ScopedLogger::new("scheduler"));
//!
//! let outcome = scheduler.run(registry.select(&[], &[])?).await?;
//! for record in &outcome.results {
//!     println!("{}: {}", record.name(), record.disposition());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub(crate) mod engine;
pub(crate) mod error;
pub(crate) mod orchestrator;
pub(crate) mod resolver;
pub(crate) mod timing;

#[cfg(test)]
mod tests;
