//! Public API for the scheduler
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Scheduling
pub use crate::scheduler::orchestrator::{
    DryRunEntry, RunOutcome, Scheduler, SchedulerOptions, DEFAULT_MAX_WORKERS,
};

// Single plugin execution
pub use crate::scheduler::engine::{ExecutionEngine, TOOL_NOT_AVAILABLE};

// Dependency resolution
pub use crate::scheduler::resolver::{resolve, CompletedResults, DependencyCheck};

// Timing
pub use crate::scheduler::timing::{TimingLog, TimingRecord, TimingStatus};

// Error handling
pub use crate::scheduler::error::{SchedulerError, SchedulerResult};
