//! Scheduler Error Types
//!
//! Only bookkeeping faults and invalid options surface as errors; plugin
//! failures of every kind end up as failed result records instead.

use crate::core::error_handling::ContextualError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error("Plugin '{plugin_name}' was supplied more than once")]
    DuplicatePlugin { plugin_name: String },

    #[error("A result for plugin '{plugin_name}' was already recorded")]
    DuplicateResult { plugin_name: String },

    #[error("Invalid scheduler options: {message}")]
    InvalidOptions { message: String },
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl ContextualError for SchedulerError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, SchedulerError::InvalidOptions { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SchedulerError::InvalidOptions { message } => Some(message),
            _ => None,
        }
    }
}
