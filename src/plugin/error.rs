//! Plugin Error Handling
//!
//! Errors raised by plugin construction, execution and registry management.
//! Execution errors never abort a run: the execution engine turns them into
//! failed result records.

use crate::core::error_handling::ContextualError;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin not found: {plugin_name}")]
    NotFound { plugin_name: String },

    #[error("Plugin '{plugin_name}' is already registered")]
    Duplicate { plugin_name: String },

    #[error("Failed to initialise plugin '{plugin_name}': {cause}")]
    Construction { plugin_name: String, cause: String },

    #[error("Plugin '{plugin_name}' failed during '{operation}': {cause}")]
    Execution {
        plugin_name: String,
        operation: String,
        cause: String,
    },

    #[error("Plugin '{plugin_name}' timed out after {seconds}s")]
    Timeout { plugin_name: String, seconds: u64 },

    #[error("I/O error during {operation} on '{path}': {cause}")]
    Io {
        operation: String,
        path: String,
        cause: String,
    },

    #[error("Configuration error in plugin '{plugin_name}': {message}")]
    Configuration { plugin_name: String, message: String },

    #[error("Plugin '{plugin_name}' panicked: {message}")]
    Panicked { plugin_name: String, message: String },
}

impl PluginError {
    pub fn io(operation: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        PluginError::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }
}

impl ContextualError for PluginError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, PluginError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PluginError::Configuration { message, .. } => Some(message),
            _ => None,
        }
    }
}
