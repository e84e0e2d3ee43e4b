//! Report Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error during {operation} on '{path}': {cause}")]
    Io {
        operation: String,
        path: String,
        cause: String,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render HTML report: {0}")]
    Template(String),
}

impl ReportError {
    pub fn io(operation: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        ReportError::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }
}

impl From<tera::Error> for ReportError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        ReportError::Template(message)
    }
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

impl ContextualError for ReportError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
