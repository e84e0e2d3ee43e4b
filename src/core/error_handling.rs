//! Shared error reporting for fatal, run-aborting conditions
//!
//! Plugin failures never reach this module: they are folded into result
//! records by the execution engine. What remains are startup problems
//! (bad arguments, unreadable config) and scheduler bookkeeping faults.

/// Errors that know whether their message is meant for the operator
///
/// When `is_user_actionable()` is true, `user_message()` must return
/// `Some(message)`; otherwise it returns `None` and the caller falls back to
/// a generic context line.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error: the user message when there is one, else the context
///
/// Full detail always goes to debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => log::error!("FATAL: {}", user_msg),
        None => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Text for stderr when logging may not be installed yet
pub fn fatal_message<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => format!("Error: {}", user_msg),
        None => format!("Error: {}: {}", operation_context, error),
    }
}
