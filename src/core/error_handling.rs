//! Error reporting shared by the host entry points.
//!
//! Errors that the operator can act on (a malformed repository identifier, a
//! wrong file extension) are shown verbatim. System failures are logged as a
//! short context line, with the full error only at debug level.

/// Classifies errors into operator-actionable and system failures.
///
/// `user_message` returns `Some` exactly when `is_user_actionable` is true.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log `error` at the detail level appropriate to its classification.
///
/// # Examples
/// ```rust,no_run
/// # use daiv_plugin::core::error_handling::log_error_with_context;
/// # use daiv_plugin::plugin::api::PluginError;
/// let err = PluginError::InvalidFormat {
///     message: "invalid repository identifier 'nope'".to_string(),
/// };
/// log_error_with_context(&err, "Plugin installation");
/// // Logs: "FATAL: invalid repository identifier 'nope'"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}: {}", operation_context, error),
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
