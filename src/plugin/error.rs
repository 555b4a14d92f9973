//! Plugin Error Handling
//!
//! Error types for plugin installation, loading, configuration and lifecycle.

use crate::core::error_handling::ContextualError;
use std::fmt;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// One plugin's failure inside an aggregated error.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginFailure {
    pub plugin_name: String,
    pub cause: String,
}

impl fmt::Display for PluginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.plugin_name, self.cause)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    /// Input rejected before any side effect (identifier, extension, path kind)
    #[error("{message}")]
    InvalidFormat { message: String },

    /// External process (clone, checkout, build) failed
    #[error("Failed to {step}: {cause}")]
    CommandFailed { step: String, cause: String },

    #[error("Failed to {operation} '{path}': {cause}")]
    IoError {
        operation: String,
        path: String,
        cause: String,
    },

    /// Library could not be opened, lacked an entry point or failed admission
    #[error("Failed to load plugin '{plugin_name}': {cause}")]
    LoadError { plugin_name: String, cause: String },

    #[error("Version incompatible: {message}")]
    VersionIncompatible { message: String },

    #[error("Plugin '{plugin_name}' is already registered")]
    AlreadyRegistered { plugin_name: String },

    #[error("Failed to initialize plugin '{plugin_name}': {cause}")]
    InitializationFailed { plugin_name: String, cause: String },

    #[error("Configuration error in '{plugin_name}': {message}")]
    ConfigurationError {
        plugin_name: String,
        message: String,
    },

    /// Every plugin that failed to shut down, in shutdown order
    #[error("Errors during shutdown: {}", join_failures(.failures))]
    ShutdownFailed { failures: Vec<PluginFailure> },

    #[error("Configuration form was cancelled")]
    FormCancelled,

    #[error("Configuration form failed: {message}")]
    FormFailed { message: String },

    #[error("Plugin '{plugin_name}' failed during '{operation}': {cause}")]
    ExecutionError {
        plugin_name: String,
        operation: String,
        cause: String,
    },

    #[error("{message}")]
    Generic { message: String },
}

fn join_failures(failures: &[PluginFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PluginError {
    pub(crate) fn io(operation: &str, path: impl fmt::Display, cause: impl fmt::Display) -> Self {
        PluginError::IoError {
            operation: operation.to_string(),
            path: path.to_string(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PluginError::InvalidFormat {
            message: message.into(),
        }
    }
}

impl ContextualError for PluginError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            PluginError::InvalidFormat { .. }
                | PluginError::AlreadyRegistered { .. }
                | PluginError::ConfigurationError { .. }
                | PluginError::FormCancelled
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PluginError::InvalidFormat { message } => Some(message),
            PluginError::ConfigurationError { message, .. } => Some(message),
            PluginError::AlreadyRegistered { .. } => Some("plugin is already registered"),
            PluginError::FormCancelled => Some("configuration was cancelled"),
            _ => None,
        }
    }
}
