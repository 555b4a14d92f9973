//! TOML host configuration
//!
//! Loads the optional `daiv.toml` and merges it with command-line flags.
//! Precedence is flag, then file, then built-in default.

use crate::app::cli::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum HostConfigError {
    #[error("The specified configuration file does not exist: {path}")]
    NotFound { path: String },

    #[error("Error reading configuration file {path}: {cause}")]
    Read { path: String, cause: String },

    #[error("Error parsing configuration file {path}: {cause}")]
    Parse { path: String, cause: String },
}

impl ContextualError for HostConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            HostConfigError::NotFound { .. } | HostConfigError::Parse { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            HostConfigError::NotFound { .. } => Some("configuration file not found; check --config"),
            HostConfigError::Parse { cause, .. } => Some(cause),
            HostConfigError::Read { .. } => None,
        }
    }
}

/// Keys accepted in `daiv.toml`; unknown keys are ignored
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    pub plugin_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub color: Option<bool>,
}

impl FileConfig {
    pub fn parse(contents: &str, path: &Path) -> Result<Self, HostConfigError> {
        toml::from_str(contents).map_err(|e| HostConfigError::Parse {
            path: path.display().to_string(),
            cause: e.to_string(),
        })
    }
}

/// Load the host configuration.
///
/// An explicit path must exist. Without one, the default location is used
/// when present and an empty configuration otherwise.
pub fn load_host_config(explicit: Option<&Path>) -> Result<FileConfig, HostConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(HostConfigError::NotFound {
                path: path.display().to_string(),
            })
        }
        Some(path) => path.to_path_buf(),
        None => match paths::default_host_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(FileConfig::default()),
        },
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| HostConfigError::Read {
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    log::debug!("Loaded host configuration from {}", path.display());
    FileConfig::parse(&contents, &path)
}

/// Effective host settings after merging flags, file and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct HostSettings {
    pub plugin_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<String>,
    pub color: bool,
}

impl HostSettings {
    /// `terminal_color` is used only when neither flags nor file decide.
    pub fn merge(args: &Args, file: FileConfig, terminal_color: bool) -> Self {
        let log_file = args
            .log_file
            .clone()
            .or(file.log_file)
            // "none" and "-" disable file logging
            .filter(|f| !f.eq_ignore_ascii_case("none") && f != "-");

        Self {
            plugin_dir: args
                .plugin_dir
                .clone()
                .or(file.plugin_dir)
                .unwrap_or_else(paths::default_plugin_dir),
            cache_dir: args
                .cache_dir
                .clone()
                .or(file.cache_dir)
                .unwrap_or_else(paths::default_cache_dir),
            log_level: args
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
            log_format: args
                .log_format
                .clone()
                .or(file.log_format)
                .unwrap_or_else(|| "text".to_string()),
            log_file,
            color: args.color_setting().or(file.color).unwrap_or(terminal_color),
        }
    }
}
