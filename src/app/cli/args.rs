//! Command-line arguments for the plugin host

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "daiv-plugin")]
#[command(about = "Install, load and run daiv plugins")]
#[command(version)]
#[command(long_version = crate::core::version::long_version())]
pub struct Args {
    /// Plugin directory override
    #[arg(short = 'p', long = "plugin-dir", value_name = "DIR", global = true)]
    pub plugin_dir: Option<PathBuf>,

    /// Directory holding cached plugin configuration
    #[arg(long = "cache-dir", value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true,
          value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true,
          value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<String>,

    /// Force coloured output
    #[arg(long = "color", global = true, overrides_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", global = true, overrides_with = "color")]
    pub no_color: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// `Some(true)` for `--color`, `Some(false)` for `--no-color`, `None` to
    /// defer to the config file or terminal detection
    pub fn color_setting(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Net verbosity delta applied to the configured log level
    pub fn verbosity(&self) -> i8 {
        (self.verbose.min(i8::MAX as u8) as i8).saturating_sub(self.quiet.min(i8::MAX as u8) as i8)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Install a plugin library into the plugin directory
    #[command(subcommand)]
    Install(InstallSource),

    /// List installed plugin libraries
    List,

    /// Load installed plugins and print their standup context
    Standup {
        /// Hours of activity to cover, ending now
        #[arg(long, value_name = "N", default_value_t = 24,
              value_parser = clap::value_parser!(i64).range(1..))]
        hours: i64,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Command {
    /// Context line used when the command fails
    pub fn context(&self) -> &'static str {
        match self {
            Command::Install(_) => "Plugin installation",
            Command::List => "Listing installed plugins",
            Command::Standup { .. } => "Standup report",
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum InstallSource {
    /// Clone and build a plugin from a hosted repository
    Repo {
        /// Repository as owner/name
        #[arg(value_name = "OWNER/NAME")]
        repository: String,

        /// Branch, tag or commit to build
        #[arg(long = "rev", value_name = "REVISION")]
        revision: Option<String>,
    },

    /// Download a prebuilt plugin library
    Url {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Copy a plugin library from the local filesystem
    File {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
