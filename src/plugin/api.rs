//! Public API for the plugin system
//!
//! Everything a host or a plugin library needs, re-exported from the
//! internal modules.

// Plugin contract
pub use crate::plugin::traits::{Plugin, StandupPlugin};

// Configuration and report types
pub use crate::plugin::types::{
    split_lines, ConfigKey, ConfigType, ConfigValue, PluginManifest, PluginSettings, Report,
    StandupContext, TimeRange,
};

// Error handling
pub use crate::plugin::error::{PluginError, PluginFailure, PluginResult};

// Configuration resolution
pub use crate::plugin::form::{FieldKind, FormField, FormRenderer, FormValue, FormValues, TerminalForm};
pub use crate::plugin::initialization::{missing_config_keys, ConfigResolver};
pub use crate::plugin::store::{ConfigStore, TomlConfigStore};

// Registry
pub use crate::plugin::registry::{PluginRegistry, SharedPluginRegistry};

// Installation and loading
pub use crate::plugin::installer::{PluginInstaller, RepositoryId, DEFAULT_REPOSITORY_ORIGIN};
pub use crate::plugin::loader::{
    has_plugin_extension, ExternalPlugin, NativeLoader, PluginLoader, API_VERSION_SYMBOL,
    CREATE_SYMBOL, PLUGIN_EXTENSIONS,
};
pub use crate::plugin::process::{CommandOutput, CommandRunner, SystemCommandRunner};
