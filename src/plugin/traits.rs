//! Plugin Trait System
//!
//! Capability contracts for plugins.
//!
//! Every plugin implements [`Plugin`]: a unique name, a manifest of the
//! configuration it needs, and initialise/shutdown hooks. Plugins that
//! contribute standup content also implement [`StandupPlugin`] and expose it
//! through [`Plugin::as_standup_plugin`], which the registry probes at
//! runtime when enumerating reporting-capable plugins.
//!
//! Lifecycle per instance: constructed, configured and initialised once by
//! the registry, queried any number of times, shut down once. There is no
//! re-initialisation path.

use crate::plugin::error::PluginResult;
use crate::plugin::types::{PluginManifest, PluginSettings, StandupContext, TimeRange};

/// Base plugin trait that all plugins must implement
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    /// Unique, immutable identifier for this plugin
    fn name(&self) -> &str;

    /// Configuration this plugin needs, built fresh on every call
    fn manifest(&self) -> PluginManifest;

    /// Finish setup with fully resolved configuration
    async fn initialize(&mut self, settings: &PluginSettings) -> PluginResult<()>;

    /// Release resources; called once when the host tears plugins down
    async fn shutdown(&mut self) -> PluginResult<()>;

    /// Returns `Some` when this plugin also provides standup content
    fn as_standup_plugin(&self) -> Option<&dyn StandupPlugin> {
        None
    }
}

/// Plugins that produce standup content for a time window
///
/// Implementors override [`Plugin::as_standup_plugin`] to return `Some(self)`.
#[async_trait::async_trait]
pub trait StandupPlugin: Plugin {
    async fn get_standup_context(&self, time_range: &TimeRange) -> PluginResult<StandupContext>;
}
