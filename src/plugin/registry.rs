//! Plugin Registry
//!
//! Thread-safe catalog of live plugin instances keyed by name.
//!
//! [`PluginRegistry`] is the plain map. [`SharedPluginRegistry`] is the
//! handle the host constructs once and clones to whoever needs it; it guards
//! the map with one reader/writer lock and runs configuration resolution
//! before a plugin is admitted. Registration, external loading and shutdown
//! hold the write lock across the whole resolve-and-insert sequence, so
//! they are serialised process-wide.

use crate::plugin::error::{PluginError, PluginFailure, PluginResult};
use crate::plugin::initialization::ConfigResolver;
use crate::plugin::installer::PluginInstaller;
use crate::plugin::traits::{Plugin, StandupPlugin};
use crate::plugin::types::{StandupContext, TimeRange};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Map of plugin name to initialised plugin
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Box<dyn Plugin>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.get_plugin_names())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already initialised plugin. Duplicate names are rejected
    /// and leave the existing entry untouched.
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> PluginResult<()> {
        let plugin_name = plugin.name().to_string();

        if self.plugins.contains_key(&plugin_name) {
            return Err(PluginError::AlreadyRegistered { plugin_name });
        }

        self.plugins.insert(plugin_name, plugin);
        Ok(())
    }

    pub fn get_plugin(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins.get(name).map(|p| p.as_ref())
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered plugin names, sorted
    pub fn get_plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Every registered plugin that provides standup content, in no
    /// particular order
    pub fn get_standup_plugins(&self) -> Vec<&dyn StandupPlugin> {
        self.plugins
            .values()
            .filter_map(|plugin| plugin.as_standup_plugin())
            .collect()
    }

    /// Shut down every plugin, continuing past failures.
    ///
    /// Plugins stay registered afterwards.
    pub async fn shutdown_all(&mut self) -> PluginResult<()> {
        let mut names: Vec<&String> = self.plugins.keys().collect();
        names.sort();
        let names: Vec<String> = names.into_iter().cloned().collect();

        let mut failures = Vec::new();
        for name in names {
            let Some(plugin) = self.plugins.get_mut(&name) else {
                continue;
            };
            match plugin.shutdown().await {
                Ok(()) => log::debug!("Plugin '{}' shut down", name),
                Err(e) => {
                    log::warn!("Failed to shut down plugin '{}': {}", name, e);
                    failures.push(PluginFailure {
                        plugin_name: name,
                        cause: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PluginError::ShutdownFailed { failures })
        }
    }
}

/// Cloneable, lock-guarded registry handle
#[derive(Debug, Clone)]
pub struct SharedPluginRegistry {
    inner: Arc<RwLock<PluginRegistry>>,
    resolver: Arc<ConfigResolver>,
}

impl SharedPluginRegistry {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PluginRegistry::new())),
            resolver: Arc::new(resolver),
        }
    }

    /// Resolve configuration for `plugin`, initialise it and register it.
    ///
    /// Fails without side effects if the name is taken, and never stores a
    /// plugin whose configuration or initialisation failed.
    pub async fn register(&self, mut plugin: Box<dyn Plugin>) -> PluginResult<()> {
        let mut registry = self.inner.write().await;

        let plugin_name = plugin.name().to_string();
        if registry.has_plugin(&plugin_name) {
            return Err(PluginError::AlreadyRegistered { plugin_name });
        }

        self.resolver
            .initialize(plugin.as_mut())
            .await
            .map_err(|e| match e {
                PluginError::InitializationFailed { .. } => e,
                other => PluginError::InitializationFailed {
                    plugin_name: plugin_name.clone(),
                    cause: other.to_string(),
                },
            })?;

        registry.register_plugin(plugin)?;
        log::info!("Registered plugin: {}", plugin_name);
        Ok(())
    }

    /// Load every staged external plugin and register those whose names are
    /// free. Returns how many were admitted.
    ///
    /// Plugins registered earlier in the process win: a colliding external
    /// plugin is skipped with a warning, as is one whose configuration or
    /// initialisation fails.
    pub async fn load_external_plugins(&self, installer: &PluginInstaller) -> PluginResult<usize> {
        let mut registry = self.inner.write().await;

        let loaded = installer.load_plugins()?;
        let mut admitted = 0;

        for mut plugin in loaded {
            let name = plugin.name().to_string();
            if registry.has_plugin(&name) {
                log::warn!("Plugin {} is already registered, skipping external version", name);
                continue;
            }

            if let Err(e) = self.resolver.initialize(plugin.as_mut()).await {
                log::warn!("Failed to initialize plugin {}: {}", name, e);
                continue;
            }

            registry.register_plugin(plugin)?;
            admitted += 1;
            log::info!("Loaded external plugin: {}", name);
        }

        Ok(admitted)
    }

    pub async fn has_plugin(&self, name: &str) -> bool {
        self.inner.read().await.has_plugin(name)
    }

    /// Run `f` against the named plugin under the read lock
    pub async fn with_plugin<R>(&self, name: &str, f: impl FnOnce(&dyn Plugin) -> R) -> Option<R> {
        let registry = self.inner.read().await;
        registry.get_plugin(name).map(f)
    }

    pub async fn get_plugin_names(&self) -> Vec<String> {
        self.inner.read().await.get_plugin_names()
    }

    pub async fn plugin_count(&self) -> usize {
        self.inner.read().await.plugin_count()
    }

    /// Names of registered plugins that provide standup content, sorted
    pub async fn standup_plugin_names(&self) -> Vec<String> {
        let registry = self.inner.read().await;
        let mut names: Vec<String> = registry
            .get_standup_plugins()
            .into_iter()
            .map(|plugin| plugin.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Ask every standup plugin for its context over `time_range`.
    ///
    /// One plugin's failure does not stop the others; results are sorted by
    /// plugin name.
    pub async fn collect_standup_contexts(
        &self,
        time_range: &TimeRange,
    ) -> Vec<(String, PluginResult<StandupContext>)> {
        let registry = self.inner.read().await;

        let mut results = Vec::new();
        for plugin in registry.get_standup_plugins() {
            let result = plugin.get_standup_context(time_range).await;
            results.push((plugin.name().to_string(), result));
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Shut down every registered plugin, aggregating failures.
    pub async fn shutdown_all(&self) -> PluginResult<()> {
        let mut registry = self.inner.write().await;
        registry.shutdown_all().await
    }
}
