//! Plugin Initialization
//!
//! Guarantees a plugin's required configuration exists before the plugin's
//! own `initialize` runs.
//!
//! Each declared key resolves by precedence: a non-empty environment
//! variable (when the key names one), then the persisted cache, then the
//! key's declared default. Required keys that are still empty are collected
//! through the form renderer in a single form. Submitted values go to the
//! environment for env-backed keys and to the cache for all others; the
//! resolved settings are then re-read and passed to the plugin.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::form::{FieldKind, FormField, FormRenderer, FormValue, FormValues};
use crate::plugin::store::ConfigStore;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{split_lines, ConfigKey, ConfigType, ConfigValue, PluginSettings};
use std::sync::{Mutex, MutexGuard};

const MULTILINE_FIELD_LINES: usize = 5;

/// Reconciles environment, cached and interactively collected configuration
pub struct ConfigResolver {
    store: Mutex<Box<dyn ConfigStore>>,
    form: Box<dyn FormRenderer>,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver").finish_non_exhaustive()
    }
}

impl ConfigResolver {
    pub fn new(store: Box<dyn ConfigStore>, form: Box<dyn FormRenderer>) -> Self {
        Self {
            store: Mutex::new(store),
            form,
        }
    }

    fn store(&self) -> PluginResult<MutexGuard<'_, Box<dyn ConfigStore>>> {
        self.store.lock().map_err(|_| PluginError::Generic {
            message: "configuration store lock is poisoned".to_string(),
        })
    }

    /// Resolve configuration for `plugin`, prompting for missing required
    /// keys, then call the plugin's own `initialize`.
    ///
    /// Nothing is persisted if the form is cancelled, and the plugin is not
    /// initialised unless every step before it succeeded.
    pub async fn initialize(&self, plugin: &mut dyn Plugin) -> PluginResult<()> {
        let plugin_name = plugin.name().to_string();
        let config_keys = plugin.manifest().config_keys;

        self.store()?.prepare()?;

        let settings = self.resolve(&config_keys)?;
        let missing = missing_config_keys(&config_keys, &settings);

        if !missing.is_empty() {
            log::info!(
                "Plugin '{}' needs {} configuration value(s)",
                plugin_name,
                missing.len()
            );
            let submitted = self.prompt_config_keys(&missing)?;
            self.save_changes(&submitted)?;
        }

        let settings = self.resolve(&config_keys)?;
        let still_missing = missing_config_keys(&config_keys, &settings);
        if !still_missing.is_empty() {
            return Err(PluginError::ConfigurationError {
                plugin_name,
                message: format!(
                    "required configuration is empty: {}",
                    still_missing
                        .iter()
                        .map(|key| key.key.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }

        plugin
            .initialize(&settings)
            .await
            .map_err(|e| PluginError::InitializationFailed {
                plugin_name: plugin_name.clone(),
                cause: e.to_string(),
            })?;

        log::debug!("Plugin '{}' initialized with {} settings", plugin_name, settings.len());
        Ok(())
    }

    /// Current value of every declared key.
    pub fn resolve(&self, config_keys: &[ConfigKey]) -> PluginResult<PluginSettings> {
        let store = self.store()?;
        let mut settings = PluginSettings::new();

        for key in config_keys {
            let value = env_value(key)
                .or_else(|| cached_value(store.as_ref(), key))
                .unwrap_or_else(|| key.value.clone());
            settings.insert(&key.key, value);
        }

        Ok(settings)
    }

    /// Render one form covering every missing key and return the keys with
    /// their submitted values.
    fn prompt_config_keys(&self, missing: &[ConfigKey]) -> PluginResult<Vec<ConfigKey>> {
        let fields: Vec<FormField> = missing.iter().map(form_field).collect();
        let values = self.form.render(&fields)?;

        Ok(missing
            .iter()
            .map(|key| apply_submission(key, &values))
            .collect())
    }

    fn save_changes(&self, changed: &[ConfigKey]) -> PluginResult<()> {
        if changed.is_empty() {
            return Ok(());
        }

        let mut store = self.store()?;
        let mut cache_dirty = false;

        for key in changed {
            match &key.env_var {
                Some(env_var) => std::env::set_var(env_var, key.value.to_env_string()),
                None => {
                    store.set(&key.key, key.value.clone());
                    cache_dirty = true;
                }
            }
        }

        if cache_dirty {
            store.write_all()?;
        }
        Ok(())
    }
}

fn env_value(key: &ConfigKey) -> Option<ConfigValue> {
    let env_var = key.env_var.as_deref()?;
    let raw = std::env::var(env_var).ok().filter(|raw| !raw.is_empty())?;
    let value = ConfigValue::from_env_string(key.config_type, &raw);
    if value.is_none() {
        log::warn!(
            "Ignoring {}={:?}: not a valid value for '{}'",
            env_var,
            raw,
            key.key
        );
    }
    value
}

// Env-backed keys never read the cache.
fn cached_value(store: &dyn ConfigStore, key: &ConfigKey) -> Option<ConfigValue> {
    if key.env_var.is_some() {
        return None;
    }
    let cached = store.get(&key.key)?;
    let value = cached.coerce(key.config_type);
    if value.is_none() {
        log::warn!(
            "Ignoring cached value for '{}': does not match its declared type",
            key.key
        );
    }
    value
}

/// Required keys whose resolved value is still empty, with the resolved
/// value carried as the form default.
pub fn missing_config_keys(config_keys: &[ConfigKey], settings: &PluginSettings) -> Vec<ConfigKey> {
    config_keys
        .iter()
        .filter(|key| key.required)
        .filter_map(|key| {
            let value = settings
                .get(&key.key)
                .cloned()
                .unwrap_or_else(|| ConfigValue::empty_for(key.config_type));
            value.is_empty().then(|| ConfigKey {
                value,
                ..key.clone()
            })
        })
        .collect()
}

fn form_field(key: &ConfigKey) -> FormField {
    let kind = match key.config_type {
        ConfigType::Boolean => FieldKind::Confirm {
            value: key.value.as_bool().unwrap_or(false),
        },
        ConfigType::Multiline | ConfigType::MultiSelect => FieldKind::Text {
            value: key.value.to_env_string(),
            lines: MULTILINE_FIELD_LINES,
        },
        ConfigType::String | ConfigType::Password => FieldKind::Input {
            value: key.value.as_str().unwrap_or_default().to_string(),
            required: key.required,
            sensitive: key.secret || key.config_type == ConfigType::Password,
        },
    };

    FormField {
        key: key.key.clone(),
        title: key.name.clone(),
        description: key.description.clone(),
        kind,
    }
}

fn apply_submission(key: &ConfigKey, values: &FormValues) -> ConfigKey {
    let submitted = values.get(&key.key);
    let value = match (key.config_type, submitted) {
        (ConfigType::Boolean, Some(FormValue::Bool(b))) => ConfigValue::Boolean(*b),
        (t, Some(FormValue::Text(text))) if t.is_list() => ConfigValue::StringList(split_lines(text)),
        (t, None) if t.is_list() => ConfigValue::StringList(Vec::new()),
        (_, Some(FormValue::Text(text))) => ConfigValue::String(text.clone()),
        _ => key.value.clone(),
    };

    ConfigKey {
        value,
        ..key.clone()
    }
}
