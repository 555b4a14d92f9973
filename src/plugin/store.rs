//! Persisted plugin configuration
//!
//! A flat key → value mapping shared by all plugins, stored as
//! `config.toml` in the cache directory. The file is read when the store is
//! prepared and rewritten wholesale on every save.

use crate::core::paths::CONFIG_CACHE_FILE;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::types::ConfigValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Durable key/value store for resolved configuration
pub trait ConfigStore: Send {
    /// Make the store usable: create its location and load current contents.
    fn prepare(&mut self) -> PluginResult<()>;

    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// Stage a value; nothing is durable until [`ConfigStore::write_all`].
    fn set(&mut self, key: &str, value: ConfigValue);

    fn write_all(&mut self) -> PluginResult<()>;
}

/// TOML-file backed store
#[derive(Debug)]
pub struct TomlConfigStore {
    cache_dir: PathBuf,
    values: BTreeMap<String, ConfigValue>,
}

impl TomlConfigStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.cache_dir.join(CONFIG_CACHE_FILE)
    }

    fn load(path: &Path) -> PluginResult<BTreeMap<String, ConfigValue>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(PluginError::io("read configuration cache", path.display(), e)),
        };

        let table: toml::Table = toml::from_str(&contents)
            .map_err(|e| PluginError::io("parse configuration cache", path.display(), e))?;

        let mut values = BTreeMap::new();
        for (key, raw) in table {
            match raw.try_into::<ConfigValue>() {
                Ok(value) => {
                    values.insert(key, value);
                }
                Err(_) => log::warn!(
                    "Ignoring cached value for '{}' in {}: not a string, boolean or string list",
                    key,
                    path.display()
                ),
            }
        }
        Ok(values)
    }
}

impl ConfigStore for TomlConfigStore {
    fn prepare(&mut self) -> PluginResult<()> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            PluginError::io("create cache directory", self.cache_dir.display(), e)
        })?;
        self.values = Self::load(&self.config_path())?;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    fn write_all(&mut self) -> PluginResult<()> {
        let path = self.config_path();
        let contents = toml::to_string(&self.values)
            .map_err(|e| PluginError::io("serialize configuration cache", path.display(), e))?;
        std::fs::write(&path, contents)
            .map_err(|e| PluginError::io("write configuration cache", path.display(), e))?;
        log::debug!("Saved {} configuration values to {}", self.values.len(), path.display());
        Ok(())
    }
}
