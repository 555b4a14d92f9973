//! Well-known host directories.

use std::path::PathBuf;

/// Application directory name under the platform data/cache/config roots.
pub const APP_DIR_NAME: &str = "daiv";

/// File name of the persisted plugin-configuration cache.
pub const CONFIG_CACHE_FILE: &str = "config.toml";

/// File name of the host configuration file.
pub const HOST_CONFIG_FILE: &str = "daiv.toml";

/// Default directory holding staged plugin libraries.
pub fn default_plugin_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join(APP_DIR_NAME).join("plugins");
    }

    PathBuf::from("./plugins")
}

/// Default directory holding the persisted plugin-configuration cache.
pub fn default_cache_dir() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join(APP_DIR_NAME);
    }

    PathBuf::from("./.daiv-cache")
}

/// Default location of the host configuration file, if a config root exists.
pub fn default_host_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(HOST_CONFIG_FILE))
}
