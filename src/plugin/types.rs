//! Type definitions for the plugin system
//!
//! Configuration declarations a plugin publishes in its manifest, the
//! resolved settings it receives, and the values a reporting plugin returns.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Kind of input a configuration field expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    /// Single-line text
    String,
    /// Single-line secret; its stored value is never shown as a prompt default
    Password,
    /// Free text split into one entry per line
    Multiline,
    /// A list of selected entries
    MultiSelect,
    /// Yes/no toggle
    Boolean,
}

impl ConfigType {
    /// Types whose values are held as a list of strings
    pub fn is_list(self) -> bool {
        matches!(self, ConfigType::Multiline | ConfigType::MultiSelect)
    }
}

/// A configuration value.
///
/// Serialised untagged so the persisted cache holds plain TOML scalars and
/// string arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Boolean(bool),
    String(String),
    StringList(Vec<String>),
}

impl ConfigValue {
    /// The empty value for a declared type
    pub fn empty_for(config_type: ConfigType) -> Self {
        match config_type {
            ConfigType::Boolean => ConfigValue::Boolean(false),
            ConfigType::Multiline | ConfigType::MultiSelect => ConfigValue::StringList(Vec::new()),
            ConfigType::String | ConfigType::Password => ConfigValue::String(String::new()),
        }
    }

    /// Booleans always count as a value.
    pub fn is_empty(&self) -> bool {
        match self {
            ConfigValue::Boolean(_) => false,
            ConfigValue::String(s) => s.is_empty(),
            ConfigValue::StringList(items) => items.is_empty(),
        }
    }

    /// Convert to the shape `config_type` requires, if the value allows it.
    ///
    /// A single string becomes a one-line list for list types; a list never
    /// collapses into a scalar.
    pub fn coerce(self, config_type: ConfigType) -> Option<Self> {
        match (config_type, self) {
            (ConfigType::Boolean, ConfigValue::Boolean(b)) => Some(ConfigValue::Boolean(b)),
            (ConfigType::Boolean, ConfigValue::String(s)) => parse_bool(&s).map(ConfigValue::Boolean),
            (ConfigType::String | ConfigType::Password, ConfigValue::String(s)) => {
                Some(ConfigValue::String(s))
            }
            (ConfigType::String | ConfigType::Password, ConfigValue::Boolean(b)) => {
                Some(ConfigValue::String(b.to_string()))
            }
            (t, ConfigValue::StringList(items)) if t.is_list() => {
                Some(ConfigValue::StringList(items))
            }
            (t, ConfigValue::String(s)) if t.is_list() => Some(ConfigValue::StringList(split_lines(&s))),
            _ => None,
        }
    }

    /// Parse an environment variable's text as a value of `config_type`.
    pub fn from_env_string(config_type: ConfigType, raw: &str) -> Option<Self> {
        ConfigValue::String(raw.to_string()).coerce(config_type)
    }

    /// Text written to an environment variable; lists are newline-joined.
    pub fn to_env_string(&self) -> String {
        match self {
            ConfigValue::Boolean(b) => b.to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::StringList(items) => items.join("\n"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringList(items) => Some(items),
            _ => None,
        }
    }
}

/// Split submitted multi-line text into entries. Empty text yields no entries.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(|line| line.to_string()).collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// One configurable field a plugin declares
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigKey {
    pub config_type: ConfigType,
    /// Stable key used for the persisted cache
    pub key: String,
    /// Current (default) value, always of the shape `config_type` requires
    pub value: ConfigValue,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub secret: bool,
    /// Environment variable that overrides the cache for this key
    pub env_var: Option<String>,
}

impl ConfigKey {
    pub fn new(config_type: ConfigType, key: &str, name: &str) -> Self {
        Self {
            config_type,
            key: key.to_string(),
            value: ConfigValue::empty_for(config_type),
            name: name.to_string(),
            description: String::new(),
            required: false,
            secret: false,
            env_var: None,
        }
    }

    pub fn string(key: &str, name: &str) -> Self {
        Self::new(ConfigType::String, key, name)
    }

    pub fn password(key: &str, name: &str) -> Self {
        Self::new(ConfigType::Password, key, name).secret()
    }

    pub fn multiline(key: &str, name: &str) -> Self {
        Self::new(ConfigType::Multiline, key, name)
    }

    pub fn multi_select(key: &str, name: &str) -> Self {
        Self::new(ConfigType::MultiSelect, key, name)
    }

    pub fn boolean(key: &str, name: &str) -> Self {
        Self::new(ConfigType::Boolean, key, name)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn env_var(mut self, env_var: &str) -> Self {
        self.env_var = Some(env_var.to_string());
        self
    }

    /// Set the default value. Values that cannot take this key's shape are ignored.
    pub fn with_value(mut self, value: ConfigValue) -> Self {
        if let Some(value) = value.coerce(self.config_type) {
            self.value = value;
        }
        self
    }
}

/// Configuration a plugin needs resolved before it can initialise.
///
/// Plugins build this on every `manifest()` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginManifest {
    pub config_keys: Vec<ConfigKey>,
}

impl PluginManifest {
    pub fn new(config_keys: Vec<ConfigKey>) -> Self {
        Self { config_keys }
    }
}

/// Resolved configuration handed to `Plugin::initialize`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSettings {
    values: BTreeMap<String, ConfigValue>,
}

impl PluginSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(ConfigValue::as_list)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }
}

/// Reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The window ending now and starting `hours` earlier
    pub fn last_hours(hours: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::hours(hours),
            end,
        }
    }

    /// Strictly inside the window; neither boundary instant is included.
    pub fn is_in_range(&self, time: DateTime<Utc>) -> bool {
        time > self.start && time < self.end
    }
}

/// Standup content contributed by one plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandupContext {
    pub plugin_name: String,
    pub content: String,
}

impl fmt::Display for StandupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_delimited(f, &self.plugin_name, &self.content)
    }
}

/// Report output with free-form metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub plugin_name: String,
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_delimited(f, &self.plugin_name, &self.content)
    }
}

impl From<StandupContext> for Report {
    fn from(context: StandupContext) -> Self {
        Self {
            plugin_name: context.plugin_name,
            content: context.content,
            metadata: HashMap::new(),
        }
    }
}

// Empty content renders as nothing at all, not an empty block.
fn write_delimited(f: &mut fmt::Formatter<'_>, name: &str, content: &str) -> fmt::Result {
    if content.is_empty() {
        return Ok(());
    }
    write!(f, "\n\n<{name}>\n{content}\n</{name}>\n\n")
}
