//! Common test utilities and helpers
//!
//! A small standup plugin and a scripted form renderer built only on the
//! public plugin API.

#![allow(dead_code)]

use daiv_plugin::plugin::api::{
    ConfigKey, FormField, FormRenderer, FormValue, FormValues, Plugin, PluginError, PluginManifest,
    PluginResult, PluginSettings, StandupContext, StandupPlugin, TimeRange,
};
use std::sync::{Arc, Mutex};

/// Standup plugin that needs a username and echoes it in its context
pub struct EchoPlugin {
    name: String,
    username: Arc<Mutex<Option<String>>>,
}

impl EchoPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            username: Arc::new(Mutex::new(None)),
        }
    }

    pub fn username(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.username)
    }
}

#[async_trait::async_trait]
impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(vec![
            ConfigKey::string("echo.username", "Username")
                .description("Name shown in the standup")
                .required(),
            ConfigKey::boolean("echo.loud", "Shout"),
        ])
    }

    async fn initialize(&mut self, settings: &PluginSettings) -> PluginResult<()> {
        let username = settings
            .get_str("echo.username")
            .ok_or_else(|| PluginError::ConfigurationError {
                plugin_name: self.name.clone(),
                message: "echo.username is not set".to_string(),
            })?;
        *self.username.lock().unwrap() = Some(username.to_string());
        Ok(())
    }

    async fn shutdown(&mut self) -> PluginResult<()> {
        Ok(())
    }

    fn as_standup_plugin(&self) -> Option<&dyn StandupPlugin> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl StandupPlugin for EchoPlugin {
    async fn get_standup_context(&self, _time_range: &TimeRange) -> PluginResult<StandupContext> {
        let username = self.username.lock().unwrap().clone().unwrap_or_default();
        Ok(StandupContext {
            plugin_name: self.name.clone(),
            content: format!("{} reviewed two pull requests", username),
        })
    }
}

/// Answers every form with fixed text values, counting renders
#[derive(Clone, Default)]
pub struct FixedAnswers {
    answers: Vec<(String, String)>,
    pub renders: Arc<Mutex<usize>>,
}

impl FixedAnswers {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            renders: Arc::new(Mutex::new(0)),
        }
    }

    /// Renderer that cancels any form it is shown
    pub fn cancelling() -> Self {
        Self::default()
    }
}

impl FormRenderer for FixedAnswers {
    fn render(&self, _fields: &[FormField]) -> PluginResult<FormValues> {
        *self.renders.lock().unwrap() += 1;
        if self.answers.is_empty() {
            return Err(PluginError::FormCancelled);
        }
        Ok(self
            .answers
            .iter()
            .map(|(k, v)| (k.clone(), FormValue::Text(v.clone())))
            .collect())
    }
}
