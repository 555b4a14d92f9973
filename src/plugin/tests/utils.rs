//! Plugin Test Utilities
//!
//! Mock plugins and scripted collaborators shared across the plugin test
//! modules.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::form::{FormField, FormRenderer, FormValues};
use crate::plugin::loader::PluginLoader;
use crate::plugin::process::{CommandOutput, CommandRunner};
use crate::plugin::store::ConfigStore;
use crate::plugin::traits::{Plugin, StandupPlugin};
use crate::plugin::types::{
    ConfigKey, ConfigValue, PluginManifest, PluginSettings, StandupContext, TimeRange,
};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Configurable mock plugin without standup capability
#[derive(Debug)]
pub struct MockPlugin {
    pub name: String,
    pub marker: String,
    pub config_keys: Vec<ConfigKey>,
    pub should_fail_initialize: bool,
    pub should_fail_shutdown: bool,
    init_calls: Arc<AtomicUsize>,
    shutdown_calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Option<PluginSettings>>>,
}

impl MockPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            marker: String::new(),
            config_keys: Vec::new(),
            should_fail_initialize: false,
            should_fail_shutdown: false,
            init_calls: Arc::new(AtomicUsize::new(0)),
            shutdown_calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(None)),
        }
    }

    /// Tag this instance so tests can tell two same-named plugins apart;
    /// surfaces as the description of the trailing `marker` manifest key.
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn with_keys(mut self, config_keys: Vec<ConfigKey>) -> Self {
        self.config_keys = config_keys;
        self
    }

    pub fn failing_initialize(mut self) -> Self {
        self.should_fail_initialize = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.should_fail_shutdown = true;
        self
    }

    pub fn init_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.init_calls)
    }

    pub fn shutdown_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.shutdown_calls)
    }

    /// Settings passed to the most recent `initialize`
    pub fn received_settings(&self) -> Arc<Mutex<Option<PluginSettings>>> {
        Arc::clone(&self.received)
    }
}

#[async_trait::async_trait]
impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn manifest(&self) -> PluginManifest {
        let mut keys = self.config_keys.clone();
        keys.push(ConfigKey::string("marker", "Marker").description(&self.marker));
        PluginManifest::new(keys)
    }

    async fn initialize(&mut self, settings: &PluginSettings) -> PluginResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_initialize {
            return Err(PluginError::ExecutionError {
                plugin_name: self.name.clone(),
                operation: "initialize".to_string(),
                cause: "mock initialize failure".to_string(),
            });
        }
        *self.received.lock().unwrap() = Some(settings.clone());
        Ok(())
    }

    async fn shutdown(&mut self) -> PluginResult<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_shutdown {
            return Err(PluginError::ExecutionError {
                plugin_name: self.name.clone(),
                operation: "shutdown".to_string(),
                cause: "mock shutdown failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Mock plugin with standup capability
#[derive(Debug)]
pub struct MockStandupPlugin {
    pub base: MockPlugin,
    pub content: String,
    pub should_fail_context: bool,
}

impl MockStandupPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            base: MockPlugin::new(name),
            content: format!("{} did things", name),
            should_fail_context: false,
        }
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn failing_context(mut self) -> Self {
        self.should_fail_context = true;
        self
    }
}

#[async_trait::async_trait]
impl Plugin for MockStandupPlugin {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn manifest(&self) -> PluginManifest {
        self.base.manifest()
    }

    async fn initialize(&mut self, settings: &PluginSettings) -> PluginResult<()> {
        self.base.initialize(settings).await
    }

    async fn shutdown(&mut self) -> PluginResult<()> {
        self.base.shutdown().await
    }

    fn as_standup_plugin(&self) -> Option<&dyn StandupPlugin> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl StandupPlugin for MockStandupPlugin {
    async fn get_standup_context(&self, _time_range: &TimeRange) -> PluginResult<StandupContext> {
        if self.should_fail_context {
            return Err(PluginError::ExecutionError {
                plugin_name: self.name().to_string(),
                operation: "get_standup_context".to_string(),
                cause: "mock context failure".to_string(),
            });
        }
        Ok(StandupContext {
            plugin_name: self.name().to_string(),
            content: self.content.clone(),
        })
    }
}

/// In-memory store; contents stay observable after the store is moved
/// into a resolver.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    pub values: Arc<Mutex<BTreeMap<String, ConfigValue>>>,
    pub writes: Arc<AtomicUsize>,
    pub prepares: Arc<AtomicUsize>,
    pub fail_prepare: bool,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: ConfigValue) -> Self {
        self.values.lock().unwrap().insert(key.to_string(), value);
        self
    }

    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    pub fn value(&self, key: &str) -> Option<ConfigValue> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn prepare(&mut self) -> PluginResult<()> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        if self.fail_prepare {
            return Err(PluginError::io(
                "create cache directory",
                "/unwritable/daiv",
                "permission denied",
            ));
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.value(key)
    }

    fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    fn write_all(&mut self) -> PluginResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Form renderer replaying queued responses and recording what it was asked
#[derive(Debug, Clone, Default)]
pub struct ScriptedForm {
    responses: Arc<Mutex<VecDeque<PluginResult<FormValues>>>>,
    pub rendered: Arc<Mutex<Vec<Vec<FormField>>>>,
}

impl ScriptedForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: PluginResult<FormValues>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }
}

impl FormRenderer for ScriptedForm {
    fn render(&self, fields: &[FormField]) -> PluginResult<FormValues> {
        self.rendered.lock().unwrap().push(fields.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(PluginError::FormCancelled))
    }
}

/// One recorded command invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

/// Command runner that records invocations and simulates git and cargo.
///
/// A successful `cargo build` writes the expected library into the
/// checkout's `target/release`. `fail_on` names the first argument
/// (`clone`, `checkout`, `build`) of a step that should exit non-zero.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    pub calls: Arc<Mutex<Vec<RecordedCommand>>>,
    pub fail_on: Option<String>,
    pub artifact_name: Option<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, step: &str) -> Self {
        self.fail_on = Some(step.to_string());
        self
    }

    pub fn producing(mut self, artifact_name: &str) -> Self {
        self.artifact_name = Some(artifact_name.to_string());
        self
    }

    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> PluginResult<CommandOutput> {
        self.calls.lock().unwrap().push(RecordedCommand {
            program: program.to_string(),
            args: args.to_vec(),
            working_dir: working_dir.map(Path::to_path_buf),
        });

        let step = args.first().map(String::as_str).unwrap_or_default();
        if self.fail_on.as_deref() == Some(step) {
            return Ok(CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: format!("fatal: simulated {} failure", step),
            });
        }

        match (program, step) {
            ("git", "clone") => {
                if let Some(target) = args.get(2) {
                    std::fs::create_dir_all(target).unwrap();
                }
            }
            ("cargo", "build") => {
                if let (Some(dir), Some(name)) = (working_dir, &self.artifact_name) {
                    let release = dir.join("target").join("release");
                    std::fs::create_dir_all(&release).unwrap();
                    std::fs::write(release.join(name), b"built library").unwrap();
                }
            }
            _ => {}
        }

        Ok(CommandOutput {
            success: true,
            code: Some(0),
            ..Default::default()
        })
    }
}

/// Loader admitting files whose name starts with `good`; the plugin is
/// named after the file stem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeLoader;

impl PluginLoader for FakeLoader {
    fn load(&self, path: &Path) -> PluginResult<Box<dyn Plugin>> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !file_name.starts_with("good") {
            return Err(PluginError::LoadError {
                plugin_name: file_name,
                cause: "open: invalid ELF header".to_string(),
            });
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Box::new(MockStandupPlugin::new(&stem)))
    }
}
