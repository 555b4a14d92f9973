//! Dynamic plugin loading
//!
//! External plugins are native shared libraries built against this crate.
//! A library is admitted only if it exports both entry points declared by
//! [`declare_plugin!`](crate::declare_plugin), reports an API version whose
//! major component matches the host's, and yields a non-null plugin with a
//! non-empty name.

use crate::core::version;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::{Plugin, StandupPlugin};
use crate::plugin::types::{PluginManifest, PluginSettings};
use libloading::Library;
use std::path::Path;

/// File extensions recognised as native plugin libraries
pub const PLUGIN_EXTENSIONS: [&str; 3] = ["so", "dylib", "dll"];

/// Exported symbol returning the API version a plugin was built against
pub const API_VERSION_SYMBOL: &[u8] = b"_daiv_plugin_api_version\0";

/// Exported symbol constructing the plugin instance
pub const CREATE_SYMBOL: &[u8] = b"_daiv_plugin_create\0";

type PluginApiVersionFn = unsafe extern "C" fn() -> u32;

#[allow(improper_ctypes_definitions)]
type PluginCreateFn = unsafe extern "C" fn() -> *mut Box<dyn Plugin>;

/// Whether `path` carries a recognised plugin library extension
pub fn has_plugin_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PLUGIN_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Turns a plugin library on disk into a plugin instance
pub trait PluginLoader: Send + Sync {
    fn load(&self, path: &Path) -> PluginResult<Box<dyn Plugin>>;
}

/// Loads native shared libraries with `libloading`
#[derive(Debug, Clone, Copy)]
pub struct NativeLoader {
    host_api_version: u32,
}

impl NativeLoader {
    pub fn new() -> Self {
        Self {
            host_api_version: version::get_api_version(),
        }
    }
}

impl Default for NativeLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn load_error(path: &Path, cause: impl std::fmt::Display) -> PluginError {
    PluginError::LoadError {
        plugin_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        cause: cause.to_string(),
    }
}

impl PluginLoader for NativeLoader {
    fn load(&self, path: &Path) -> PluginResult<Box<dyn Plugin>> {
        // SAFETY: loading runs the library's initialisers; plugins are
        // trusted code installed by the operator.
        let library =
            unsafe { Library::new(path) }.map_err(|e| load_error(path, format!("open: {}", e)))?;

        let (api_version, create) = unsafe {
            let api_version = library
                .get::<PluginApiVersionFn>(API_VERSION_SYMBOL)
                .map_err(|e| load_error(path, format!("missing API version symbol: {}", e)))?;
            let create = library
                .get::<PluginCreateFn>(CREATE_SYMBOL)
                .map_err(|e| load_error(path, format!("missing plugin entry point: {}", e)))?;
            (*api_version, *create)
        };

        let plugin_api_version = unsafe { api_version() };
        let plugin = self.admit(path, plugin_api_version, create)?;

        Ok(Box::new(ExternalPlugin { plugin, library }))
    }
}

impl NativeLoader {
    /// Admission checks applied once a library's entry points are resolved.
    fn admit(
        &self,
        path: &Path,
        plugin_api_version: u32,
        create: PluginCreateFn,
    ) -> PluginResult<Box<dyn Plugin>> {
        if !version::is_api_compatible(self.host_api_version, plugin_api_version) {
            return Err(PluginError::VersionIncompatible {
                message: format!(
                    "{} was built for API version {} (host expects major version {})",
                    path.display(),
                    plugin_api_version,
                    version::major_version(self.host_api_version)
                ),
            });
        }

        let raw = unsafe { create() };
        if raw.is_null() {
            return Err(load_error(path, "entry point returned no plugin"));
        }
        // SAFETY: produced by Box::into_raw in declare_plugin!
        let plugin = unsafe { *Box::from_raw(raw) };

        if plugin.name().is_empty() {
            return Err(load_error(path, "plugin reports an empty name"));
        }
        Ok(plugin)
    }
}

/// A plugin whose code lives in a dynamically loaded library.
///
/// Field order matters: the plugin is dropped before its library is unmapped.
pub struct ExternalPlugin {
    plugin: Box<dyn Plugin>,
    #[allow(dead_code)]
    library: Library,
}

impl std::fmt::Debug for ExternalPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalPlugin")
            .field("name", &self.plugin.name())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Plugin for ExternalPlugin {
    fn name(&self) -> &str {
        self.plugin.name()
    }

    fn manifest(&self) -> PluginManifest {
        self.plugin.manifest()
    }

    async fn initialize(&mut self, settings: &PluginSettings) -> PluginResult<()> {
        self.plugin.initialize(settings).await
    }

    async fn shutdown(&mut self) -> PluginResult<()> {
        self.plugin.shutdown().await
    }

    fn as_standup_plugin(&self) -> Option<&dyn StandupPlugin> {
        self.plugin.as_standup_plugin()
    }
}

/// Export a plugin type from a `cdylib` so the host can load it.
///
/// A constructor that panics yields a null instance, which the host
/// reports as a load failure for that file only.
///
/// ```rust,ignore
/// daiv_plugin::declare_plugin!(GitPlugin, GitPlugin::default);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($plugin_type:ty, $constructor:path) => {
        #[no_mangle]
        pub extern "C" fn _daiv_plugin_api_version() -> u32 {
            $crate::core::version::get_api_version()
        }

        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn _daiv_plugin_create() -> *mut ::std::boxed::Box<dyn $crate::plugin::api::Plugin> {
            match ::std::panic::catch_unwind(|| {
                let plugin: $plugin_type = $constructor();
                let boxed: ::std::boxed::Box<dyn $crate::plugin::api::Plugin> =
                    ::std::boxed::Box::new(plugin);
                boxed
            }) {
                Ok(boxed) => ::std::boxed::Box::into_raw(::std::boxed::Box::new(boxed)),
                Err(_) => ::std::ptr::null_mut(),
            }
        }
    };
}
