pub mod app;
pub mod core;
pub mod plugin;

pub use crate::core::version::get_api_version as get_plugin_api_version;
