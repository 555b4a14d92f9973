//! Build metadata and plugin API version.
//!
//! The generated `version.rs` is the single source of truth for the API
//! version that the host compares against each dynamically loaded plugin.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

const FALLBACK_API_VERSION: u32 = 20250727;

/// Plugin API version this build was compiled with (`YYYYMMDD`).
pub fn get_api_version() -> u32 {
    PLUGIN_API_VERSION.parse().unwrap_or(FALLBACK_API_VERSION)
}

/// Major component of an API version (the year).
pub fn major_version(api_version: u32) -> u32 {
    api_version / 10000
}

/// Versions sharing the same major component are compatible.
pub fn is_api_compatible(host_version: u32, plugin_version: u32) -> bool {
    major_version(host_version) == major_version(plugin_version)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Text shown by `--version`: package version plus build metadata
pub fn long_version() -> String {
    format!(
        "{} (plugin API {}, built {}, commit {})",
        env!("CARGO_PKG_VERSION"),
        get_api_version(),
        build_time(),
        git_hash()
    )
}
