//! Generates `version.rs` with the plugin API version that host and plugin
//! libraries compare before a dynamically loaded plugin is admitted.

use chrono::Utc;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let cargo_toml = manifest_dir.join("Cargo.toml");
    let dest_path = out_dir.join("version.rs");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");

    if !is_stale(&dest_path, &cargo_toml) {
        return;
    }

    let contents = format!(
        "pub const PLUGIN_API_VERSION: &str = \"{}\";\n\
         pub const BUILD_TIME: &str = \"{}\";\n\
         pub const GIT_HASH: &str = \"{}\";\n",
        plugin_api_version(&cargo_toml),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        git_short_hash(),
    );
    fs::write(&dest_path, contents).expect("failed to write version.rs");
}

fn is_stale(generated: &Path, source: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    match (modified(generated), modified(source)) {
        (Some(generated_at), Some(source_at)) => source_at > generated_at,
        _ => true,
    }
}

/// Reads `[package.metadata] plugin_api_version` from Cargo.toml.
fn plugin_api_version(cargo_toml: &Path) -> String {
    fs::read_to_string(cargo_toml)
        .ok()
        .and_then(|content| content.parse::<toml::Table>().ok())
        .and_then(|table| {
            table
                .get("package")?
                .get("metadata")?
                .get("plugin_api_version")?
                .as_integer()
        })
        .map(|version| version.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_short_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
