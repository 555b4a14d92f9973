//! CLI Integration Tests
//!
//! Run the built binary against scratch directories and check exit codes
//! and staged files.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("daiv.toml"), "log_level = \"warn\"\n").unwrap();
        Self { root }
    }

    fn plugins_dir(&self) -> std::path::PathBuf {
        self.root.path().join("plugins")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_daiv-plugin"))
            .arg("--config")
            .arg(self.root.path().join("daiv.toml"))
            .arg("--plugin-dir")
            .arg(self.plugins_dir())
            .arg("--cache-dir")
            .arg(self.root.path().join("cache"))
            .arg("--no-color")
            .args(args)
            .output()
            .unwrap()
    }

    fn source_file(&self, name: &str) -> std::path::PathBuf {
        let path = self.root.path().join(name);
        std::fs::write(&path, b"library bytes").unwrap();
        path
    }
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_list_with_no_plugins() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No plugins installed"));
}

#[test]
fn test_install_file_then_list() {
    let sandbox = Sandbox::new();
    let library = sandbox.source_file("standup-git.so");

    let output = sandbox.run(&["install", "file", path_arg(&library)]);
    assert!(output.status.success());
    assert!(sandbox.plugins_dir().join("standup-git.so").is_file());

    let output = sandbox.run(&["list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("standup-git.so"));
}

#[test]
fn test_install_file_with_wrong_extension_fails() {
    let sandbox = Sandbox::new();
    let notes = sandbox.source_file("notes.txt");

    let output = sandbox.run(&["install", "file", path_arg(&notes)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!sandbox.plugins_dir().join("notes.txt").exists());
}

#[test]
fn test_install_repo_with_bad_identifier_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["install", "repo", "not-a-repo"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_missing_config_file_fails() {
    let sandbox = Sandbox::new();
    let output = Command::new(env!("CARGO_BIN_EXE_daiv-plugin"))
        .arg("--config")
        .arg(sandbox.root.path().join("absent.toml"))
        .arg("list")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_standup_with_no_plugins_prints_empty_json() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["standup", "--format", "json"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}
