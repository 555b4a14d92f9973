//! Installing from local files and loading what was staged

use daiv_plugin::plugin::api::{PluginError, PluginInstaller, SharedPluginRegistry};
use daiv_plugin::plugin::api::{ConfigResolver, TomlConfigStore};
use tempfile::TempDir;

use crate::common::FixedAnswers;

#[tokio::test]
async fn test_local_install_then_list() {
    let source = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let plugins_dir = data.path().join("plugins");

    let library = source.path().join("standup-git.so");
    std::fs::write(&library, b"\x7fELF not really").unwrap();

    let installer = PluginInstaller::new(&plugins_dir).unwrap();
    assert!(plugins_dir.is_dir());

    let staged = installer.install_from_local_file(&library).await.unwrap();
    assert_eq!(staged, plugins_dir.join("standup-git.so"));
    assert_eq!(installer.list_installed().unwrap(), vec![staged]);
}

#[tokio::test]
async fn test_local_install_rejects_wrong_extension() {
    let source = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let library = source.path().join("standup-git.zip");
    std::fs::write(&library, b"zip").unwrap();

    let installer = PluginInstaller::new(data.path()).unwrap();
    let err = installer.install_from_local_file(&library).await.unwrap_err();

    assert!(matches!(err, PluginError::InvalidFormat { .. }));
    assert!(installer.list_installed().unwrap().is_empty());
}

#[tokio::test]
async fn test_unloadable_staged_library_is_skipped() {
    let source = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let library = source.path().join("broken.so");
    std::fs::write(&library, b"garbage").unwrap();

    let installer = PluginInstaller::new(data.path().join("plugins")).unwrap();
    installer.install_from_local_file(&library).await.unwrap();

    let registry = SharedPluginRegistry::new(ConfigResolver::new(
        Box::new(TomlConfigStore::new(data.path().join("cache"))),
        Box::new(FixedAnswers::cancelling()),
    ));
    let admitted = registry.load_external_plugins(&installer).await.unwrap();

    assert_eq!(admitted, 0);
    assert_eq!(registry.plugin_count().await, 0);
}
