//! Registry end to end: prompt, persist, reuse, report, shut down

use daiv_plugin::plugin::api::{
    ConfigResolver, PluginError, SharedPluginRegistry, TimeRange, TomlConfigStore,
};
use tempfile::TempDir;

use crate::common::{EchoPlugin, FixedAnswers};

fn registry(cache_dir: &std::path::Path, form: FixedAnswers) -> SharedPluginRegistry {
    SharedPluginRegistry::new(ConfigResolver::new(
        Box::new(TomlConfigStore::new(cache_dir)),
        Box::new(form),
    ))
}

#[tokio::test]
async fn test_prompted_values_persist_across_registries() {
    let cache = TempDir::new().unwrap();

    let form = FixedAnswers::new(&[("echo.username", "ada")]);
    let first = registry(cache.path(), form.clone());
    let plugin = EchoPlugin::new("echo");
    let username = plugin.username();
    first.register(Box::new(plugin)).await.unwrap();

    assert_eq!(*form.renders.lock().unwrap(), 1);
    assert_eq!(username.lock().unwrap().as_deref(), Some("ada"));

    let cached = std::fs::read_to_string(cache.path().join("config.toml")).unwrap();
    assert!(cached.contains("echo.username"));
    assert!(cached.contains("ada"));
    assert!(!cached.contains("echo.loud"));

    // A fresh registry reads the cache and never shows the form.
    let second = registry(cache.path(), FixedAnswers::cancelling());
    second.register(Box::new(EchoPlugin::new("echo"))).await.unwrap();
    assert!(second.has_plugin("echo").await);
}

#[tokio::test]
async fn test_cancelled_form_leaves_no_trace() {
    let cache = TempDir::new().unwrap();
    let registry = registry(cache.path(), FixedAnswers::cancelling());

    let err = registry
        .register(Box::new(EchoPlugin::new("echo")))
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::InitializationFailed { .. }));
    assert!(!registry.has_plugin("echo").await);
    assert!(!cache.path().join("config.toml").exists());
}

#[tokio::test]
async fn test_standup_collection_and_shutdown() {
    let cache = TempDir::new().unwrap();
    let registry = registry(cache.path(), FixedAnswers::new(&[("echo.username", "grace")]));

    registry.register(Box::new(EchoPlugin::new("echo"))).await.unwrap();
    let err = registry
        .register(Box::new(EchoPlugin::new("echo")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PluginError::AlreadyRegistered {
            plugin_name: "echo".to_string()
        }
    );

    assert_eq!(registry.standup_plugin_names().await, vec!["echo"]);
    let results = registry
        .collect_standup_contexts(&TimeRange::last_hours(24))
        .await;
    assert_eq!(results.len(), 1);
    let context = results[0].1.as_ref().unwrap();
    assert_eq!(
        context.to_string(),
        "\n\n<echo>\ngrace reviewed two pull requests\n</echo>\n\n"
    );

    registry.shutdown_all().await.unwrap();
    assert_eq!(registry.plugin_count().await, 1);
}
