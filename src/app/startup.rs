//! Host startup: argument parsing, logging, wiring and command dispatch

use crate::app::cli::args::{Args, Command, InstallSource, OutputFormat};
use crate::app::cli::config::{load_host_config, HostSettings};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, set_logging_level};
use crate::plugin::api::{
    ConfigResolver, PluginError, PluginInstaller, PluginResult, Report, SharedPluginRegistry,
    TerminalForm, TimeRange, TomlConfigStore,
};
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;

/// Run the host and return the process exit code
pub fn startup() -> i32 {
    let args = Args::parse();

    let file_config = match load_host_config(args.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(None, None, None, false);
            log_error_with_context(&e, "Loading configuration");
            return 1;
        }
    };

    let settings = HostSettings::merge(&args, file_config, std::io::stdout().is_terminal());
    colored::control::set_override(settings.color);

    if let Err(e) = init_logging(
        Some(&settings.log_level),
        Some(&settings.log_format),
        settings.log_file.as_deref(),
        settings.color,
    ) {
        eprintln!("Failed to initialise logging: {}", e);
        return 1;
    }
    if args.verbosity() != 0 {
        set_logging_level(&settings.log_level, args.verbosity());
    }

    log::debug!("Host settings: {:?}", settings);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("FATAL: failed to start async runtime: {}", e);
            return 1;
        }
    };

    let context = args.command.context();
    match runtime.block_on(run_command(args.command, &settings)) {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, context);
            1
        }
    }
}

async fn run_command(command: Command, settings: &HostSettings) -> PluginResult<()> {
    match command {
        Command::Install(source) => install(source, settings).await,
        Command::List => list(settings),
        Command::Standup { hours, format } => standup(hours, format, settings).await,
    }
}

async fn install(source: InstallSource, settings: &HostSettings) -> PluginResult<()> {
    let installer = PluginInstaller::new(&settings.plugin_dir)?;

    let staged = match source {
        InstallSource::Repo {
            repository,
            revision,
        } => {
            installer
                .install_from_repository(&repository, revision.as_deref())
                .await?
        }
        InstallSource::Url { url } => installer.install_from_url(&url).await?,
        InstallSource::File { path } => installer.install_from_local_file(&path).await?,
    };

    println!("{} {}", "Installed".green().bold(), staged.display());
    Ok(())
}

fn list(settings: &HostSettings) -> PluginResult<()> {
    let installer = PluginInstaller::new(&settings.plugin_dir)?;
    let installed = installer.list_installed()?;

    if installed.is_empty() {
        println!(
            "No plugins installed in {}",
            installer.plugins_dir().display().to_string().dimmed()
        );
        return Ok(());
    }

    for path in installed {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{}  {}", name.cyan(), path.display().to_string().dimmed());
    }
    Ok(())
}

async fn standup(hours: i64, format: OutputFormat, settings: &HostSettings) -> PluginResult<()> {
    let resolver = ConfigResolver::new(
        Box::new(TomlConfigStore::new(&settings.cache_dir)),
        Box::new(TerminalForm::stdio()),
    );
    let registry = SharedPluginRegistry::new(resolver);
    let installer = PluginInstaller::new(&settings.plugin_dir)?;

    let admitted = registry.load_external_plugins(&installer).await?;
    log::info!("Loaded {} external plugin(s)", admitted);

    let time_range = TimeRange::last_hours(hours);
    let mut reports = Vec::new();
    for (plugin_name, result) in registry.collect_standup_contexts(&time_range).await {
        match result {
            Ok(context) => {
                let mut report = Report::from(context);
                report.metadata.insert(
                    "start".to_string(),
                    serde_json::Value::String(time_range.start.to_rfc3339()),
                );
                report.metadata.insert(
                    "end".to_string(),
                    serde_json::Value::String(time_range.end.to_rfc3339()),
                );
                reports.push(report);
            }
            Err(e) => log::warn!("Plugin {} failed to produce standup context: {}", plugin_name, e),
        }
    }

    if reports.is_empty() {
        log::info!("No standup plugins produced any context");
    }

    let rendered = render_reports(&reports, format);
    let shutdown = registry.shutdown_all().await;

    print!("{}", rendered?);
    shutdown
}

fn render_reports(reports: &[Report], format: OutputFormat) -> PluginResult<String> {
    match format {
        OutputFormat::Text => Ok(reports.iter().map(|r| r.to_string()).collect()),
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .map(|json| format!("{}\n", json))
            .map_err(|e| PluginError::Generic {
                message: format!("failed to serialise reports: {}", e),
            }),
    }
}
