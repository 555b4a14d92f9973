//! Plugin Installer
//!
//! Stages plugin libraries into the plugins directory from a source
//! repository (clone, build, copy), a direct URL (download) or a local file
//! (copy), and materialises staged libraries as plugin instances.
//!
//! No step is retried and none has a timeout. Integrity of downloaded or
//! built artifacts is not verified.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::loader::{has_plugin_extension, NativeLoader, PluginLoader, PLUGIN_EXTENSIONS};
use crate::plugin::process::{CommandRunner, SystemCommandRunner};
use crate::plugin::traits::Plugin;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Source hosting origin repository identifiers resolve against
pub const DEFAULT_REPOSITORY_ORIGIN: &str = "https://github.com";

/// `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    /// Parse `owner/name`; exactly one separator and two non-empty parts.
    pub fn parse(identifier: &str) -> PluginResult<Self> {
        let invalid = || {
            PluginError::invalid(format!(
                "invalid repository identifier '{}', expected 'owner/name'",
                identifier
            ))
        };

        let (owner, name) = identifier.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn clone_url(&self, origin: &str) -> String {
        format!("{}/{}/{}.git", origin.trim_end_matches('/'), self.owner, self.name)
    }

    /// File name of the library `cargo build --lib` produces for this repository
    pub fn build_artifact_name(&self) -> String {
        format!(
            "{}{}{}",
            std::env::consts::DLL_PREFIX,
            self.name.replace('-', "_"),
            std::env::consts::DLL_SUFFIX
        )
    }

    /// File name the artifact is staged under
    pub fn staged_artifact_name(&self) -> String {
        format!("{}{}", self.name, std::env::consts::DLL_SUFFIX)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn extension_error() -> PluginError {
    PluginError::invalid(format!(
        "plugin file must have one of these extensions: {}",
        PLUGIN_EXTENSIONS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

/// Fetches, builds and stages plugin libraries, and loads staged ones
pub struct PluginInstaller {
    plugins_dir: PathBuf,
    origin: String,
    runner: Box<dyn CommandRunner>,
    loader: Box<dyn PluginLoader>,
    client: reqwest::Client,
}

impl fmt::Debug for PluginInstaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstaller")
            .field("plugins_dir", &self.plugins_dir)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl PluginInstaller {
    /// Create an installer, creating `plugins_dir` if needed.
    pub fn new(plugins_dir: impl Into<PathBuf>) -> PluginResult<Self> {
        let plugins_dir = plugins_dir.into();
        std::fs::create_dir_all(&plugins_dir)
            .map_err(|e| PluginError::io("create plugins directory", plugins_dir.display(), e))?;

        Ok(Self {
            plugins_dir,
            origin: DEFAULT_REPOSITORY_ORIGIN.to_string(),
            runner: Box::new(SystemCommandRunner),
            loader: Box::new(NativeLoader::new()),
            client: reqwest::Client::new(),
        })
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn PluginLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    async fn run_step(&self, step: &str, program: &str, args: &[String], dir: &Path) -> PluginResult<()> {
        let output = self
            .runner
            .run(program, args, Some(dir))
            .await
            .map_err(|e| PluginError::CommandFailed {
                step: step.to_string(),
                cause: e.to_string(),
            })?;

        if !output.success {
            return Err(PluginError::CommandFailed {
                step: step.to_string(),
                cause: output.failure_summary(),
            });
        }
        Ok(())
    }

    /// Clone `identifier` (`owner/name`), optionally check out `revision`,
    /// build it as a dynamic library and stage the artifact.
    ///
    /// The working clone is removed on every exit path.
    pub async fn install_from_repository(
        &self,
        identifier: &str,
        revision: Option<&str>,
    ) -> PluginResult<PathBuf> {
        let repo = RepositoryId::parse(identifier)?;

        let workspace = tempfile::Builder::new()
            .prefix("daiv-plugin-")
            .tempdir()
            .map_err(|e| PluginError::io("create temporary directory", std::env::temp_dir().display(), e))?;
        let checkout = workspace.path().join(&repo.name);

        log::info!("Cloning {} from {}", repo, self.origin);
        self.run_step(
            "clone repository",
            "git",
            &[
                "clone".to_string(),
                repo.clone_url(&self.origin),
                checkout.display().to_string(),
            ],
            workspace.path(),
        )
        .await?;

        if let Some(revision) = revision.filter(|r| !r.is_empty()) {
            self.run_step(
                &format!("checkout revision {}", revision),
                "git",
                &["checkout".to_string(), revision.to_string()],
                &checkout,
            )
            .await?;
        }

        log::info!("Building {}", repo);
        self.run_step(
            "build plugin",
            "cargo",
            &["build".to_string(), "--release".to_string(), "--lib".to_string()],
            &checkout,
        )
        .await?;

        let artifact = checkout
            .join("target")
            .join("release")
            .join(repo.build_artifact_name());
        let destination = self.plugins_dir.join(repo.staged_artifact_name());

        tokio::fs::copy(&artifact, &destination)
            .await
            .map_err(|e| PluginError::io("stage built plugin", artifact.display(), e))?;

        log::info!("Plugin installed to: {}", destination.display());
        Ok(destination)
    }

    /// Download a plugin library and stage it under its URL file name.
    ///
    /// The extension is checked before any request is made. A transfer that
    /// fails midway leaves the partially written file in place.
    pub async fn install_from_url(&self, url: &str) -> PluginResult<PathBuf> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| PluginError::invalid(format!("invalid plugin URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PluginError::invalid(format!(
                "unsupported URL scheme '{}', expected http or https",
                parsed.scheme()
            )));
        }

        let filename = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PluginError::invalid(format!("URL '{}' does not name a file", url)))?;
        if !has_plugin_extension(Path::new(&filename)) {
            return Err(extension_error());
        }

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| PluginError::io("download plugin", url, e))?;

        if !response.status().is_success() {
            return Err(PluginError::io(
                "download plugin",
                url,
                format!("HTTP status {}", response.status().as_u16()),
            ));
        }

        let destination = self.plugins_dir.join(&filename);
        let mut file = tokio::fs::File::create(&destination)
            .await
            .map_err(|e| PluginError::io("create destination file", destination.display(), e))?;

        // TODO: remove the partial file when the transfer fails midway
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PluginError::io("save plugin file", destination.display(), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| PluginError::io("save plugin file", destination.display(), e))?;
        }
        file.flush()
            .await
            .map_err(|e| PluginError::io("save plugin file", destination.display(), e))?;

        log::info!("Plugin installed to: {}", destination.display());
        Ok(destination)
    }

    /// Copy a local plugin library into the plugins directory.
    pub async fn install_from_local_file(&self, path: &Path) -> PluginResult<PathBuf> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| PluginError::io("access plugin file", path.display(), e))?;

        if metadata.is_dir() {
            return Err(PluginError::invalid(format!(
                "expected a file, got a directory: {}",
                path.display()
            )));
        }
        if !has_plugin_extension(path) {
            return Err(extension_error());
        }

        let filename = path
            .file_name()
            .ok_or_else(|| PluginError::invalid(format!("'{}' has no file name", path.display())))?;
        let destination = self.plugins_dir.join(filename);

        tokio::fs::copy(path, &destination)
            .await
            .map_err(|e| PluginError::io("copy plugin file", path.display(), e))?;

        log::info!("Plugin installed to: {}", destination.display());
        Ok(destination)
    }

    /// Staged plugin libraries, sorted by path.
    pub fn list_installed(&self) -> PluginResult<Vec<PathBuf>> {
        if !self.plugins_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.plugins_dir)
            .map_err(|e| PluginError::io("read plugins directory", self.plugins_dir.display(), e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| has_plugin_extension(path))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Load every staged plugin library.
    ///
    /// A library that fails to open, lacks an entry point or fails admission
    /// is logged and skipped. A missing plugins directory yields no plugins.
    pub fn load_plugins(&self) -> PluginResult<Vec<Box<dyn Plugin>>> {
        let mut plugins = Vec::new();

        for path in self.list_installed()? {
            match self.loader.load(&path) {
                Ok(plugin) => {
                    log::debug!("Loaded plugin '{}' from {}", plugin.name(), path.display());
                    plugins.push(plugin);
                }
                Err(e) => log::warn!("Skipping plugin file {}: {}", path.display(), e),
            }
        }

        Ok(plugins)
    }
}
