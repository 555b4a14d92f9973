//! External command execution for installation steps (clone, checkout,
//! build). Kept behind a trait so installer logic runs against a fake in
//! tests.

use crate::plugin::error::{PluginError, PluginResult};
use std::path::Path;

/// Outcome of a finished command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Short failure description: exit code plus the last stderr line.
    pub fn failure_summary(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        match self.stderr.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(last) => format!("{}: {}", status, last.trim()),
            None => status,
        }
    }
}

/// Runs a program to completion. No timeout is applied.
///
/// Returns `Err` only when the program could not be started; a non-zero
/// exit is reported through [`CommandOutput::success`].
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> PluginResult<CommandOutput>;
}

/// Spawns real processes via `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait::async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> PluginResult<CommandOutput> {
        let mut command = tokio::process::Command::new(program);
        command.args(args);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        log::debug!("Running {} {}", program, args.join(" "));
        let output = command.output().await.map_err(|e| PluginError::CommandFailed {
            step: format!("start {}", program),
            cause: e.to_string(),
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
