//! Real daemon CLI service implementation
//!
//! Invokes the daemon binary as a child process for every sub-command. The
//! repository location is passed to each child through `IPFS_PATH`; the
//! experiment's own environment is never modified.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::DaemonCommand;
use crate::error::{ExperimentError, ExperimentResult};
use crate::traits::DaemonCli;
use shared::{component_debug, Component};

/// Real daemon CLI implementation
#[derive(Debug, Clone)]
pub struct RealDaemonCli {
    /// Path to the daemon binary
    binary: PathBuf,

    /// Daemon repository (exported as `IPFS_PATH`)
    repo_path: PathBuf,

    /// Directory `get` writes fetched content into
    work_dir: PathBuf,
}

impl RealDaemonCli {
    pub fn new(binary: PathBuf, repo_path: PathBuf) -> Self {
        Self {
            binary,
            repo_path,
            work_dir: PathBuf::from("."),
        }
    }

    /// Configure working directory for fetches (fluent API)
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    /// Build a child process for `command` without running it
    pub fn command(&self, command: &DaemonCommand) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(command.args())
            .env("IPFS_PATH", &self.repo_path)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null());
        cmd
    }

    fn program(&self) -> String {
        self.binary.display().to_string()
    }
}

#[async_trait]
impl DaemonCli for RealDaemonCli {
    async fn run(&self, command: &DaemonCommand) -> ExperimentResult<String> {
        component_debug!(Component::Process, "Running `{} {}`", self.program(), command);

        let output = self
            .command(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExperimentError::CommandSpawn {
                program: self.program(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExperimentError::CommandFailed {
                command: format!("{} {}", self.program(), command),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
