//! Runtime configuration
//!
//! Everything the services need is carried explicitly in
//! [`ExperimentConfig`]; nothing is read from or written to the process
//! environment after start-up.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::{LifecycleConfig, ProbeConfig};
use crate::error::{ExperimentError, ExperimentResult};

/// Default location of the daemon binary
pub const DEFAULT_BINARY: &str = "go-ipfs/ipfs";

/// Default daemon repository
pub const DEFAULT_REPO: &str = "go-ipfs/.ipfs";

#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub ipfs_binary: PathBuf,
    pub repo_path: PathBuf,

    /// Where `get` writes fetched artifacts
    pub work_dir: PathBuf,

    pub output: PathBuf,
    pub lifecycle: LifecycleConfig,
    pub probe: ProbeConfig,

    /// How often host mode re-checks the daemon
    pub host_check_interval: Duration,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            ipfs_binary: PathBuf::from(DEFAULT_BINARY),
            repo_path: PathBuf::from(DEFAULT_REPO),
            work_dir: PathBuf::from("."),
            output: PathBuf::from("out.json"),
            lifecycle: LifecycleConfig::default(),
            probe: ProbeConfig::default(),
            host_check_interval: Duration::from_secs(60),
        }
    }
}

impl ExperimentConfig {
    /// Defaults overridden by `IPFS_BINARY` / `IPFS_PATH` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(binary) = env::var("IPFS_BINARY") {
            config.ipfs_binary = PathBuf::from(binary);
        }
        if let Ok(repo) = env::var("IPFS_PATH") {
            config.repo_path = PathBuf::from(repo);
        }
        config
    }

    /// Configure daemon binary (fluent API)
    pub fn with_binary(mut self, binary: Option<PathBuf>) -> Self {
        if let Some(binary) = binary {
            self.ipfs_binary = binary;
        }
        self
    }

    /// Configure daemon repository (fluent API)
    pub fn with_repo_path(mut self, repo_path: Option<PathBuf>) -> Self {
        if let Some(repo_path) = repo_path {
            self.repo_path = repo_path;
        }
        self
    }

    /// Configure report destination (fluent API)
    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }

    /// Configure polling bounds in seconds; `None` keeps the loop unbounded (fluent API)
    pub fn with_timeouts(mut self, start_secs: Option<u64>, stop_secs: Option<u64>) -> Self {
        self.lifecycle.start_timeout = start_secs.map(Duration::from_secs);
        self.lifecycle.stop_timeout = stop_secs.map(Duration::from_secs);
        self
    }

    /// Configure probe pacing (fluent API)
    pub fn with_probe(mut self, ping_count: u32, max_jitter: Duration) -> Self {
        self.probe = ProbeConfig { ping_count, max_jitter };
        self
    }

    pub fn validate(&self) -> ExperimentResult<()> {
        if self.probe.ping_count == 0 {
            return Err(ExperimentError::config("ping count must be at least 1"));
        }
        if self.lifecycle.poll_interval.is_zero() {
            return Err(ExperimentError::config("poll interval must be positive"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ExperimentError::config("output path is empty"));
        }
        Ok(())
    }
}
