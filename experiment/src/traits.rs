//! Trait definitions with mockall annotations for testing
//!
//! Each trait is one seam to the outside world: the daemon CLI, the daemon
//! process itself, the latency probe binaries, and the local file system.
//! The core components are generic over these traits so unit tests can
//! inject mocks or a stateful fake daemon.

use shared::ContentHash;

use crate::command::DaemonCommand;
use crate::error::ExperimentResult;
use crate::report::Report;

/// Request/response access to the daemon's command surface
#[mockall::automock]
#[async_trait::async_trait]
pub trait DaemonCli: Send + Sync {
    /// Run a sub-command to completion and return its stdout
    ///
    /// # Returns
    /// `CommandFailed` (transient) on a non-zero exit, `CommandSpawn`
    /// (fatal) when the binary cannot be invoked at all.
    async fn run(&self, command: &DaemonCommand) -> ExperimentResult<String>;
}

/// Lifecycle capabilities of the single external daemon process
#[mockall::automock]
#[async_trait::async_trait]
pub trait DaemonProcess: Send + Sync {
    /// Spawn the daemon in the background without waiting for it
    async fn start(&self) -> ExperimentResult<()>;

    /// Send a termination signal to the given process
    async fn stop(&self, pid: u32) -> ExperimentResult<()>;

    /// Query the process table for the daemon
    ///
    /// # Returns
    /// The daemon's pid, or `None` when no daemon process exists
    async fn running_pid(&self) -> ExperimentResult<Option<u32>>;

    /// Issue the lightweight status query; any failure means "not yet"
    async fn is_available(&self) -> bool;
}

/// External latency measurement binaries
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Run a fixed-count ICMP ping and return its raw output
    async fn ping(&self, host: &str, count: u32) -> ExperimentResult<String>;

    /// Fetch `url`, discard the body, and return the timing breakdown text
    async fn http_timing(&self, url: &str) -> ExperimentResult<String>;
}

/// File system abstraction for fetched artifacts and the final report
#[mockall::automock]
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Remove the local copy of a fetched artifact; absent is not an error
    async fn remove_fetched(&self, hash: &ContentHash) -> ExperimentResult<()>;

    /// Serialize the report to its configured destination
    async fn write_report(&self, report: &Report) -> ExperimentResult<()>;
}
