//! Service implementations
//!
//! This module contains real implementations of all service traits.
//! These are the production implementations that handle actual I/O operations.

pub mod daemon_cli;
pub mod daemon_process;
pub mod file_system;
pub mod probe_runner;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use daemon_cli::RealDaemonCli;
pub use daemon_process::RealDaemonProcess;
pub use file_system::RealFileSystem;
pub use probe_runner::RealProbeRunner;
