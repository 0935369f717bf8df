//! Swarm latency experiment library
//!
//! Measures ping round-trip times, HTTP timing breakdowns and cold content
//! fetches through an external content-addressed daemon, against a fixed set
//! of remote peers. The daemon and probe binaries sit behind the traits in
//! [`traits`], so the measurement engine in [`core`] can be exercised with
//! test doubles.

pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use command::DaemonCommand;
pub use config::ExperimentConfig;
pub use core::{ConnectionManager, LatencyProbe, ProcessController, SamplingEngine};
pub use error::{ExperimentError, ExperimentResult};
pub use orchestrator::Orchestrator;
pub use plan::ExperimentPlan;
pub use report::Report;
pub use traits::{DaemonCli, DaemonProcess, FileSystem, ProbeRunner};
