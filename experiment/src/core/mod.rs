//! Measurement engine
//!
//! Daemon lifecycle, peer connections, probes, sampling and aggregation.
//! Everything here talks to the outside world only through [`crate::traits`].

pub mod aggregator;
pub mod connection;
pub mod latency;
pub mod process_controller;
pub mod sampling;

pub use connection::ConnectionManager;
pub use latency::{LatencyProbe, ProbeConfig};
pub use process_controller::{LifecycleConfig, ProcessController};
pub use sampling::SamplingEngine;
