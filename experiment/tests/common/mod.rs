//! Common test utilities and infrastructure
//!
//! This module provides shared test utilities, fixtures, and helpers
//! used across all experiment test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{FakeDaemon, FakeProbes, FetchOutcome};
