//! Shared types for the swarm latency experiment
//!
//! Holds the data model that flows between the experiment components:
//! validated peer and content identifiers, daemon lifecycle state, and the
//! measurement records written to the report.

pub mod errors;
pub mod logging;
pub mod measurements;
pub mod types;

pub use errors::*;
pub use logging::Component;
pub use measurements::*;
pub use types::*;
