//! Experiment error types
//!
//! Errors fall into two classes. Transient errors (a status query failing
//! while the daemon warms up, one probe attempt failing, a peer refusing a
//! connection) are logged and swallowed where they occur so the surrounding
//! loop can continue. Everything else is fatal and ends the run.

use std::time::Duration;
use thiserror::Error;

use shared::SharedError;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Failed to invoke {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from `{command}`: {output:?}")]
    ProbeParse { command: String, output: String },

    #[error("Daemon did not become available within {waited:?}")]
    DaemonStartTimeout { waited: Duration },

    #[error("Daemon process {pid} did not stop within {waited:?}")]
    DaemonStopTimeout { pid: u32, waited: Duration },

    #[error("Failed to signal process {pid}: {message}")]
    Signal { pid: u32, message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ExperimentError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    pub fn parse(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ProbeParse {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Whether the surrounding retry loop should log and carry on
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CommandFailed { .. } | Self::ProbeParse { .. })
    }
}

pub type ExperimentResult<T> = Result<T, ExperimentError>;
