//! Real file system service implementation
//!
//! Removes fetched artifacts from the fetch working directory and writes the
//! final report as pretty, key-sorted JSON.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

use crate::error::ExperimentResult;
use crate::report::Report;
use crate::traits::FileSystem;
use shared::{component_debug, ContentHash, Component};

/// Real file system implementation
pub struct RealFileSystem {
    /// Directory the daemon's `get` writes into
    work_dir: PathBuf,

    /// Destination of the report
    report_path: PathBuf,
}

impl RealFileSystem {
    pub fn new(work_dir: PathBuf, report_path: PathBuf) -> Self {
        Self { work_dir, report_path }
    }

    /// Local path a fetch of `hash` lands at
    pub fn fetched_path(&self, hash: &ContentHash) -> PathBuf {
        self.work_dir.join(hash.as_str())
    }
}

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn remove_fetched(&self, hash: &ContentHash) -> ExperimentResult<()> {
        let path = self.fetched_path(hash);
        let metadata = match fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        // `get` of a directory hash produces a directory
        if metadata.is_dir() {
            fs::remove_dir_all(&path).await?;
        } else {
            fs::remove_file(&path).await?;
        }
        component_debug!(Component::Sampling, "Removed local copy {}", path.display());
        Ok(())
    }

    async fn write_report(&self, report: &Report) -> ExperimentResult<()> {
        if let Some(parent) = self.report_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Going through Value sorts every object's keys
        let value = serde_json::to_value(report)?;
        let mut json = serde_json::to_string_pretty(&value)?;
        json.push('\n');
        fs::write(&self.report_path, json).await?;

        component_debug!(Component::Orchestrator, "Report written to {}", self.report_path.display());
        Ok(())
    }
}
