//! Cold-fetch latency sampling through the daemon
//!
//! Each attempt re-asserts the target topology, evicts the artifact from
//! every local cache, times a fetch by content hash and keeps the timing only
//! if all targets are still connected afterwards. At most `2 * samples`
//! attempts are made.

use std::sync::Arc;
use tokio::time::Instant;

use shared::{component_debug, component_info, component_warn, Component, RemoteFile, RemoteNode, SampleSet};

use crate::command::DaemonCommand;
use crate::core::connection::ConnectionManager;
use crate::error::ExperimentResult;
use crate::traits::{DaemonCli, FileSystem};

pub struct SamplingEngine<C: DaemonCli, F: FileSystem> {
    cli: Arc<C>,
    connections: ConnectionManager<C>,
    files: Arc<F>,
}

impl<C: DaemonCli, F: FileSystem> SamplingEngine<C, F> {
    pub fn new(cli: Arc<C>, files: Arc<F>) -> Self {
        Self {
            connections: ConnectionManager::new(Arc::clone(&cli)),
            cli,
            files,
        }
    }

    /// Collect up to `samples` valid fetch timings for `file` via `targets`
    pub async fn collect(
        &self,
        file: &RemoteFile,
        targets: &[RemoteNode],
        samples: u32,
    ) -> ExperimentResult<SampleSet> {
        component_info!(Component::Sampling, "Collecting swarm stats for {}...", file.hash());
        let max_tries = samples.saturating_mul(2);
        let mut tries = 0u32;
        let mut collected = Vec::with_capacity(samples as usize);

        while (collected.len() as u32) < samples && tries < max_tries {
            tries += 1;
            component_info!(
                Component::Sampling,
                "Attempt {} out of (min: {}, max: {})",
                tries,
                samples,
                max_tries
            );

            if let Some(elapsed) = self.attempt(file, targets).await? {
                collected.push(elapsed);
            }
        }

        let set = SampleSet::new(tries, collected);
        if !set.is_complete(samples as usize) {
            component_warn!(
                Component::Sampling,
                "Only {} of {} samples were valid after {} attempts",
                set.samples.len(),
                samples,
                tries
            );
        }
        Ok(set)
    }

    /// One attempt; `None` when the timing must be discarded
    async fn attempt(&self, file: &RemoteFile, targets: &[RemoteNode]) -> ExperimentResult<Option<f64>> {
        for node in targets {
            self.connections.ensure_connected(node).await?;
        }

        self.evict(file).await?;

        let started = Instant::now();
        let fetched = self.cli.run(&DaemonCommand::Get(file.hash().clone())).await;
        let elapsed = started.elapsed().as_secs_f64();

        let outcome = match fetched {
            Ok(_) => {
                if self.all_connected(targets).await? {
                    component_debug!(Component::Sampling, "Fetched {} in {:.3}s", file.hash(), elapsed);
                    Some(elapsed)
                } else {
                    component_warn!(
                        Component::Sampling,
                        "A target disconnected during the fetch, discarding {:.3}s",
                        elapsed
                    );
                    None
                }
            }
            Err(e) if e.is_transient() => {
                component_warn!(Component::Sampling, "Fetch of {} failed: {}", file.hash(), e);
                None
            }
            Err(e) => return Err(e),
        };

        self.files.remove_fetched(file.hash()).await?;
        Ok(outcome)
    }

    async fn evict(&self, file: &RemoteFile) -> ExperimentResult<()> {
        match self.cli.run(&DaemonCommand::RepoGc).await {
            Ok(_) => {}
            Err(e) if e.is_transient() => {
                component_warn!(Component::Sampling, "Garbage collection failed: {}", e);
            }
            Err(e) => return Err(e),
        }
        self.files.remove_fetched(file.hash()).await
    }

    async fn all_connected(&self, targets: &[RemoteNode]) -> ExperimentResult<bool> {
        for node in targets {
            if !self.connections.is_connected(node).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
