//! Daemon lifecycle state machine
//!
//! `Stopped → Starting → Running → Available`, and back to `Stopped` only
//! through an explicit termination. A daemon that disappears before it
//! answers is relaunched (`Running → Starting`). Polling loops are unbounded
//! unless a start/stop bound is configured.

use std::time::Duration;
use tokio::time::{sleep, Instant};

use shared::{component_debug, component_info, component_warn, Component, ProcessState};

use crate::error::{ExperimentError, ExperimentResult};
use crate::traits::DaemonProcess;

/// Polling behaviour of the lifecycle loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub poll_interval: Duration,
    pub start_timeout: Option<Duration>,
    pub stop_timeout: Option<Duration>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            start_timeout: None,
            stop_timeout: None,
        }
    }
}

/// Owns the daemon's [`ProcessState`]; nothing else mutates it
pub struct ProcessController<P: DaemonProcess> {
    process: P,
    config: LifecycleConfig,
    state: ProcessState,
    transitions: Vec<ProcessState>,
}

impl<P: DaemonProcess> ProcessController<P> {
    pub fn new(process: P, config: LifecycleConfig) -> Self {
        Self {
            process,
            config,
            state: ProcessState::Stopped,
            transitions: vec![ProcessState::Stopped],
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Every state entered so far, starting with the initial `Stopped`
    pub fn transitions(&self) -> &[ProcessState] {
        &self.transitions
    }

    /// Pid of the daemon, if one is in the process table
    pub async fn is_running(&self) -> ExperimentResult<Option<u32>> {
        self.process.running_pid().await
    }

    pub async fn is_available(&self) -> bool {
        self.process.is_available().await
    }

    /// Bring the daemon to `Available`, blocking until it answers
    pub async fn ensure_running(&mut self) -> ExperimentResult<()> {
        if self.process.is_available().await {
            if self.state != ProcessState::Available {
                component_debug!(Component::Process, "Adopting already available daemon");
                self.set_state(ProcessState::Available);
            }
            return Ok(());
        }

        let pid = self.probe_pid().await?;
        match (self.state, pid) {
            (ProcessState::Starting | ProcessState::Running, _) => {
                component_debug!(Component::Process, "Daemon is {}, waiting for it", self.state);
            }
            (_, Some(pid)) => {
                component_warn!(
                    Component::Process,
                    "Daemon {} exists but is not serving while {}, restarting it",
                    pid,
                    self.state
                );
                self.terminate().await?;
                self.spawn().await?;
            }
            (_, None) => self.spawn().await?,
        }

        self.wait_until_available().await
    }

    /// Kill the daemon and wait until it leaves the process table
    ///
    /// Safe to call when nothing is running.
    pub async fn shutdown(&mut self) -> ExperimentResult<()> {
        self.terminate().await
    }

    async fn spawn(&mut self) -> ExperimentResult<()> {
        component_info!(Component::Process, "Launching daemon...");
        self.process.start().await?;
        if self.state != ProcessState::Starting {
            self.set_state(ProcessState::Starting);
        }
        Ok(())
    }

    /// Poll until the daemon answers, relaunching it whenever it is absent
    ///
    /// A freshly launched daemon gets one poll interval to show up in the
    /// process table; a daemon that vanishes while warming up is relaunched
    /// on the next poll.
    async fn wait_until_available(&mut self) -> ExperimentResult<()> {
        let started = Instant::now();
        let mut missed_polls = 0u32;
        loop {
            match self.state {
                ProcessState::Available => return Ok(()),
                ProcessState::Stopped => self.spawn().await?,
                ProcessState::Starting => match self.probe_pid().await? {
                    Some(pid) => {
                        component_debug!(Component::Process, "Daemon process {} is up", pid);
                        self.set_state(ProcessState::Running);
                        missed_polls = 0;
                        continue;
                    }
                    None if missed_polls > 0 => {
                        component_warn!(Component::Process, "Daemon did not appear after launch, relaunching");
                        missed_polls = 0;
                        self.spawn().await?;
                    }
                    None => missed_polls += 1,
                },
                ProcessState::Running => {
                    if self.process.is_available().await {
                        self.set_state(ProcessState::Available);
                        component_info!(Component::Process, "Daemon available after {:?}", started.elapsed());
                        return Ok(());
                    }
                    if self.probe_pid().await?.is_none() {
                        component_warn!(Component::Process, "Daemon exited while warming up, relaunching");
                        self.spawn().await?;
                    }
                }
            }

            if let Some(limit) = self.config.start_timeout {
                if started.elapsed() >= limit {
                    return Err(ExperimentError::DaemonStartTimeout {
                        waited: started.elapsed(),
                    });
                }
            }

            component_info!(Component::Process, "Waiting for daemon... [may take a min, do not quit]");
            sleep(self.config.poll_interval).await;
        }
    }

    async fn terminate(&mut self) -> ExperimentResult<()> {
        let started = Instant::now();
        while let Some(pid) = self.probe_pid().await? {
            component_info!(Component::Process, "Killing daemon {}...", pid);
            self.process.stop(pid).await?;

            if let Some(limit) = self.config.stop_timeout {
                if started.elapsed() >= limit {
                    return Err(ExperimentError::DaemonStopTimeout {
                        pid,
                        waited: started.elapsed(),
                    });
                }
            }
            sleep(self.config.poll_interval).await;
        }

        if self.state != ProcessState::Stopped {
            self.set_state(ProcessState::Stopped);
        }
        Ok(())
    }

    /// Process-table query where a failed query counts as absent
    async fn probe_pid(&self) -> ExperimentResult<Option<u32>> {
        match self.process.running_pid().await {
            Ok(pid) => Ok(pid),
            Err(e) if e.is_transient() => {
                component_warn!(Component::Process, "Process table query failed: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn set_state(&mut self, next: ProcessState) {
        component_debug!(Component::Process, "Daemon state {} -> {}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }
}
