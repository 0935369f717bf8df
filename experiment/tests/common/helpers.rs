//! Test helpers: a stateful in-memory daemon and canned probes
//!
//! `FakeDaemon` implements every daemon-facing trait over one shared state,
//! so connection changes made through the CLI are visible to the process
//! and file system roles, and every issued command is recorded.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use experiment::{
    DaemonCli, DaemonCommand, DaemonProcess, ExperimentError, ExperimentResult, FileSystem, ProbeRunner, Report,
};
use shared::ContentHash;

/// What happens during one `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetch succeeds, connections untouched
    Ok,
    /// Fetch succeeds but every peer connection drops meanwhile
    DropPeers,
    /// Fetch exits non-zero
    Fail,
}

#[derive(Debug)]
pub struct FakeState {
    pub pid: u32,
    pub running: bool,
    /// A process that never becomes available until restarted
    pub stale: bool,
    /// Availability checks that fail after each start
    pub warmup_checks: u32,
    pub checks_since_start: u32,
    pub starts: u32,
    pub stops: u32,
    /// Launches that exit before reaching the process table
    pub failed_launches: u32,

    /// Addresses of connected peers
    pub connected: BTreeSet<String>,
    /// Addresses that refuse connections
    pub unreachable: BTreeSet<String>,
    pub fetches: VecDeque<FetchOutcome>,

    pub commands: Vec<DaemonCommand>,
    pub removed: Vec<ContentHash>,
    pub reports: Vec<Report>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            pid: 4000,
            running: false,
            stale: false,
            warmup_checks: 0,
            checks_since_start: 0,
            starts: 0,
            stops: 0,
            failed_launches: 0,
            connected: BTreeSet::new(),
            unreachable: BTreeSet::new(),
            fetches: VecDeque::new(),
            commands: Vec::new(),
            removed: Vec::new(),
            reports: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeDaemon {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Daemon that needs `checks` failed status queries before answering
    pub fn with_warmup(checks: u32) -> Self {
        let daemon = Self::new();
        daemon.state().warmup_checks = checks;
        daemon
    }

    /// Daemon process already present but wedged
    pub fn stale() -> Self {
        let daemon = Self::new();
        {
            let mut state = daemon.state();
            state.running = true;
            state.stale = true;
        }
        daemon
    }

    /// Daemon whose first `launches` starts die immediately
    pub fn failing_launches(launches: u32) -> Self {
        let daemon = Self::new();
        daemon.state().failed_launches = launches;
        daemon
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn script_fetches(&self, outcomes: &[FetchOutcome]) {
        self.state().fetches.extend(outcomes.iter().copied());
    }

    pub fn refuse(&self, address: &str) {
        self.state().unreachable.insert(address.to_string());
    }

    pub fn is_peer_connected(&self, address: &str) -> bool {
        self.state().connected.contains(address)
    }

    pub fn count(&self, predicate: impl Fn(&DaemonCommand) -> bool) -> usize {
        self.state().commands.iter().filter(|c| predicate(c)).count()
    }

    pub fn connects(&self) -> usize {
        self.count(|c| matches!(c, DaemonCommand::SwarmConnect(_)))
    }

    pub fn disconnects(&self) -> usize {
        self.count(|c| matches!(c, DaemonCommand::SwarmDisconnect(_)))
    }

    pub fn gets(&self) -> usize {
        self.count(|c| matches!(c, DaemonCommand::Get(_)))
    }

    fn failed(command: &DaemonCommand, stderr: &str) -> ExperimentError {
        ExperimentError::CommandFailed {
            command: format!("ipfs {command}"),
            status: "exit status: 1".to_string(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl DaemonCli for FakeDaemon {
    async fn run(&self, command: &DaemonCommand) -> ExperimentResult<String> {
        let mut state = self.state();
        state.commands.push(command.clone());

        match command {
            DaemonCommand::SwarmAddrs => Ok(state
                .connected
                .iter()
                .map(|address| format!("{address}\n"))
                .collect()),
            DaemonCommand::SwarmConnect(address) => {
                if state.unreachable.contains(address.as_str()) {
                    return Err(Self::failed(command, "failure: dial backoff"));
                }
                state.connected.insert(address.to_string());
                Ok(format!("connect {address} success\n"))
            }
            DaemonCommand::SwarmDisconnect(address) => {
                state.connected.remove(address.as_str());
                Ok(format!("disconnect {address} success\n"))
            }
            DaemonCommand::Get(hash) => match state.fetches.pop_front().unwrap_or(FetchOutcome::Ok) {
                FetchOutcome::Ok => Ok(format!("Saving file(s) to {hash}\n")),
                FetchOutcome::DropPeers => {
                    state.connected.clear();
                    Ok(format!("Saving file(s) to {hash}\n"))
                }
                FetchOutcome::Fail => Err(Self::failed(command, "context deadline exceeded")),
            },
            DaemonCommand::Id => Ok("{\n  \"ID\": \"QmLocalPeer\"\n}\n".to_string()),
            _ => Ok(String::new()),
        }
    }
}

#[async_trait]
impl DaemonProcess for FakeDaemon {
    async fn start(&self) -> ExperimentResult<()> {
        let mut state = self.state();
        state.starts += 1;
        if state.failed_launches > 0 {
            state.failed_launches -= 1;
            return Ok(());
        }
        state.running = true;
        state.stale = false;
        state.checks_since_start = 0;
        state.pid += 1;
        Ok(())
    }

    async fn stop(&self, pid: u32) -> ExperimentResult<()> {
        let mut state = self.state();
        assert_eq!(pid, state.pid, "signalled the wrong process");
        state.running = false;
        state.connected.clear();
        state.stops += 1;
        Ok(())
    }

    async fn running_pid(&self) -> ExperimentResult<Option<u32>> {
        let state = self.state();
        Ok(state.running.then_some(state.pid))
    }

    async fn is_available(&self) -> bool {
        let mut state = self.state();
        if !state.running || state.stale {
            return false;
        }
        state.checks_since_start += 1;
        state.checks_since_start > state.warmup_checks
    }
}

#[async_trait]
impl FileSystem for FakeDaemon {
    async fn remove_fetched(&self, hash: &ContentHash) -> ExperimentResult<()> {
        self.state().removed.push(hash.clone());
        Ok(())
    }

    async fn write_report(&self, report: &Report) -> ExperimentResult<()> {
        self.state().reports.push(report.clone());
        Ok(())
    }
}

pub const PING_OUTPUT: &str = "PING host (10.0.0.1) 56(84) bytes of data.\n\
    \n\
    --- host ping statistics ---\n\
    10 packets transmitted, 10 received, 0% packet loss, time 9012ms\n\
    rtt min/avg/max/mdev = 10.2/12.5/15.1/1.3 ms\n";

pub const CURL_OUTPUT: &str = "{\n\"time_namelookup\":  0.004,\n\"time_connect\":  0.020,\n\
    \"time_appconnect\":  0.060,\n\"time_pretransfer\":  0.060,\n\"time_redirect\":  0.000,\n\
    \"time_starttransfer\":  0.100,\n\"total\": 0.300\n}\n";

/// Probe runner with canned outputs and selectable failures
#[derive(Clone, Default)]
pub struct FakeProbes {
    pub unreachable_hosts: BTreeSet<String>,
    pub failing_urls: BTreeSet<String>,
}

impl FakeProbes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_host(mut self, host: &str) -> Self {
        self.unreachable_hosts.insert(host.to_string());
        self
    }

    pub fn without_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }
}

#[async_trait]
impl ProbeRunner for FakeProbes {
    async fn ping(&self, host: &str, count: u32) -> ExperimentResult<String> {
        if self.unreachable_hosts.contains(host) {
            return Err(ExperimentError::CommandFailed {
                command: format!("ping -c {count} {host}"),
                status: "exit status: 2".to_string(),
                stderr: "Name or service not known".to_string(),
            });
        }
        Ok(PING_OUTPUT.to_string())
    }

    async fn http_timing(&self, url: &str) -> ExperimentResult<String> {
        if self.failing_urls.contains(url) {
            return Err(ExperimentError::CommandFailed {
                command: format!("curl {url}"),
                status: "exit status: 6".to_string(),
                stderr: String::new(),
            });
        }
        Ok(CURL_OUTPUT.to_string())
    }
}
