//! Real daemon process service implementation
//!
//! Spawns the daemon in the background, finds it in the process table with
//! `pgrep`, and kills it with `SIGKILL`.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::command::DaemonCommand;
use crate::error::{ExperimentError, ExperimentResult};
use crate::services::daemon_cli::RealDaemonCli;
use crate::traits::{DaemonCli, DaemonProcess};
use shared::{component_debug, Component};

/// Real daemon process implementation
pub struct RealDaemonProcess {
    cli: RealDaemonCli,

    /// Name matched exactly against the process table
    process_name: String,

    /// Daemon spawned by this process, kept so it can be reaped
    child: Mutex<Option<Child>>,
}

impl RealDaemonProcess {
    pub fn new(cli: RealDaemonCli) -> Self {
        let process_name = process_table_name(cli.binary());

        Self {
            cli,
            process_name,
            child: Mutex::new(None),
        }
    }

    /// Collect our child's exit status so it does not linger as a zombie
    async fn reap(&self) {
        let mut child = self.child.lock().await;
        if let Some(handle) = child.as_mut() {
            if let Ok(Some(status)) = handle.try_wait() {
                component_debug!(Component::Process, "Daemon exited with {}", status);
                *child = None;
            }
        }
    }
}

#[async_trait]
impl DaemonProcess for RealDaemonProcess {
    async fn start(&self) -> ExperimentResult<()> {
        self.reap().await;

        let handle = self
            .cli
            .command(&DaemonCommand::Daemon)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExperimentError::CommandSpawn {
                program: self.cli.binary().display().to_string(),
                source,
            })?;

        component_debug!(Component::Process, "Spawned daemon (PID: {:?})", handle.id());
        *self.child.lock().await = Some(handle);
        Ok(())
    }

    async fn stop(&self, pid: u32) -> ExperimentResult<()> {
        send_kill(pid)?;
        self.reap().await;
        Ok(())
    }

    async fn running_pid(&self) -> ExperimentResult<Option<u32>> {
        self.reap().await;

        let output = Command::new("pgrep")
            .arg("-x")
            .arg(&self.process_name)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExperimentError::CommandSpawn {
                program: "pgrep".to_string(),
                source,
            })?;

        // pgrep exits 1 when nothing matched
        match output.status.code() {
            Some(0) => Ok(parse_first_pid(&String::from_utf8_lossy(&output.stdout))),
            Some(1) => Ok(None),
            _ => Err(ExperimentError::CommandFailed {
                command: format!("pgrep -x {}", self.process_name),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    async fn is_available(&self) -> bool {
        self.cli.run(&DaemonCommand::StatsBitswap).await.is_ok()
    }
}

/// Linux keeps only this many bytes of a process name (`TASK_COMM_LEN - 1`)
#[cfg(target_os = "linux")]
const COMM_LEN: usize = 15;

/// Name the daemon binary shows up under in the process table
///
/// `pgrep -x` compares against the kernel's copy of the name, which Linux
/// truncates, so longer binary names are cut the same way.
pub fn process_table_name(binary: &Path) -> String {
    let name = binary
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ipfs".to_string());

    #[cfg(target_os = "linux")]
    {
        let mut end = name.len().min(COMM_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name[..end].to_string()
    }
    #[cfg(not(target_os = "linux"))]
    {
        name
    }
}

/// First pid in `pgrep` output
pub fn parse_first_pid(output: &str) -> Option<u32> {
    output.lines().find_map(|line| line.trim().parse().ok())
}

#[cfg(unix)]
fn send_kill(pid: u32) -> ExperimentResult<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| ExperimentError::Signal {
        pid,
        message: "pid out of range".to_string(),
    })?;

    match kill(Pid::from_raw(raw), Signal::SIGKILL) {
        // Already gone
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ExperimentError::Signal {
            pid,
            message: errno.desc().to_string(),
        }),
    }
}

#[cfg(not(unix))]
fn send_kill(pid: u32) -> ExperimentResult<()> {
    Err(ExperimentError::Signal {
        pid,
        message: "signals are only supported on unix".to_string(),
    })
}
