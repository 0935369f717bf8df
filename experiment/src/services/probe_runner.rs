//! Real probe runner using the system `ping` and `curl` binaries

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{ExperimentError, ExperimentResult};
use crate::traits::ProbeRunner;

/// curl `-w` template producing the seven timing fields as JSON
pub const CURL_TIMING_FORMAT: &str = "{\n\"time_namelookup\":  %{time_namelookup},\n\"time_connect\":  %{time_connect},\n\"time_appconnect\":  %{time_appconnect},\n\"time_pretransfer\":  %{time_pretransfer},\n\"time_redirect\":  %{time_redirect},\n\"time_starttransfer\":  %{time_starttransfer},\n\"total\": %{time_total}\n}\n";

/// Real probe runner implementation
#[derive(Debug, Clone, Default)]
pub struct RealProbeRunner;

impl RealProbeRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a probe to completion; a non-zero exit is a `CommandFailed`
    pub(crate) async fn output(mut cmd: Command, description: String) -> ExperimentResult<String> {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExperimentError::CommandSpawn { program, source })?;

        if !output.status.success() {
            return Err(ExperimentError::CommandFailed {
                command: description,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ProbeRunner for RealProbeRunner {
    async fn ping(&self, host: &str, count: u32) -> ExperimentResult<String> {
        let mut cmd = Command::new("ping");
        cmd.arg("-c").arg(count.to_string()).arg(host);
        Self::output(cmd, format!("ping -c {count} {host}")).await
    }

    async fn http_timing(&self, url: &str) -> ExperimentResult<String> {
        let mut cmd = Command::new("curl");
        cmd.arg("-s")
            .arg("-o")
            .arg("/dev/null")
            .arg("-w")
            .arg(CURL_TIMING_FORMAT)
            .arg(url);
        Self::output(cmd, format!("curl {url}")).await
    }
}
