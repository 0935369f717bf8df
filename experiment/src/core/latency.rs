//! Ping and HTTP timing probes
//!
//! Runs the external probe binaries and parses their textual summaries. A
//! probe that fails or prints something unexpected yields no entry; the batch
//! it belongs to carries on.

use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;

use shared::{component_debug, component_info, component_warn, Component, HttpTiming, PingStats};

use crate::error::ExperimentResult;
use crate::traits::ProbeRunner;

/// Probe counts and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub ping_count: u32,
    /// Upper bound of the uniform random delay before each attempt
    pub max_jitter: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_count: 10,
            max_jitter: Duration::from_secs(2),
        }
    }
}

pub struct LatencyProbe<R: ProbeRunner> {
    runner: R,
    config: ProbeConfig,
}

impl<R: ProbeRunner> LatencyProbe<R> {
    pub fn new(runner: R, config: ProbeConfig) -> Self {
        Self { runner, config }
    }

    /// Ping one host; `None` when the probe fails or cannot be parsed
    pub async fn ping_stats(&self, host: &str) -> ExperimentResult<Option<PingStats>> {
        let output = match self.runner.ping(host, self.config.ping_count).await {
            Ok(output) => output,
            Err(e) if e.is_transient() => {
                component_warn!(Component::Probe, "Failed to ping {}: {}", host, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let stats = extract_ping_summary(&output);
        if stats.is_none() {
            component_warn!(
                Component::Probe,
                "Failed to parse `ping -c {} {}` output: {:?}",
                self.config.ping_count,
                host,
                output
            );
        }
        Ok(stats)
    }

    /// Ping every host in turn, omitting hosts whose probe failed
    pub async fn ping_hosts<'a, I>(&self, hosts: I) -> ExperimentResult<BTreeMap<String, PingStats>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        component_info!(Component::Probe, "Pinging hosts...");
        let mut results = BTreeMap::new();
        for host in hosts {
            self.jitter().await;
            if let Some(stats) = self.ping_stats(host).await? {
                component_debug!(Component::Probe, "{}: avg {} ms", host, stats.avg);
                results.insert(host.to_string(), stats);
            }
        }
        Ok(results)
    }

    /// One timed fetch of `url`; `None` when curl fails or prints garbage
    pub async fn http_timing(&self, url: &str) -> ExperimentResult<Option<HttpTiming>> {
        let output = match self.runner.http_timing(url).await {
            Ok(output) => output,
            Err(e) if e.is_transient() => {
                component_warn!(
                    Component::Probe,
                    "HTTP timing of {} failed, check the internet connection: {}",
                    url,
                    e
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let timing = parse_http_timing(&output);
        if timing.is_none() {
            component_warn!(Component::Probe, "Failed to parse curl timing for {}: {:?}", url, output);
        }
        Ok(timing)
    }

    /// `samples` timing attempts; failed attempts are left out
    pub async fn http_timing_samples(&self, url: &str, samples: u32) -> ExperimentResult<Vec<HttpTiming>> {
        component_info!(Component::Probe, "Gathering curl stats...");
        let mut timings = Vec::with_capacity(samples as usize);
        for attempt in 1..=samples {
            self.jitter().await;
            component_info!(Component::Probe, "Attempt {} of {}", attempt, samples);
            if let Some(timing) = self.http_timing(url).await? {
                timings.push(timing);
            }
        }
        Ok(timings)
    }

    async fn jitter(&self) {
        if self.config.max_jitter.is_zero() {
            return;
        }
        let secs = rand::thread_rng().gen_range(0.0..=self.config.max_jitter.as_secs_f64());
        sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Parse a `min/avg/max/stddev` quadruple
pub fn parse_ping_summary(summary: &str) -> Option<PingStats> {
    let values = summary
        .trim()
        .split('/')
        .map(|v| v.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;

    match values.as_slice() {
        [min, avg, max, stddev] => Some(PingStats {
            min: *min,
            avg: *avg,
            max: *max,
            stddev: *stddev,
        }),
        _ => None,
    }
}

/// Find the round-trip summary in full ping output
///
/// The last non-empty line looks like
/// `rtt min/avg/max/mdev = 10.2/12.5/15.1/1.3 ms`; its fourth field holds
/// the quadruple. A bare quadruple is accepted as well.
pub fn extract_ping_summary(output: &str) -> Option<PingStats> {
    let line = output.lines().rev().find(|line| !line.trim().is_empty())?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [_, _, _, summary, ..] => parse_ping_summary(summary),
        [summary] => parse_ping_summary(summary),
        _ => None,
    }
}

/// Parse curl's `-w` JSON timing breakdown into a flat map
pub fn parse_http_timing(output: &str) -> Option<HttpTiming> {
    let timing: HttpTiming = serde_json::from_str(output.trim()).ok()?;
    if timing.is_empty() || timing.values().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    Some(timing)
}
