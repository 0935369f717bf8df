//! Experiment report written at the end of a measurement run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use shared::{AggregateResult, PingStats, SampleSet};

/// Report layout version
pub const REPORT_VERSION: &str = "v0.4.0";

/// Prefix of the per-group swarm fetch sections
pub const SWARM_SECTION_PREFIX: &str = "ipfs_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "VERSION")]
    pub version: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    /// Host group -> host -> ping summary
    pub pings: BTreeMap<String, BTreeMap<String, PingStats>>,

    /// File -> reduced HTTP timings
    pub curl: BTreeMap<String, AggregateResult>,

    /// `ipfs_<group>` -> file -> fetch samples
    #[serde(flatten)]
    pub swarm: BTreeMap<String, BTreeMap<String, SampleSet>>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            pings: BTreeMap::new(),
            curl: BTreeMap::new(),
            swarm: BTreeMap::new(),
        }
    }

    pub fn record_swarm(&mut self, group: &str, file: &str, samples: SampleSet) {
        self.swarm
            .entry(format!("{SWARM_SECTION_PREFIX}{group}"))
            .or_default()
            .insert(file.to_string(), samples);
    }

    pub fn swarm_samples(&self, group: &str, file: &str) -> Option<&SampleSet> {
        self.swarm.get(&format!("{SWARM_SECTION_PREFIX}{group}"))?.get(file)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}
