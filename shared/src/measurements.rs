//! Measurement records produced by the probes and the sampling engine

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Field names of the curl timing breakdown, in seconds
pub const HTTP_TIMING_FIELDS: [&str; 7] = [
    "time_namelookup",
    "time_connect",
    "time_appconnect",
    "time_pretransfer",
    "time_redirect",
    "time_starttransfer",
    "total",
];

/// One HTTP timing attempt keyed by field name
pub type HttpTiming = BTreeMap<String, f64>;

/// Round-trip summary of one ping run, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub stddev: f64,
}

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Output of one content-fetch sampling run
///
/// `average` is only meaningful when `samples` is non-empty; it is NaN
/// (serialized as `null`) otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSet {
    pub tries: u32,
    #[serde(rename = "gets")]
    pub samples: Vec<f64>,
    #[serde(deserialize_with = "nan_from_null")]
    pub average: f64,
}

impl SampleSet {
    pub fn new(tries: u32, samples: Vec<f64>) -> Self {
        let average = mean(&samples);
        Self { tries, samples, average }
    }

    /// True when every requested sample was collected
    pub fn is_complete(&self, requested: usize) -> bool {
        self.samples.len() >= requested
    }
}

/// Per-key samples and means reduced from repeated measurement maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(rename = "samples")]
    pub samples_by_key: BTreeMap<String, Vec<f64>>,
    #[serde(rename = "average")]
    pub average_by_key: BTreeMap<String, f64>,
}

fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
