//! Experiment plan: which peers to measure, which files to fetch, how often
//!
//! The built-in plan describes the default campaign; a JSON file with the
//! same shape can replace it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use shared::{ContentHash, RemoteFile, RemoteNode, SharedResult};

use crate::error::{ExperimentError, ExperimentResult};

/// Sample counts per measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCounts {
    pub curl_quick: u32,
    pub curl_slow: u32,
    pub swarm_quick: u32,
    pub swarm_slow: u32,
}

impl Default for SampleCounts {
    fn default() -> Self {
        Self {
            curl_quick: 5,
            curl_slow: 3,
            swarm_quick: 10,
            swarm_slow: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentPlan {
    /// Group name -> host name -> peer
    pub groups: BTreeMap<String, BTreeMap<String, RemoteNode>>,

    /// Groups pinged, in order
    pub ping_order: Vec<String>,

    /// Groups fetched through, in order; every other group is disconnected first
    pub swarm_order: Vec<String>,

    pub files: BTreeMap<String, RemoteFile>,

    /// Always measured
    pub quick_file: String,

    /// Measured only when slow tests are requested
    pub slow_file: String,

    #[serde(default)]
    pub samples: SampleCounts,
}

impl ExperimentPlan {
    /// Peers and files of the default campaign
    pub fn builtin() -> SharedResult<Self> {
        let mut mit = BTreeMap::new();
        mit.insert(
            "npfoss.mit.edu".to_string(),
            RemoteNode::new(
                "QmSzpPdWxHMmPDPy8A4igWWwTVPcBHZXueYLzWQsBwHFuU",
                "/ip4/18.18.96.12/tcp/14001/p2p/QmSzpPdWxHMmPDPy8A4igWWwTVPcBHZXueYLzWQsBwHFuU",
            )?,
        );
        mit.insert(
            "p1.mit.edu".to_string(),
            RemoteNode::new(
                "QmX5Q5cF1F1yvcS2QWMXPu1GsP5kVajH6UbLrTBXWHx8HM",
                "/ip4/18.18.248.83/tcp/4001/ipfs/QmX5Q5cF1F1yvcS2QWMXPu1GsP5kVajH6UbLrTBXWHx8HM",
            )?,
        );

        let mut residential = BTreeMap::new();
        residential.insert(
            "lobster.moinnadeem.com".to_string(),
            RemoteNode::new(
                "QmeTPkjcFsgBvAm3K18JbC3kDGNbDZ9cs4fibnDb2Lr8je",
                "/ip4/66.31.16.203/tcp/9701/ipfs/QmeTPkjcFsgBvAm3K18JbC3kDGNbDZ9cs4fibnDb2Lr8je",
            )?,
        );

        let mut files = BTreeMap::new();
        files.insert(
            "ipad".to_string(),
            RemoteFile::new(
                "https://www.apple.com/105/media/us/ipad-pro/2020/7be9ce7b-fa4e-4f54-968b-4a7687066ed8/films/feature/ipad-pro-feature-tpl-cc-us-2020_1280x720h.mp4",
                ContentHash::new("QmfBsQa4iZRsKkELk7QGP4acN4sX6WfvBvVWT4Tz5yuE24")?,
            ),
        );
        files.insert(
            "iphone".to_string(),
            RemoteFile::new(
                "https://www.apple.com/v/home/f/images/heroes/iphone-se/hero__dvsxv8smkkgi_large.jpg",
                ContentHash::new("Qmay7eKcsxZ5UkraAucEGtTsv6LzA5hn3P8JnQQcWaVwcN")?,
            ),
        );

        let mut groups = BTreeMap::new();
        groups.insert("mit".to_string(), mit);
        groups.insert("residential".to_string(), residential);

        Ok(Self {
            groups,
            ping_order: vec!["mit".to_string(), "residential".to_string()],
            swarm_order: vec!["residential".to_string(), "mit".to_string()],
            files,
            quick_file: "iphone".to_string(),
            slow_file: "ipad".to_string(),
            samples: SampleCounts::default(),
        })
    }

    /// Load and validate a plan from a JSON file
    pub fn load(path: &Path) -> ExperimentResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check that every referenced group and file exists
    pub fn validate(&self) -> ExperimentResult<()> {
        for group in self.ping_order.iter().chain(&self.swarm_order) {
            if !self.groups.contains_key(group) {
                return Err(ExperimentError::config(format!("unknown host group '{group}'")));
            }
        }
        for file in [&self.quick_file, &self.slow_file] {
            if !self.files.contains_key(file) {
                return Err(ExperimentError::config(format!("unknown file '{file}'")));
            }
        }
        Ok(())
    }

    pub fn group_nodes(&self, group: &str) -> Vec<RemoteNode> {
        self.groups
            .get(group)
            .map(|hosts| hosts.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every node that is not part of `group`
    pub fn nodes_outside(&self, group: &str) -> Vec<RemoteNode> {
        self.groups
            .iter()
            .filter(|(name, _)| name.as_str() != group)
            .flat_map(|(_, hosts)| hosts.values().cloned())
            .collect()
    }

    pub fn hosts(&self, group: &str) -> Vec<&str> {
        self.groups
            .get(group)
            .map(|hosts| hosts.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_plan_is_valid() {
        let plan = ExperimentPlan::builtin().unwrap();
        plan.validate().unwrap();

        assert_eq!(plan.group_nodes("mit").len(), 2);
        assert_eq!(plan.nodes_outside("mit").len(), 1);
        assert_eq!(plan.hosts("residential"), vec!["lobster.moinnadeem.com"]);
        assert!(plan.group_nodes("nowhere").is_empty());
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let mut plan = ExperimentPlan::builtin().unwrap();
        plan.swarm_order.push("campus".to_string());
        assert!(plan.validate().is_err());

        let mut plan = ExperimentPlan::builtin().unwrap();
        plan.slow_file = "movie".to_string();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let plan = ExperimentPlan::builtin().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, serde_json::to_string(&plan).unwrap()).unwrap();

        let loaded = ExperimentPlan::load(&path).unwrap();
        assert_eq!(loaded.groups, plan.groups);
        assert_eq!(loaded.samples, SampleCounts::default());
    }

    #[test]
    fn test_load_rejects_mismatched_node() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let json = r#"{
            "groups": {"lab": {"h": {"id": "QmA", "address": "/ip4/1.2.3.4/tcp/4001/p2p/QmB"}}},
            "ping_order": ["lab"],
            "swarm_order": ["lab"],
            "files": {"f": {"url": "https://example.com/f", "hash": "QmF"}},
            "quick_file": "f",
            "slow_file": "f"
        }"#;
        std::fs::write(&path, json).unwrap();

        assert!(ExperimentPlan::load(&path).is_err());
    }
}
