//! Test fixtures and data for experiment tests
//!
//! This module provides consistent test data and fixtures used across all test suites.

use std::collections::BTreeMap;
use std::time::Duration;

use experiment::config::ExperimentConfig;
use experiment::core::{LifecycleConfig, ProbeConfig};
use experiment::plan::{ExperimentPlan, SampleCounts};
use shared::{ContentHash, RemoteFile, RemoteNode};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Peer ids of the test swarm
    pub const LAB_A: &'static str = "QmSzpPdWxHMmPDPy8A4igWWwTVPcBHZXueYLzWQsBwHFuU";
    pub const LAB_B: &'static str = "QmX5Q5cF1F1yvcS2QWMXPu1GsP5kVajH6UbLrTBXWHx8HM";
    pub const HOME: &'static str = "QmeTPkjcFsgBvAm3K18JbC3kDGNbDZ9cs4fibnDb2Lr8je";

    pub const SMALL_HASH: &'static str = "Qmay7eKcsxZ5UkraAucEGtTsv6LzA5hn3P8JnQQcWaVwcN";
    pub const LARGE_HASH: &'static str = "QmfBsQa4iZRsKkELk7QGP4acN4sX6WfvBvVWT4Tz5yuE24";

    pub fn lab_a() -> RemoteNode {
        RemoteNode::new(Self::LAB_A, format!("/ip4/18.18.96.12/tcp/14001/p2p/{}", Self::LAB_A)).unwrap()
    }

    pub fn lab_b() -> RemoteNode {
        RemoteNode::new(Self::LAB_B, format!("/ip4/18.18.248.83/tcp/4001/ipfs/{}", Self::LAB_B)).unwrap()
    }

    pub fn home() -> RemoteNode {
        RemoteNode::new(Self::HOME, format!("/ip4/66.31.16.203/tcp/9701/ipfs/{}", Self::HOME)).unwrap()
    }

    pub fn small_file() -> RemoteFile {
        RemoteFile::new(
            "https://example.com/small.jpg",
            ContentHash::new(Self::SMALL_HASH).unwrap(),
        )
    }

    pub fn large_file() -> RemoteFile {
        RemoteFile::new(
            "https://example.com/large.mp4",
            ContentHash::new(Self::LARGE_HASH).unwrap(),
        )
    }

    /// Two host groups: "lab" (two peers) and "home" (one peer)
    pub fn plan() -> ExperimentPlan {
        let mut lab = BTreeMap::new();
        lab.insert("a.lab.example".to_string(), Self::lab_a());
        lab.insert("b.lab.example".to_string(), Self::lab_b());

        let mut home = BTreeMap::new();
        home.insert("home.example".to_string(), Self::home());

        let mut groups = BTreeMap::new();
        groups.insert("lab".to_string(), lab);
        groups.insert("home".to_string(), home);

        let mut files = BTreeMap::new();
        files.insert("small".to_string(), Self::small_file());
        files.insert("large".to_string(), Self::large_file());

        ExperimentPlan {
            groups,
            ping_order: vec!["lab".to_string(), "home".to_string()],
            swarm_order: vec!["home".to_string(), "lab".to_string()],
            files,
            quick_file: "small".to_string(),
            slow_file: "large".to_string(),
            samples: SampleCounts {
                curl_quick: 3,
                curl_slow: 2,
                swarm_quick: 4,
                swarm_slow: 2,
            },
        }
    }

    /// Fast polling, no jitter, bounded loops so a broken test cannot hang
    pub fn lifecycle() -> LifecycleConfig {
        LifecycleConfig {
            poll_interval: Duration::from_millis(1),
            start_timeout: Some(Duration::from_secs(5)),
            stop_timeout: Some(Duration::from_secs(5)),
        }
    }

    pub fn config() -> ExperimentConfig {
        ExperimentConfig {
            lifecycle: Self::lifecycle(),
            probe: ProbeConfig {
                ping_count: 10,
                max_jitter: Duration::ZERO,
            },
            host_check_interval: Duration::from_millis(5),
            ..ExperimentConfig::default()
        }
    }
}
