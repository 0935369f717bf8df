//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Content-derived identifier used to fetch an artifact from the swarm
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: impl Into<String>) -> SharedResult<Self> {
        let hash = hash.into();
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SharedError::InvalidContentHash { input: hash });
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentHash {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Self-describing network address, e.g. `/ip4/1.2.3.4/tcp/4001/p2p/Qm...`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Multiaddr(String);

impl Multiaddr {
    pub fn new(address: impl Into<String>) -> SharedResult<Self> {
        let address = address.into();
        if address.len() < 2 || !address.starts_with('/') || address.chars().any(char::is_whitespace) {
            return Err(SharedError::InvalidMultiaddr { input: address });
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Multiaddr {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Multiaddr> for String {
    fn from(value: Multiaddr) -> Self {
        value.0
    }
}

impl fmt::Display for Multiaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote swarm peer the experiment connects to
///
/// The address always embeds the peer id; the pair is checked once on
/// construction and cannot be changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRemoteNode", into = "RawRemoteNode")]
pub struct RemoteNode {
    id: String,
    address: Multiaddr,
}

#[derive(Serialize, Deserialize)]
struct RawRemoteNode {
    id: String,
    address: String,
}

impl RemoteNode {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> SharedResult<Self> {
        let id = id.into();
        let address = Multiaddr::new(address)?;
        if id.is_empty() || !address.as_str().contains(&id) {
            return Err(SharedError::NodeIdMismatch {
                id,
                address: address.0,
            });
        }
        Ok(Self { id, address })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> &Multiaddr {
        &self.address
    }
}

impl TryFrom<RawRemoteNode> for RemoteNode {
    type Error = SharedError;

    fn try_from(raw: RawRemoteNode) -> Result<Self, Self::Error> {
        Self::new(raw.id, raw.address)
    }
}

impl From<RemoteNode> for RawRemoteNode {
    fn from(node: RemoteNode) -> Self {
        Self {
            id: node.id,
            address: node.address.0,
        }
    }
}

impl fmt::Display for RemoteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A fetchable artifact, reachable both over HTTP and by content hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    url: String,
    hash: ContentHash,
}

impl RemoteFile {
    pub fn new(url: impl Into<String>, hash: ContentHash) -> Self {
        Self { url: url.into(), hash }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}

/// Lifecycle of the external daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    /// No daemon process is known to exist
    Stopped,
    /// Spawned, not yet visible in the process table
    Starting,
    /// Present in the process table but not answering status queries
    Running,
    /// Answering status queries
    Available,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Stopped => write!(f, "stopped"),
            ProcessState::Starting => write!(f, "starting"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::Available => write!(f, "available"),
        }
    }
}
