//! Typed daemon sub-commands
//!
//! Every daemon invocation goes through [`DaemonCommand`], whose parameters
//! are already-validated identifiers. Commands render to an argv list and are
//! never interpolated into a shell string.

use std::fmt;

use shared::{ContentHash, Multiaddr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Long-running server
    Daemon,
    /// Create the local repository
    Init,
    /// Print the local node identity
    Id,
    /// Lightweight status query used as an availability probe
    StatsBitswap,
    /// List the addresses of connected peers
    SwarmAddrs,
    SwarmConnect(Multiaddr),
    SwarmDisconnect(Multiaddr),
    /// Evict unpinned content from the local store
    RepoGc,
    /// Fetch content into the working directory
    Get(ContentHash),
    PinAdd(ContentHash),
}

impl DaemonCommand {
    pub fn args(&self) -> Vec<&str> {
        match self {
            DaemonCommand::Daemon => vec!["daemon"],
            DaemonCommand::Init => vec!["init"],
            DaemonCommand::Id => vec!["id"],
            DaemonCommand::StatsBitswap => vec!["stats", "bitswap"],
            DaemonCommand::SwarmAddrs => vec!["swarm", "addrs"],
            DaemonCommand::SwarmConnect(address) => vec!["swarm", "connect", address.as_str()],
            DaemonCommand::SwarmDisconnect(address) => vec!["swarm", "disconnect", address.as_str()],
            DaemonCommand::RepoGc => vec!["repo", "gc"],
            DaemonCommand::Get(hash) => vec!["get", hash.as_str()],
            DaemonCommand::PinAdd(hash) => vec!["pin", "add", hash.as_str()],
        }
    }
}

impl fmt::Display for DaemonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}
