//! Peer-connection state management
//!
//! Makes the daemon's swarm match a desired connected/disconnected state for
//! one node at a time. Commands are only issued when the current state
//! differs from the desired one.

use std::sync::Arc;

use shared::{component_debug, component_warn, Component, RemoteNode};

use crate::command::DaemonCommand;
use crate::error::ExperimentResult;
use crate::traits::DaemonCli;

pub struct ConnectionManager<C: DaemonCli> {
    cli: Arc<C>,
}

impl<C: DaemonCli> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self { cli: Arc::clone(&self.cli) }
    }
}

impl<C: DaemonCli> ConnectionManager<C> {
    pub fn new(cli: Arc<C>) -> Self {
        Self { cli }
    }

    /// Whether `node` appears in the daemon's peer address list
    ///
    /// A failed listing counts as not connected.
    pub async fn is_connected(&self, node: &RemoteNode) -> ExperimentResult<bool> {
        match self.cli.run(&DaemonCommand::SwarmAddrs).await {
            Ok(addrs) => Ok(addrs.contains(node.id())),
            Err(e) if e.is_transient() => {
                component_warn!(Component::Connection, "Could not list swarm peers: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Single connect attempt if `node` is not already connected
    pub async fn ensure_connected(&self, node: &RemoteNode) -> ExperimentResult<()> {
        if self.is_connected(node).await? {
            return Ok(());
        }
        component_debug!(Component::Connection, "Connecting to {}", node.address());
        self.issue(DaemonCommand::SwarmConnect(node.address().clone())).await
    }

    /// Single disconnect attempt if `node` is currently connected
    pub async fn ensure_disconnected(&self, node: &RemoteNode) -> ExperimentResult<()> {
        if !self.is_connected(node).await? {
            return Ok(());
        }
        component_debug!(Component::Connection, "Disconnecting from {}", node.address());
        self.issue(DaemonCommand::SwarmDisconnect(node.address().clone())).await
    }

    async fn issue(&self, command: DaemonCommand) -> ExperimentResult<()> {
        match self.cli.run(&command).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_transient() => {
                component_warn!(Component::Connection, "`{}` failed: {}", command, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExperimentError;
    use crate::traits::MockDaemonCli;

    const PEER: &str = "QmX5Q5cF1F1yvcS2QWMXPu1GsP5kVajH6UbLrTBXWHx8HM";

    fn node() -> RemoteNode {
        RemoteNode::new(PEER, format!("/ip4/18.18.248.83/tcp/4001/ipfs/{PEER}")).unwrap()
    }

    fn is_connect(command: &DaemonCommand) -> bool {
        matches!(command, DaemonCommand::SwarmConnect(_))
    }

    #[tokio::test]
    async fn test_connected_node_is_not_reconnected() {
        let mut cli = MockDaemonCli::new();
        cli.expect_run()
            .withf(|c| *c == DaemonCommand::SwarmAddrs)
            .times(2)
            .returning(|_| Ok(format!("{PEER} (1)\n\t/ip4/18.18.248.83/tcp/4001\n")));
        cli.expect_run().withf(is_connect).times(0);

        let manager = ConnectionManager::new(Arc::new(cli));
        manager.ensure_connected(&node()).await.unwrap();
        manager.ensure_connected(&node()).await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_uses_node_address() {
        let mut cli = MockDaemonCli::new();
        cli.expect_run()
            .withf(|c| *c == DaemonCommand::SwarmAddrs)
            .times(1)
            .returning(|_| Ok(String::new()));
        cli.expect_run()
            .withf(|c| c.to_string() == format!("swarm connect /ip4/18.18.248.83/tcp/4001/ipfs/{PEER}"))
            .times(1)
            .returning(|_| Ok(format!("connect {PEER} success")));

        let manager = ConnectionManager::new(Arc::new(cli));
        manager.ensure_connected(&node()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_connect_is_swallowed() {
        let mut cli = MockDaemonCli::new();
        cli.expect_run()
            .withf(|c| *c == DaemonCommand::SwarmAddrs)
            .returning(|_| Ok(String::new()));
        cli.expect_run().withf(is_connect).times(1).returning(|c| {
            Err(ExperimentError::CommandFailed {
                command: c.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "failure: dial backoff".to_string(),
            })
        });

        let manager = ConnectionManager::new(Arc::new(cli));
        assert!(manager.ensure_connected(&node()).await.is_ok());
        assert!(!manager.is_connected(&node()).await.unwrap());
    }

    #[tokio::test]
    async fn test_disconnect_only_when_connected() {
        let mut cli = MockDaemonCli::new();
        let mut seq = mockall::Sequence::new();
        cli.expect_run()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(String::new()));
        cli.expect_run()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(format!("{PEER} (1)")));
        cli.expect_run()
            .withf(|c| matches!(c, DaemonCommand::SwarmDisconnect(_)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(String::new()));

        let manager = ConnectionManager::new(Arc::new(cli));
        manager.ensure_disconnected(&node()).await.unwrap();
        manager.ensure_disconnected(&node()).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_binary_propagates() {
        let mut cli = MockDaemonCli::new();
        cli.expect_run().returning(|_| {
            Err(ExperimentError::CommandSpawn {
                program: "ipfs".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        });

        let manager = ConnectionManager::new(Arc::new(cli));
        assert!(manager.is_connected(&node()).await.is_err());
    }
}
