//! RegistryActor - Single owner of the master's node list
//!
//! Every read and mutation of the registry is a message to this actor, so
//! concurrent heartbeats and scrapes never observe a half-applied change.
//!
//! ## Message Flow
//!
//! ```text
//! Heartbeat route ──Add──▶ RegistryActor ──save──▶ NodeStore (JSON file)
//! Scrape route   ──List─▶       │
//! Nodes route    ──Remove▶      └── reply after the write completes
//! ```

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use super::messages::RegistryCommand;
use crate::node::NodeAddress;
use crate::storage::NodeStore;

/// Actor owning the ordered, duplicate-free list of registered nodes
pub struct RegistryActor {
    /// Registered nodes in insertion order
    nodes: Vec<NodeAddress>,

    /// Backing store, written after every mutation
    store: Box<dyn NodeStore>,

    /// Command receiver
    command_rx: mpsc::Receiver<RegistryCommand>,
}

impl RegistryActor {
    /// Create the actor, loading the persisted node list.
    ///
    /// Load failures are logged and leave the registry empty.
    pub async fn new(store: Box<dyn NodeStore>, command_rx: mpsc::Receiver<RegistryCommand>) -> Self {
        let nodes = match store.load().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("could not load node list from {}, starting empty: {e}", store.describe());
                vec![]
            }
        };

        let nodes = dedup_in_order(nodes);
        info!("registry starts with {} nodes from {}", nodes.len(), store.describe());

        Self {
            nodes,
            store,
            command_rx,
        }
    }

    /// Run the actor's main loop until shutdown or until every handle is gone
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting registry actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RegistryCommand::Add { addr, respond_to } => {
                    let added = self.add(addr).await;
                    let _ = respond_to.send(added);
                }

                RegistryCommand::Remove { addr, respond_to } => {
                    let removed = self.remove(&addr).await;
                    let _ = respond_to.send(removed);
                }

                RegistryCommand::List { respond_to } => {
                    let _ = respond_to.send(self.nodes.clone());
                }

                RegistryCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("registry actor stopped");
    }

    async fn add(&mut self, addr: NodeAddress) -> bool {
        if self.nodes.contains(&addr) {
            return false;
        }

        info!("registering node {addr}");
        self.nodes.push(addr);
        self.persist().await;
        true
    }

    async fn remove(&mut self, addr: &NodeAddress) -> bool {
        let Some(index) = self.nodes.iter().position(|node| node == addr) else {
            return false;
        };

        info!("removing node {addr}");
        self.nodes.remove(index);
        self.persist().await;
        true
    }

    /// Write the full list through to the store.
    ///
    /// A failed write keeps the in-memory change; the next successful
    /// mutation rewrites the whole list.
    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.nodes).await {
            error!("failed to persist node list to {}: {e}", self.store.describe());
        }
    }
}

fn dedup_in_order(nodes: Vec<NodeAddress>) -> Vec<NodeAddress> {
    let mut unique = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !unique.contains(&node) {
            unique.push(node);
        }
    }
    unique
}

/// Handle for talking to the RegistryActor
///
/// Cheap to clone; every route that touches the registry holds one.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Load the registry from `store` and spawn its actor.
    pub async fn spawn(store: Box<dyn NodeStore>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let actor = RegistryActor::new(store, cmd_rx).await;

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Register `addr`; returns `true` if it was not yet known.
    pub async fn add(&self, addr: NodeAddress) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Add {
                addr,
                respond_to: tx,
            })
            .await
            .context("failed to send Add command")?;

        rx.await.context("failed to receive response")
    }

    /// Remove `addr`; returns `true` if it was registered.
    pub async fn remove(&self, addr: NodeAddress) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Remove {
                addr,
                respond_to: tx,
            })
            .await
            .context("failed to send Remove command")?;

        rx.await.context("failed to receive response")
    }

    /// Current registry contents in insertion order
    pub async fn list(&self) -> Result<Vec<NodeAddress>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::List { respond_to: tx })
            .await
            .context("failed to send List command")?;

        rx.await.context("failed to receive response")
    }

    /// Gracefully shut down the registry actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RegistryCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
