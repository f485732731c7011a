//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to a specific actor via mpsc
//! 2. **Replies**: oneshot channels carry results back to the caller

use tokio::sync::oneshot;

use crate::node::NodeAddress;

/// Commands that can be sent to the RegistryActor
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register a node
    ///
    /// Replies `true` if the node was new. The node list has been persisted
    /// by the time the reply is sent.
    Add {
        addr: NodeAddress,
        respond_to: oneshot::Sender<bool>,
    },

    /// Remove the first occurrence of a node
    ///
    /// Replies `true` if the node was present.
    Remove {
        addr: NodeAddress,
        respond_to: oneshot::Sender<bool>,
    },

    /// Snapshot of the registry in insertion order
    List {
        respond_to: oneshot::Sender<Vec<NodeAddress>>,
    },

    /// Gracefully shut down the registry actor
    Shutdown,
}

/// Commands that can be sent to a HeartbeatActor
#[derive(Debug)]
pub enum HeartbeatCommand {
    /// Send a heartbeat immediately (bypassing the interval timer)
    BeatNow {
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Stop beating
    ///
    /// An in-flight beat is finished first.
    Shutdown,
}
