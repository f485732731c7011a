//! Long-running tasks of the exporter
//!
//! Each actor runs as an independent async task and is driven through a
//! cloneable handle that sends commands over an mpsc channel.
//!
//! ## Actor Types
//!
//! - **RegistryActor** (master): single owner of the node list; serializes
//!   heartbeat registrations, removals and scrape-time reads
//! - **HeartbeatActor** (slave): announces this node to the master at a
//!   fixed interval
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel
//! 2. **Request/Response**: oneshot channels carry replies back

pub mod heartbeat;
pub mod messages;
pub mod registry;
