//! Node store trait definition
//!
//! This module defines the `NodeStore` trait that all node list
//! persistence implementations must implement.

use async_trait::async_trait;

use super::error::StoreResult;
use crate::node::NodeAddress;

/// Trait for node list persistence backends
///
/// The registry actor owns exactly one store. It calls `load` once at
/// startup and `save` with the complete, ordered node list after every
/// mutation, waiting for the write to finish before acknowledging it.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are moved into the
/// registry actor task.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Read the persisted node list.
    ///
    /// A store that has never been written returns an empty list. Malformed
    /// content is an error; the caller decides how to degrade.
    async fn load(&self) -> StoreResult<Vec<NodeAddress>>;

    /// Replace the persisted node list with `nodes`.
    async fn save(&self, nodes: &[NodeAddress]) -> StoreResult<()>;

    /// Human readable location for log lines
    fn describe(&self) -> String;
}
