//! In-memory node store (no persistence)
//!
//! Useful for tests and for masters started without a node list path.
//! Everything is lost on restart.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use super::backend::NodeStore;
use super::error::StoreResult;
use crate::node::NodeAddress;

/// In-memory node store
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<Vec<NodeAddress>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `nodes`, as if written by an
    /// earlier process.
    pub fn with_nodes(nodes: Vec<NodeAddress>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Snapshot of the last saved list
    pub async fn saved(&self) -> Vec<NodeAddress> {
        self.nodes.read().await.clone()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn load(&self) -> StoreResult<Vec<NodeAddress>> {
        Ok(self.nodes.read().await.clone())
    }

    async fn save(&self, nodes: &[NodeAddress]) -> StoreResult<()> {
        trace!("keeping {} nodes in memory", nodes.len());
        *self.nodes.write().await = nodes.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        String::from("memory")
    }
}
