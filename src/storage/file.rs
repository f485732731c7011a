//! JSON file node store
//!
//! The node list is kept as a pretty-printed JSON array of address
//! strings. Saves go to a sibling temp file which is then renamed over the
//! target, so a reader never observes a half-written list.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use super::backend::NodeStore;
use super::error::{StoreError, StoreResult};
use crate::node::NodeAddress;

#[derive(Debug, Clone)]
pub struct FileNodeStore {
    path: PathBuf,
}

impl FileNodeStore {
    pub fn new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig(String::from(
                "node list path is empty",
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl NodeStore for FileNodeStore {
    async fn load(&self) -> StoreResult<Vec<NodeAddress>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no node list at {}, starting empty", self.path.display());
                return Ok(vec![]);
            }
            Err(e) => return Err(e.into()),
        };

        let nodes: Vec<NodeAddress> = serde_json::from_str(&content)?;
        trace!("read {} nodes from {}", nodes.len(), self.path.display());
        Ok(nodes)
    }

    async fn save(&self, nodes: &[NodeAddress]) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(nodes)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        trace!("wrote {} nodes to {}", nodes.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
