//! Persistence for the master's node list
//!
//! ## Design
//!
//! - **Trait-based**: `NodeStore` allows swapping implementations
//! - **Write-through**: the registry saves the whole list after every mutation
//! - **Forgiving reads**: the registry treats load failures as an empty list
//!
//! ## Backends
//!
//! - **File** (default): pretty-printed JSON array on disk
//! - **In-Memory**: no persistence, for tests

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::NodeStore;
pub use error::{StoreError, StoreResult};
pub use file::FileNodeStore;
pub use memory::MemoryNodeStore;
