//! Error types for node list persistence

use std::fmt;

/// Result type alias for node store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading or saving the node list
#[derive(Debug)]
pub enum StoreError {
    /// I/O error (file access, rename, etc.)
    IoError(std::io::Error),

    /// The node list could not be (de)serialized
    SerializationError(serde_json::Error),

    /// Invalid store configuration
    InvalidConfig(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IoError(err) => write!(f, "I/O error: {}", err),
            StoreError::SerializationError(err) => write!(f, "malformed node list: {}", err),
            StoreError::InvalidConfig(msg) => write!(f, "invalid node store configuration: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::IoError(err) => Some(err),
            StoreError::SerializationError(err) => Some(err),
            StoreError::InvalidConfig(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err)
    }
}
