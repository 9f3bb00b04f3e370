//! Error types for observable-store

use thiserror::Error;

/// Result type for observable-store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised synchronously to the caller of a store operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A value of the wrong shape was handed to construction, bulk conversion
    /// or a write target
    #[error("{0}")]
    Type(String),

    /// A traversal hit a falsy intermediate node
    #[error("Invalid keyPath: {0}")]
    InvalidPath(String),

    /// A `StoreConfig` failed validation
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl StoreError {
    pub(crate) fn invalid_path(path: &str) -> Self {
        StoreError::InvalidPath(path.to_string())
    }

    /// True for the invalid-path kind
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, StoreError::InvalidPath(_))
    }

    /// True for the type kind
    pub fn is_type(&self) -> bool {
        matches!(self, StoreError::Type(_))
    }
}
