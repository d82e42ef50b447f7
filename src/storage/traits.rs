//! Abstract store trait for rtdbql.
//!
//! The resolver only ever writes through this trait. By using a trait, we enable:
//! - In-memory backends for testing and embedded use
//! - Adapters over a hosted realtime database client

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::path;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Path contains a segment the store refuses.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Value cannot be written with the requested operation.
    #[error("Invalid value at {path}: {reason}")]
    InvalidValue {
        /// Target path.
        path: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Caller is not allowed to write the path.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Backend error.
    #[error("Store backend error: {0}")]
    BackendError(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl StoreError {
    /// Returns true if the failure is transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}

/// Handle to a freshly generated child location, returned by [`TreeStore::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRef {
    parent: String,
    key: String,
}

impl PushRef {
    /// Create a reference to `key` under `parent`.
    #[must_use]
    pub fn new(parent: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            key: key.into(),
        }
    }

    /// The generated child key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The location the key was generated under.
    #[must_use]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Full path of the generated child.
    #[must_use]
    pub fn path(&self) -> String {
        path::join(&self.parent, &self.key)
    }
}

/// Path-addressed tree store.
///
/// Paths are `/`-separated; empty segments are ignored.
///
/// # Safety Considerations
/// - Each call should be atomic with respect to the addressed subtree
/// - Implementations must be safe to share across tasks
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Merge the children of `value` (an object) into the node at `path`.
    async fn update(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Replace the node at `path` with `value`. Writing `null` removes it.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Delete the subtree at `path`.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Generate a new unique child key under `path`. Nothing is written.
    async fn push(&self, path: &str) -> Result<PushRef, StoreError>;
}
