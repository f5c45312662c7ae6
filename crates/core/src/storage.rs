//! Storage trait — where conversation memory persists between sessions.
//!
//! The contract is deliberately tiny: a named JSON value can be loaded or
//! saved. Conversation memory stores its whole message list under one key.

use async_trait::async_trait;
use crate::error::StorageError;

/// A key/value store for persisted agent state.
///
/// Implementations: in-memory (for tests and ephemeral sessions), JSON file.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Load the value stored under `key`. `Ok(None)` means nothing was ever
    /// saved there; any other failure is an `Err`.
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Replace the value stored under `key`.
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;
}
