//! In-memory storage — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use clawlet_core::error::StorageError;
use clawlet_core::storage::StorageAdapter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A storage adapter that keeps values in a HashMap.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStorage {
    fn name(&self) -> &str { "in_memory" }

    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
