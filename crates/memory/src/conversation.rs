//! Bounded conversation memory.
//!
//! An append-only log of role-tagged messages that evicts from the oldest
//! end whenever it grows past its limits:
//!
//! 1. **Count**: keep at most `max_messages` of the most recent messages.
//! 2. **Size**: while the serialized sequence is larger than `max_bytes`,
//!    drop the oldest message, but never go below `floor` messages.
//!
//! The cheap count cut runs first so the size pass never serializes a
//! sequence that is about to be truncated anyway. Past the floor, memory
//! accepts being over its size budget rather than losing all context.

use clawlet_core::error::StorageError;
use clawlet_core::message::{Message, Role};
use clawlet_core::profile::MemoryLimits;
use clawlet_core::storage::StorageAdapter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Key the message list is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "messages";

/// Observability snapshot of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub message_count: usize,
    pub size_bytes: usize,
    pub max_messages: usize,
    pub max_size: usize,
}

/// Ordered, bounded message log with optional persistence.
pub struct ConversationMemory {
    messages: Vec<Message>,
    limits: MemoryLimits,
    storage: Option<Arc<dyn StorageAdapter>>,
    key: String,
    hydrated: bool,
}

impl ConversationMemory {
    /// A memory that lives only in process.
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            messages: Vec::new(),
            limits,
            storage: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
            hydrated: false,
        }
    }

    /// Back this memory with a storage adapter.
    pub fn with_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Change the key the message list is stored under.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Hydrate from storage.
    ///
    /// Without storage this is a no-op. A key that was never saved starts
    /// the memory empty and persists that empty state. Only the first call
    /// reads storage; later calls return immediately.
    pub async fn init(&mut self) -> Result<(), StorageError> {
        if self.hydrated {
            return Ok(());
        }
        let Some(storage) = self.storage.clone() else {
            self.hydrated = true;
            return Ok(());
        };

        match storage.load(&self.key).await? {
            Some(value) => {
                let messages: Vec<Message> =
                    serde_json::from_value(value).map_err(|e| StorageError::Corrupt {
                        key: self.key.clone(),
                        reason: e.to_string(),
                    })?;
                self.messages = messages;
                let evicted = self.evict();
                if evicted > 0 {
                    self.persist().await?;
                }
                info!(
                    storage = storage.name(),
                    messages = self.messages.len(),
                    evicted,
                    "Conversation memory hydrated"
                );
            }
            None => {
                self.messages.clear();
                self.persist().await?;
                debug!(storage = storage.name(), key = %self.key, "No stored conversation, starting empty");
            }
        }

        self.hydrated = true;
        Ok(())
    }

    /// Append a message, evict past the limits, persist if configured.
    pub async fn add_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.add_messages(vec![Message::new(role, content)]).await
    }

    /// Append several messages as one unit: a single eviction pass and a
    /// single save. If the save fails, memory is left exactly as it was.
    pub async fn add_messages(&mut self, messages: Vec<Message>) -> Result<(), StorageError> {
        let previous = self.storage.as_ref().map(|_| self.messages.clone());
        self.messages.extend(messages);
        self.evict();
        if let Err(e) = self.persist().await {
            if let Some(previous) = previous {
                self.messages = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    /// The full retained sequence, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent `n` messages (all of them if fewer are retained).
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    /// Drop every message. A failed save keeps the messages.
    pub async fn clear(&mut self) -> Result<(), StorageError> {
        let previous = std::mem::take(&mut self.messages);
        if let Err(e) = self.persist().await {
            self.messages = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            message_count: self.messages.len(),
            size_bytes: serialized_size(&self.messages),
            max_messages: self.limits.max_messages,
            max_size: self.limits.max_bytes,
        }
    }

    /// Apply both eviction passes. Returns how many messages were dropped.
    fn evict(&mut self) -> usize {
        let before = self.messages.len();

        if self.messages.len() > self.limits.max_messages {
            let excess = self.messages.len() - self.limits.max_messages;
            self.messages.drain(..excess);
        }

        let mut size = serialized_size(&self.messages);
        while size > self.limits.max_bytes && self.messages.len() > self.limits.floor {
            self.messages.remove(0);
            size = serialized_size(&self.messages);
        }

        let dropped = before - self.messages.len();
        if dropped > 0 {
            debug!(
                dropped,
                retained = self.messages.len(),
                size_bytes = size,
                "Evicted oldest messages"
            );
        }
        dropped
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let value = serde_json::to_value(&self.messages).map_err(|e| StorageError::Backend(e.to_string()))?;
        storage.save(&self.key, value).await
    }
}

/// Size of the sequence as it would be written to storage.
fn serialized_size(messages: &[Message]) -> usize {
    serde_json::to_vec(messages).map(|v| v.len()).unwrap_or(0)
}
