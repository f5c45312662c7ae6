//! Conversation memory and storage adapters for Clawlet.

pub mod conversation;
pub mod file_backend;
pub mod in_memory;

pub use conversation::{ConversationMemory, MemoryStats, DEFAULT_STORAGE_KEY};
pub use file_backend::FileStorage;
pub use in_memory::InMemoryStorage;
