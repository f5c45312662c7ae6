//! # Clawlet Core
//!
//! Domain types, traits, and error definitions for the Clawlet agent runtime.
//! Other crates implement against the model defined here.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is defined as a trait here:
//! text-generation backends ([`Provider`]), tools ([`Tool`]), conversation
//! storage ([`StorageAdapter`]) and progress observers ([`ProgressSink`]).
//! Implementations live in their respective crates, and tests swap in
//! scripted stand-ins.

pub mod error;
pub mod event;
pub mod message;
pub mod profile;
pub mod provider;
pub mod storage;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, StorageError, ToolError};
pub use event::{EventBus, ProgressEvent, ProgressSink};
pub use message::{Message, Role};
pub use profile::{HistoryPolicy, MemoryLimits, Profile, ProfileTable};
pub use provider::{Provider, StreamChunk};
pub use storage::StorageAdapter;
pub use tool::{Tool, ToolDefinition, ToolRegistry, ToolResult};
