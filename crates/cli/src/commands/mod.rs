//! CLI subcommands.

pub mod agent;
pub mod memory;

use clawlet_config::AppConfig;
use clawlet_core::profile::Profile;
use clawlet_memory::{ConversationMemory, FileStorage};
use std::sync::Arc;

/// Load config from `~/.clawlet/config.toml`.
pub fn load_config() -> Result<AppConfig, clawlet_core::Error> {
    Ok(AppConfig::load()?)
}

/// File-backed memory sized for `profile`.
pub fn build_memory(config: &AppConfig, profile: Profile) -> ConversationMemory {
    let storage = FileStorage::new(config.memory.resolved_path());
    ConversationMemory::new(config.profiles.limits(profile))
        .with_storage(Arc::new(storage))
        .with_key(config.memory.key.clone())
}
