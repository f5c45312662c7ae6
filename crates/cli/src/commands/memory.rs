//! `clawlet memory` — Inspect or clear stored conversation memory.

use super::{build_memory, load_config};
use clawlet_memory::ConversationMemory;

/// Open the stored memory under the configured profile's limits.
async fn open() -> Result<(ConversationMemory, std::path::PathBuf), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut memory = build_memory(&config, config.agent.profile);
    memory.init().await?;
    Ok((memory, config.memory.resolved_path()))
}

pub async fn stats() -> Result<(), Box<dyn std::error::Error>> {
    let (memory, path) = open().await?;
    let stats = memory.stats();

    println!("Memory Statistics");
    println!("=================");
    println!("  File:      {}", path.display());
    println!("  Messages:  {} / {}", stats.message_count, stats.max_messages);
    println!("  Size:      {} / {} bytes", stats.size_bytes, stats.max_size);
    println!("  Floor:     {}", memory.limits().floor);

    Ok(())
}

pub async fn show(last: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let (memory, _) = open().await?;
    let messages = match last {
        Some(n) => memory.recent(n),
        None => memory.messages(),
    };

    if messages.is_empty() {
        println!("No stored messages.");
        return Ok(());
    }

    for message in messages {
        println!("[{}] {}", message.role, message.content);
    }
    Ok(())
}

pub async fn clear(confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        println!("This will delete ALL stored conversation messages.");
        println!("Run with --confirm to proceed:");
        println!("  clawlet memory clear --confirm");
        return Ok(());
    }

    let (mut memory, path) = open().await?;
    let removed = memory.len();
    memory.clear().await?;
    println!("Cleared {removed} messages from {}.", path.display());

    Ok(())
}
