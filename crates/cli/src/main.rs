//! Clawlet CLI — the main entry point.
//!
//! Commands:
//! - `agent`   — Interactive chat or single-message mode
//! - `memory`  — Inspect or clear stored conversation memory

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "clawlet",
    about = "Clawlet — a small reason/act/observe agent runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Profile to run under (LOW_POWER, HIGH_POWER, CHAT or low/high/chat)
        #[arg(long)]
        profile: Option<String>,

        /// Backend to use instead of the configured default
        #[arg(long)]
        provider: Option<String>,
    },

    /// Inspect or clear stored conversation memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Show message count and size against the limits
    Stats,

    /// Print stored messages
    Show {
        /// Only the most recent N messages
        #[arg(short, long)]
        last: Option<usize>,
    },

    /// Delete every stored message
    Clear {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Agent {
            message,
            profile,
            provider,
        } => commands::agent::run(message, profile, provider).await?,
        Commands::Memory { action } => match action {
            MemoryAction::Stats => commands::memory::stats().await?,
            MemoryAction::Show { last } => commands::memory::show(last).await?,
            MemoryAction::Clear { confirm } => commands::memory::clear(confirm).await?,
        },
    }

    Ok(())
}
