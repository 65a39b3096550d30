//! Fireside CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write a starter config file
//! - `chat`     — Interactive session or single-message mode
//! - `memories` — Show what the companion remembers

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fireside",
    about = "Fireside — a personal companion with long-term memory",
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
    /// Write a starter configuration file
    Onboard,

    /// Talk with the companion
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show stored memories
    Memories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Memories => commands::memories::run().await?,
    }

    Ok(())
}
