//! Steward CLI — the main entry point.
//!
//! Commands:
//! - `shell`   — Interactive chat or single-message mode
//! - `config`  — Show or initialize configuration
//! - `doctor`  — Diagnose system health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "steward",
    about = "Steward — conversational assistant runtime",
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
    /// Chat with the assistant
    Shell {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Route requests through the fast-path model
        #[arg(long)]
        fast: bool,

        /// Knowledge base documents to ingest before the session
        #[arg(long)]
        docs: Vec<String>,
    },

    /// Show or initialize configuration
    Config {
        /// Write a default config file instead of showing the current one
        #[arg(long)]
        init: bool,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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
        Commands::Shell { message, fast, docs } => commands::shell::run(message, fast, docs).await?,
        Commands::Config { init } => commands::config_cmd::run(init)?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
