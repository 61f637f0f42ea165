//! # PlainDoc CLI (`plaindoc`)
//!
//! Entry point for the simplification service. Provides commands for database
//! initialization, the HTTP server, and a stats report.
//!
//! ## Usage
//!
//! ```bash
//! plaindoc --config ./config/plaindoc.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `plaindoc init` | Create the SQLite database and schema |
//! | `plaindoc serve` | Start the HTTP API server |
//! | `plaindoc stats` | Print a database summary |

mod ai;
mod config;
mod db;
mod extract;
mod ingest;
mod migrate;
mod models;
mod qa;
mod server;
mod simplify;
mod stats;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PlainDoc — legal document simplification service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/plaindoc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "plaindoc",
    about = "PlainDoc — legal document simplification service",
    version,
    long_about = "PlainDoc extracts text from uploaded legal documents (PDF, DOCX, plain text, \
    images via OCR), simplifies it with an external generative model (with a deterministic \
    rule-based fallback), persists results in SQLite, and answers questions about stored documents."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/plaindoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents and chat_sessions
    /// tables. Idempotent — running it multiple times is safe.
    Init,

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// upload, simplify, chat, and retrieval endpoints.
    Serve,

    /// Print a summary of stored documents.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("plaindoc=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
