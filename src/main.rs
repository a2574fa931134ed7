//! # ragserve CLI
//!
//! Commands for store initialization, document ingestion, health
//! inspection, and serving the HTTP endpoint.
//!
//! ## Usage
//!
//! ```bash
//! ragserve --config ./config/ragserve.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragserve init` | Create the SQLite store and run schema migrations |
//! | `ragserve ingest` | Scan the documents directory and persist new chunks |
//! | `ragserve stats` | Show store and documents-directory health |
//! | `ragserve serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragserve::{config, db, ingest, migrate, server, stats};

/// ragserve — a PDF question-answering service with incremental chunk
/// ingestion.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ragserve.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ragserve",
    about = "A PDF question-answering service with incremental chunk ingestion",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragserve.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store schema.
    ///
    /// Creates the SQLite database file and all required tables.
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Ingest the documents directory.
    ///
    /// Loads every matching document, splits it into chunks, assigns
    /// stable identifiers, and persists only the chunks not already in
    /// the store. Re-running over an unchanged directory adds nothing.
    Ingest {
        /// Show document and chunk counts without writing to the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of documents to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show store and documents-directory health.
    Stats,

    /// Start the HTTP server.
    ///
    /// Exposes `POST /rag-response`, `POST /ingest`, and `GET /health`
    /// on the configured bind address.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Store initialized successfully.");
        }
        Commands::Ingest { dry_run, limit } => {
            ingest::run_ingest_cmd(&cfg, dry_run, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
