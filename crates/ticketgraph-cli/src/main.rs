//! ticketgraph CLI - index ticket contract logs and query the projection

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticketgraph::IndexerConfig;

mod commands;

#[derive(Parser)]
#[command(name = "ticketgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "./ticketgraph.db")]
    db_path: PathBuf,

    /// Indexer configuration (JSON). Defaults to TICKETGRAPH_* environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index logs from a JSON-lines file
    Ingest {
        /// File of decoded or raw logs, one per line
        file: PathBuf,

        /// Keep reading as the file grows (Ctrl+C to stop)
        #[arg(short, long)]
        follow: bool,

        /// Accept EventCreated from this factory (repeatable, adds to the config)
        #[arg(long)]
        factory: Vec<Address>,
    },

    /// Indexer cursor and table sizes
    Status,

    /// Show one event by its contract address
    Event { address: Address },

    /// List events, newest first
    Events {
        #[arg(long)]
        organizer: Option<Address>,
    },

    /// List tickets of an event or of a holder
    Tickets {
        /// Event contract address
        #[arg(long, required_unless_present = "owner")]
        event: Option<Address>,

        /// Ticket holder
        #[arg(long)]
        owner: Option<Address>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<IndexerConfig> {
    match path {
        Some(path) => IndexerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => IndexerConfig::from_env().context("Invalid TICKETGRAPH_* environment"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Execute command
    match cli.command {
        Commands::Ingest {
            file,
            follow,
            factory,
        } => {
            let config = factory
                .into_iter()
                .fold(load_config(cli.config.as_ref())?, |config, factory| {
                    config.with_factory(factory)
                });
            commands::ingest::execute(cli.db_path, config, file, follow)?;
        }
        Commands::Status => {
            commands::status::execute(cli.db_path)?;
        }
        Commands::Event { address } => {
            commands::query::event(cli.db_path, address)?;
        }
        Commands::Events { organizer } => {
            commands::query::events(cli.db_path, organizer)?;
        }
        Commands::Tickets { event, owner } => {
            commands::query::tickets(cli.db_path, event, owner)?;
        }
    }

    Ok(())
}
