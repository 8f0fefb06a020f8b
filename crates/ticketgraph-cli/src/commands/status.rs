//! Status command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;
use ticketgraph::prelude::*;

pub fn execute(db_path: PathBuf) -> Result<()> {
    tracing::info!("Checking database status: {}", db_path.display());

    let store = super::open_store(&db_path)?;

    println!("\nIndexer Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", db_path.display());

    let schema_version = store
        .schema_version()
        .context("Failed to get schema version")?;
    println!("Schema Version: {}", schema_version);

    let cursor = store.get_cursor().context("Failed to get cursor")?;
    match cursor {
        Some(cursor) => println!("Last Applied Log: {}", cursor),
        None => println!("Last Applied Log: none"),
    }

    let sources = store.sources().context("Failed to list data sources")?;
    println!("\nRegistered Event Contracts: {}", sources.len());
    for source in &sources {
        println!("  {} (since {})", source.address, source.registered_at);
    }

    let events = store.events().context("Failed to list events")?;
    let tickets: usize = events
        .iter()
        .map(|event| store.tickets_for_event(&event.id).map(|t| t.len()))
        .sum::<ticketgraph::Result<usize>>()
        .context("Failed to count tickets")?;
    println!("\nEvents: {}", events.len());
    println!("Tickets: {}", tickets);

    if cursor.is_none() {
        println!("\nRun 'ticketgraph ingest <file>' to index logs");
    }

    Ok(())
}
