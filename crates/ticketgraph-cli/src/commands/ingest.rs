//! Ingest command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;
use ticketgraph::prelude::*;

pub fn execute(db_path: PathBuf, config: IndexerConfig, file: PathBuf, follow: bool) -> Result<()> {
    let store = super::open_store(&db_path)?;
    let mut indexer = Indexer::new(store, config).context("Failed to start indexer")?;
    let mut source = JsonLinesSource::open(&file)
        .with_context(|| format!("Failed to open {}", file.display()))?
        .with_follow(follow);

    let stats = if follow {
        println!("Following {}... (Press Ctrl+C to stop)", file.display());

        let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
        let shutdown = indexer.shutdown_handle();
        runtime.block_on(async {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown requested");
                    shutdown.shutdown();
                }
            });
            indexer.run(&mut source).await
        })
    } else {
        indexer.run_until_caught_up(&mut source)
    }
    .context("Indexing failed")?;

    println!(
        "✓ Processed {} logs in {:?}: {} applied, {} skipped, {} ignored, {} failed",
        stats.logs_seen, stats.duration, stats.applied, stats.skipped, stats.ignored, stats.failed
    );
    match indexer.cursor() {
        Some(cursor) => println!("Cursor: {}", cursor),
        None => println!("No logs applied yet"),
    }

    Ok(())
}
