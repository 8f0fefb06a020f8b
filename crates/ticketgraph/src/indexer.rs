//! Indexer: drives logs through the projection engine
//!
//! The indexer is the host of the projection. For every log it
//! - filters logs through the [`DataSourceRegistry`]
//! - applies the log in one store transaction, persisting any newly
//!   registered source and the cursor with it
//! - honours the engine's `RegisterSource` effects in the live registry
//!
//! Logs are applied strictly one after another; a restarted indexer picks up
//! its cursor and registered sources from the store.
//!
//! The cursor is the highest position offered to the projection. It does not
//! filter: a log at or before it still reaches the engine, whose handlers are
//! idempotent. A replayed log is a no-op, and a mint replayed after the
//! transfers that depend on it makes those transfers applicable again.

use crate::engine::{ApplyOutcome, HostEffect, ProjectionEngine, SkipReason};
use crate::log_format::LogSource;
use crate::sources::DataSourceRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ticketgraph_core::{
    error::Result, observe, ChainLog, DataSource, EntityStore, EntityTxn, ErrorPolicy,
    IndexerConfig, LogPosition, SourceRegistrar,
};

/// What happened to one log offered to the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDisposition {
    /// Applied and committed
    Applied,
    /// Accepted, but the projection left the tables unchanged
    Skipped(SkipReason),
    /// Below the configured start block
    BeforeStartBlock,
    /// Emitted by a contract the indexer does not listen to
    UnknownSource,
    /// Failed and skipped under [`ErrorPolicy::LogAndSkip`]
    Failed,
}

/// Counters for a run of the indexer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerStats {
    pub logs_seen: u64,
    pub applied: u64,
    pub skipped: u64,
    pub ignored: u64,
    pub failed: u64,
    pub duration: Duration,
}

impl IndexerStats {
    pub fn empty() -> Self {
        Self::default()
    }

    fn record(&mut self, disposition: LogDisposition) {
        self.logs_seen += 1;
        match disposition {
            LogDisposition::Applied => self.applied += 1,
            LogDisposition::Skipped(_) => self.skipped += 1,
            LogDisposition::BeforeStartBlock | LogDisposition::UnknownSource => {
                self.ignored += 1
            }
            LogDisposition::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: &IndexerStats) {
        self.logs_seen += other.logs_seen;
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.ignored += other.ignored;
        self.failed += other.failed;
        self.duration += other.duration;
    }
}

pub struct Indexer<S: EntityStore> {
    store: Arc<S>,
    engine: ProjectionEngine,
    registry: DataSourceRegistry,
    config: IndexerConfig,
    cursor: Option<LogPosition>,
    shutdown: Arc<AtomicBool>,
}

impl<S: EntityStore> Indexer<S> {
    /// Create an indexer over `store`, resuming from its cursor and sources
    pub fn new(store: Arc<S>, config: IndexerConfig) -> Result<Self> {
        config.validate()?;

        let cursor = store.get_cursor()?;
        let mut registry = DataSourceRegistry::from_config(&config);
        registry.restore(store.sources()?);

        match cursor {
            Some(cursor) => tracing::info!(
                "Resuming indexer at {} with {} registered event contracts",
                cursor,
                registry.len()
            ),
            None => tracing::info!("Starting indexer from block {}", config.start_block),
        }

        Ok(Self {
            store,
            engine: ProjectionEngine::new(),
            registry,
            config,
            cursor,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Offer one log to the projection
    pub fn process_log(&mut self, log: &ChainLog) -> Result<LogDisposition> {
        let position = log.position();

        if log.block.number < self.config.start_block {
            return Ok(LogDisposition::BeforeStartBlock);
        }

        if !self.registry.accepts(log) {
            tracing::debug!(
                "Ignoring {} from unregistered contract {} at {}",
                log.kind.name(),
                log.address,
                position
            );
            observe::record_log_skipped("unknown_source");
            return Ok(LogDisposition::UnknownSource);
        }

        match self.apply(log) {
            Ok(ApplyOutcome::Applied { .. }) => {
                observe::record_log_applied(log.kind.name());
                Ok(LogDisposition::Applied)
            }
            Ok(ApplyOutcome::Skipped { reason, .. }) => {
                observe::record_log_skipped(reason.as_str());
                Ok(LogDisposition::Skipped(reason))
            }
            Err(e) => match self.config.error_policy {
                ErrorPolicy::FailFast => {
                    tracing::error!("Failed to apply {} at {}: {}", log.kind.name(), position, e);
                    Err(e)
                }
                ErrorPolicy::LogAndSkip => {
                    tracing::error!(
                        "Skipping {} at {} after error: {}",
                        log.kind.name(),
                        position,
                        e
                    );
                    self.advance_to(position)?;
                    observe::record_log_skipped("failed");
                    Ok(LogDisposition::Failed)
                }
            },
        }
    }

    /// Apply one accepted log in its own transaction
    fn apply(&mut self, log: &ChainLog) -> Result<ApplyOutcome> {
        let cursor = self.next_cursor(log.position());
        let mut txn = self.store.begin_txn()?;

        let outcome = self.engine.apply(&mut txn, log)?;
        for effect in outcome.effects() {
            match effect {
                HostEffect::RegisterSource(source) => txn.put_source(source)?,
            }
        }
        txn.commit(cursor)?;
        self.cursor = Some(cursor);

        // Committed: the live registry may now follow the store
        for effect in outcome.effects() {
            match effect {
                HostEffect::RegisterSource(source) => {
                    self.registry.register_source(*source);
                }
            }
        }

        Ok(outcome)
    }

    /// Move the cursor past a log without applying it
    fn advance_to(&mut self, position: LogPosition) -> Result<()> {
        let cursor = self.next_cursor(position);
        let txn = self.store.begin_txn()?;
        txn.commit(cursor)?;
        self.cursor = Some(cursor);
        Ok(())
    }

    /// The cursor never moves backwards when an older log is replayed
    fn next_cursor(&self, position: LogPosition) -> LogPosition {
        self.cursor.map_or(position, |cursor| cursor.max(position))
    }

    pub fn process_logs<'a>(
        &mut self,
        logs: impl IntoIterator<Item = &'a ChainLog>,
    ) -> Result<IndexerStats> {
        let start = Instant::now();
        let mut stats = IndexerStats::empty();
        for log in logs {
            let disposition = self.process_log(log)?;
            stats.record(disposition);
        }
        stats.duration = start.elapsed();
        Ok(stats)
    }

    /// Pull one batch from `source` and process it
    pub fn process_batch<L: LogSource + ?Sized>(&mut self, source: &mut L) -> Result<IndexerStats> {
        let logs = source.next_batch(self.config.batch_logs_max)?;
        if logs.is_empty() {
            return Ok(IndexerStats::empty());
        }

        let stats = self.process_logs(&logs)?;
        observe::record_batch(stats.duration, stats.logs_seen);

        tracing::debug!(
            "Processed {} logs ({} applied, {} skipped, {} ignored) in {:?}",
            stats.logs_seen,
            stats.applied,
            stats.skipped,
            stats.ignored,
            stats.duration
        );
        Ok(stats)
    }

    /// Process batches until `source` has nothing more to offer right now
    pub fn run_until_caught_up<L: LogSource + ?Sized>(
        &mut self,
        source: &mut L,
    ) -> Result<IndexerStats> {
        let mut total = IndexerStats::empty();
        while !self.shutdown.load(Ordering::SeqCst) {
            let stats = self.process_batch(source)?;
            if stats.logs_seen == 0 {
                break;
            }
            total.merge(&stats);
        }
        Ok(total)
    }

    /// Run until shutdown is signalled or `source` is exhausted
    ///
    /// Sleeps `poll_interval_ms` whenever the source has no new logs.
    pub async fn run<L: LogSource + ?Sized>(&mut self, source: &mut L) -> Result<IndexerStats> {
        tracing::info!("Indexer started");
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut total = IndexerStats::empty();

        while !self.shutdown.load(Ordering::SeqCst) {
            let stats = self.process_batch(source)?;
            total.merge(&stats);

            if stats.logs_seen == 0 {
                if source.is_exhausted() {
                    tracing::info!("Log source exhausted");
                    break;
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        tracing::info!(
            "Indexer stopped ({} logs applied, cursor: {})",
            total.applied,
            self.cursor
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".into())
        );
        Ok(total)
    }

    /// Signal graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Get a handle for shutting down the indexer from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Highest position applied so far
    pub fn cursor(&self) -> Option<LogPosition> {
        self.cursor
    }

    pub fn sources(&self) -> Vec<DataSource> {
        self.registry.sources()
    }

    pub fn registry(&self) -> &DataSourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }
}

/// Handle for shutting down an indexer
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}
