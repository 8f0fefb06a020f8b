//! Optional metrics instrumentation.
//!
//! When the `observe` feature is enabled, the indexer emits counters and
//! histograms via the [`metrics`] crate. A downstream application must install
//! a metrics recorder (e.g. `metrics-exporter-prometheus`) to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record a log applied to the entity tables.
///
/// - `ticketgraph.logs.applied_total` – counter with `kind` label
#[inline]
pub fn record_log_applied(kind: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ticketgraph.logs.applied_total", "kind" => kind).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = kind;
    }
}

/// Record a log the projection skipped (missing parent, duplicate, replay...).
///
/// - `ticketgraph.logs.skipped_total` – counter with `reason` label
#[inline]
pub fn record_log_skipped(reason: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ticketgraph.logs.skipped_total", "reason" => reason).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = reason;
    }
}

/// Record a newly registered data source.
///
/// - `ticketgraph.sources.registered_total` – counter
#[inline]
pub fn record_source_registered() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ticketgraph.sources.registered_total").increment(1);
    }
}

/// Record an indexer batch (counter + duration + logs processed).
///
/// - `ticketgraph.indexer.batches_total` – counter
/// - `ticketgraph.indexer.batch_duration_seconds` – histogram
/// - `ticketgraph.indexer.logs_processed_total` – counter
#[inline]
pub fn record_batch(duration: std::time::Duration, logs_processed: u64) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ticketgraph.indexer.batches_total").increment(1);
        metrics::histogram!("ticketgraph.indexer.batch_duration_seconds")
            .record(duration.as_secs_f64());
        metrics::counter!("ticketgraph.indexer.logs_processed_total").increment(logs_processed);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, logs_processed);
    }
}
