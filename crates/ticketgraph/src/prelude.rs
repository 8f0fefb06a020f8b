//! ticketgraph prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use ticketgraph::prelude::*;
//! ```

// Core types
pub use crate::{
    BlockMeta, ChainLog, DataSource, Event, EventCreated, LogKind, LogPosition, Result, Ticket,
    TicketCheckedIn, TicketgraphError, Transfer,
};

// Configs
pub use crate::{ErrorPolicy, IndexerConfig, StoreConfig, SynchronousMode};

// Traits
pub use crate::{EntityStore, EntityTxn, LogSource, SourceRegistrar};

// Implementations
pub use crate::{MemoryEntityStore, SqliteEntityStore};

// Projection and indexing
pub use crate::{
    ApplyOutcome, DataSourceRegistry, HostEffect, Indexer, IndexerStats, LogDisposition,
    ProjectionEngine, ShutdownHandle, SkipReason,
};

// Log input
pub use crate::{IterSource, JsonLinesSource, LogRecord, RawLog};

// Re-export common external deps
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
