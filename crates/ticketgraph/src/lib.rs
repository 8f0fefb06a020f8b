//! ticketgraph: an event projection for NFT ticketing contracts
//!
//! ticketgraph turns the logs of an event factory and the ticket contracts it
//! deploys into two queryable tables:
//! - **Events**: one row per event contract, with its sold-ticket counter
//! - **Tickets**: one row per token, with its owner and check-in state
//!
//! The pieces:
//! - **ABI decoding**: raw `eth_getLogs` output into typed logs
//! - **Projection engine**: stateless handlers, idempotent under replay
//! - **Data-source registry**: factory filter plus contracts registered at runtime
//! - **Indexer**: cursor-tracked, one store transaction per log
//!
//! # Quick Start
//!
//! ```no_run
//! use ticketgraph::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let store = Arc::new(SqliteEntityStore::open(StoreConfig::new("./ticketgraph.db".into()))?);
//! let config = IndexerConfig::from_env()?;
//! let mut indexer = Indexer::new(store.clone(), config)?;
//!
//! let mut source = JsonLinesSource::open("./logs.jsonl")?;
//! indexer.run_until_caught_up(&mut source)?;
//!
//! for event in store.events()? {
//!     println!("{} sold {}", event.id, event.total_tickets_sold);
//! }
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod engine;
pub mod indexer;
pub mod log_format;
pub mod prelude;
pub mod sources;

// Re-export core types
pub use ticketgraph_core::{
    config::{ErrorPolicy, IndexerConfig, StoreConfig, SynchronousMode},
    error::{Result, TicketgraphError},
    traits::{EntityStore, EntityTxn, SourceRegistrar},
    types::{
        event_id, ticket_id, BlockMeta, ChainLog, DataSource, Event, EventCreated, LogKind,
        LogPosition, Ticket, TicketCheckedIn, Transfer,
    },
    MemoryEntityStore, Snapshot,
};

// Re-export implementations
pub use ticketgraph_sqlite::SqliteEntityStore;

// Re-export main types from this crate
pub use abi::{decode_log, RawLog};
pub use engine::{ApplyOutcome, HostEffect, ProjectionEngine, SkipReason};
pub use indexer::{Indexer, IndexerStats, LogDisposition, ShutdownHandle};
pub use log_format::{IterSource, JsonLinesSource, LogRecord, LogSource};
pub use sources::DataSourceRegistry;
