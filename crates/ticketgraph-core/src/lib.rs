//! ticketgraph core: types and traits for the ticket event projection
//!
//! This crate defines the abstractions shared by the projection engine and
//! its storage backends:
//! - Typed chain logs (`EventCreated`, `Transfer`, `TicketCheckedIn`) and
//!   their total order (`LogPosition`)
//! - The projected entities (`Event`, `Ticket`) and their canonical keys
//! - Entity store traits: per-log transactions, cursor, registered sources
//! - The source registration hook offered by the host
//! - An in-memory store for tests and one-off replays

pub mod config;
pub mod error;
pub mod memory;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{ErrorPolicy, IndexerConfig, StoreConfig, SynchronousMode};
pub use error::{Result, TicketgraphError};
pub use memory::{MemoryEntityStore, MemoryTxn, Snapshot};
pub use traits::{EntityStore, EntityTxn, SourceRegistrar};
pub use types::{
    event_id, ticket_id, BlockMeta, ChainLog, DataSource, Event, EventCreated, LogKind,
    LogPosition, Ticket, TicketCheckedIn, Transfer,
};
