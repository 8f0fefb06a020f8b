//! SQLite-backed entity store
//!
//! Holds the queryable `events` and `tickets` tables together with the
//! indexer's cursor and the registered data sources, so a restarted indexer
//! resumes exactly where it stopped.
//!
//! Key features:
//! - One SQL transaction per applied log (entity writes + cursor)
//! - WAL mode for readers alongside the single writer
//! - Indexed read paths for the presentation layer

mod rows;
pub mod schema;
pub mod store;
pub mod txn;

pub use store::SqliteEntityStore;
pub use txn::SqliteEntityTxn;
