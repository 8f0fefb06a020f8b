use crate::error::Result;
use crate::types::{DataSource, Event, LogPosition, Ticket};
use alloy_primitives::Address;

/// Transaction over the entity tables
///
/// One transaction covers exactly one applied log: the handler's reads and
/// writes plus the cursor advance commit together or not at all.
///
/// Note: Not required to be Send, as the SQLite transaction holds a mutex guard
pub trait EntityTxn {
    fn get_event(&self, id: &str) -> Result<Option<Event>>;

    /// Insert or replace an `Event` row keyed by `event.id`
    fn put_event(&mut self, event: &Event) -> Result<()>;

    fn get_ticket(&self, id: &str) -> Result<Option<Ticket>>;

    /// Insert or replace a `Ticket` row keyed by `ticket.id`
    fn put_ticket(&mut self, ticket: &Ticket) -> Result<()>;

    /// Number of tickets whose `event` references `event_id`
    fn count_tickets_for_event(&self, event_id: &str) -> Result<u64>;

    /// Record a dynamic data source; registering a known address is a no-op
    fn put_source(&mut self, source: &DataSource) -> Result<()>;

    /// Commit all writes and move the cursor to `cursor`
    fn commit(self, cursor: LogPosition) -> Result<()>;

    /// Discard all writes
    fn rollback(self);
}

/// Entity store: the queryable `Event`/`Ticket` tables plus indexing state
///
/// Provides:
/// - Transactional per-log application
/// - Cursor tracking (last applied log position)
/// - Persistence of dynamically registered data sources
/// - The read paths used by presentation layers
pub trait EntityStore: Send + Sync {
    type Txn<'a>: EntityTxn
    where
        Self: 'a;

    /// Begin a write transaction
    fn begin_txn(&self) -> Result<Self::Txn<'_>>;

    /// Position of the last applied log, `None` before the first one
    fn get_cursor(&self) -> Result<Option<LogPosition>>;

    /// All registered dynamic data sources, in registration order
    fn sources(&self) -> Result<Vec<DataSource>>;

    fn event(&self, id: &str) -> Result<Option<Event>>;

    fn ticket(&self, id: &str) -> Result<Option<Ticket>>;

    /// All events, newest `created_at_timestamp` first
    fn events(&self) -> Result<Vec<Event>>;

    /// Events created by `organizer`, newest first
    fn events_by_organizer(&self, organizer: Address) -> Result<Vec<Event>>;

    /// Tickets of one event, ascending `token_id`
    fn tickets_for_event(&self, event_id: &str) -> Result<Vec<Ticket>>;

    /// Tickets held by `owner`, optionally restricted to one event
    fn tickets_by_owner(&self, owner: Address, event_id: Option<&str>) -> Result<Vec<Ticket>>;
}
