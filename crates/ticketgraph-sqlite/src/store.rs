use crate::rows::{self, address_text, EVENT_COLUMNS, TICKET_COLUMNS};
use crate::schema;
use crate::txn::SqliteEntityTxn;
use alloy_primitives::Address;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::{Arc, Mutex, MutexGuard};
use ticketgraph_core::{
    config::SynchronousMode,
    error::{Result, TicketgraphError},
    DataSource, EntityStore, Event, LogPosition, StoreConfig, Ticket,
};

/// SQLite-backed entity store
pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteEntityStore {
    /// Open (or create) the store described by `cfg`
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = cfg.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &cfg.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| TicketgraphError::Store(e.to_string()))?;

        Self::configure_connection(&conn, &cfg)?;
        schema::init(&conn)?;

        tracing::debug!("Opened entity store at {}", cfg.path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: cfg,
        })
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketgraphError::Store(e.to_string()))?;
        schema::init(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: StoreConfig::new(":memory:".into()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the underlying connection (for custom queries)
    pub fn conn(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<u32> {
        schema::schema_version(&*self.lock()?)
    }

    fn configure_connection(conn: &Connection, cfg: &StoreConfig) -> Result<()> {
        if cfg.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| TicketgraphError::Config(e.to_string()))?;
        }

        let sync_mode = match cfg.synchronous {
            SynchronousMode::Full => "FULL",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Off => "OFF",
        };
        conn.pragma_update(None, "synchronous", sync_mode)
            .map_err(|e| TicketgraphError::Config(e.to_string()))?;

        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(|e| TicketgraphError::Config(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TicketgraphError::Store("connection mutex poisoned".into()))
    }
}

impl EntityStore for SqliteEntityStore {
    type Txn<'a> = SqliteEntityTxn<'a>;

    fn begin_txn(&self) -> Result<Self::Txn<'_>> {
        SqliteEntityTxn::new(self.lock()?)
    }

    fn get_cursor(&self) -> Result<Option<LogPosition>> {
        rows::get_cursor(&*self.lock()?)
    }

    fn sources(&self) -> Result<Vec<DataSource>> {
        rows::sources(&*self.lock()?)
    }

    fn event(&self, id: &str) -> Result<Option<Event>> {
        rows::get_event(&*self.lock()?, id)
    }

    fn ticket(&self, id: &str) -> Result<Option<Ticket>> {
        rows::get_ticket(&*self.lock()?, id)
    }

    fn events(&self) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events ORDER BY created_at_timestamp DESC, id ASC",
            EVENT_COLUMNS
        );
        rows::query_events(&*self.lock()?, &sql, [])
    }

    fn events_by_organizer(&self, organizer: Address) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events WHERE organizer = ?1
             ORDER BY created_at_timestamp DESC, id ASC",
            EVENT_COLUMNS
        );
        rows::query_events(&*self.lock()?, &sql, [address_text(organizer)])
    }

    fn tickets_for_event(&self, event_id: &str) -> Result<Vec<Ticket>> {
        let sql = format!("SELECT {} FROM tickets WHERE event = ?1", TICKET_COLUMNS);
        let mut tickets = rows::query_tickets(&*self.lock()?, &sql, [event_id])?;
        // token_id is stored as decimal text, so order numerically here
        tickets.sort_by(|a, b| a.token_id.cmp(&b.token_id));
        Ok(tickets)
    }

    fn tickets_by_owner(&self, owner: Address, event_id: Option<&str>) -> Result<Vec<Ticket>> {
        let conn = self.lock()?;
        let owner = address_text(owner);
        match event_id {
            Some(event_id) => {
                let sql = format!(
                    "SELECT {} FROM tickets WHERE owner = ?1 AND event = ?2 ORDER BY id",
                    TICKET_COLUMNS
                );
                rows::query_tickets(&conn, &sql, params![owner, event_id])
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM tickets WHERE owner = ?1 ORDER BY id",
                    TICKET_COLUMNS
                );
                rows::query_tickets(&conn, &sql, [owner])
            }
        }
    }
}
