use rusqlite::Connection;
use ticketgraph_core::error::{Result, TicketgraphError};

/// Schema version written by this crate
pub const SCHEMA_VERSION: u32 = 1;

/// Create the entity tables and the indexer metadata row if missing
///
/// Fails if the database was written by a newer schema version.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS indexer_meta (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            cursor_block INTEGER,
            cursor_log_index INTEGER,
            schema_version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            organizer TEXT NOT NULL,
            metadata_cid TEXT NOT NULL,
            ticket_price TEXT NOT NULL,
            ticket_supply TEXT NOT NULL,
            total_tickets_sold TEXT NOT NULL,
            created_at_timestamp INTEGER NOT NULL,
            created_at_block_number INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_organizer ON events(organizer);

        CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            token_id TEXT NOT NULL,
            owner TEXT NOT NULL,
            event TEXT NOT NULL,
            is_checked_in INTEGER NOT NULL DEFAULT 0,
            minted_at_timestamp INTEGER NOT NULL,
            minted_at_block_number INTEGER NOT NULL,
            check_in_timestamp INTEGER,
            last_transfer_block INTEGER NOT NULL,
            last_transfer_log_index INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tickets_event ON tickets(event);
        CREATE INDEX IF NOT EXISTS idx_tickets_owner ON tickets(owner);

        CREATE TABLE IF NOT EXISTS data_sources (
            address TEXT PRIMARY KEY,
            registered_block INTEGER NOT NULL,
            registered_log_index INTEGER NOT NULL
        );",
    )
    .map_err(|e| TicketgraphError::Store(e.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO indexer_meta (id, cursor_block, cursor_log_index, schema_version, updated_at)
         VALUES (0, NULL, NULL, ?1, ?2)",
        rusqlite::params![SCHEMA_VERSION as i64, chrono::Utc::now().to_rfc3339()],
    )
    .map_err(|e| TicketgraphError::Store(e.to_string()))?;

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(TicketgraphError::InvalidState(format!(
            "Database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Schema version recorded in the metadata row
pub fn schema_version(conn: &Connection) -> Result<u32> {
    conn.query_row(
        "SELECT schema_version FROM indexer_meta WHERE id = 0",
        [],
        |row| {
            let v: i64 = row.get(0)?;
            Ok(v as u32)
        },
    )
    .map_err(|e| TicketgraphError::Store(e.to_string()))
}
