use crate::rows;
use rusqlite::Connection;
use std::sync::MutexGuard;
use ticketgraph_core::{
    error::{Result, TicketgraphError},
    DataSource, EntityTxn, Event, LogPosition, Ticket,
};

/// Entity transaction holding the store's connection for its whole lifetime
///
/// Rolls back on drop unless committed.
pub struct SqliteEntityTxn<'a> {
    conn: MutexGuard<'a, Connection>,
    in_txn: bool,
}

impl<'a> SqliteEntityTxn<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Result<Self> {
        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])
            .map_err(|e| TicketgraphError::Store(e.to_string()))?;

        Ok(Self { conn, in_txn: true })
    }
}

impl<'a> EntityTxn for SqliteEntityTxn<'a> {
    fn get_event(&self, id: &str) -> Result<Option<Event>> {
        rows::get_event(&self.conn, id)
    }

    fn put_event(&mut self, event: &Event) -> Result<()> {
        rows::put_event(&self.conn, event)
    }

    fn get_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        rows::get_ticket(&self.conn, id)
    }

    fn put_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        rows::put_ticket(&self.conn, ticket)
    }

    fn count_tickets_for_event(&self, event_id: &str) -> Result<u64> {
        rows::count_tickets_for_event(&self.conn, event_id)
    }

    fn put_source(&mut self, source: &DataSource) -> Result<()> {
        rows::put_source(&self.conn, source)
    }

    fn commit(mut self, cursor: LogPosition) -> Result<()> {
        if self.in_txn {
            rows::set_cursor(&self.conn, cursor)?;

            self.conn
                .execute("COMMIT", [])
                .map_err(|e| TicketgraphError::Store(e.to_string()))?;

            self.in_txn = false;
        }
        Ok(())
    }

    fn rollback(mut self) {
        if self.in_txn {
            let _ = self.conn.execute("ROLLBACK", []);
            self.in_txn = false;
        }
    }
}

impl<'a> Drop for SqliteEntityTxn<'a> {
    fn drop(&mut self) {
        if self.in_txn {
            let _ = self.conn.execute("ROLLBACK", []);
        }
    }
}
