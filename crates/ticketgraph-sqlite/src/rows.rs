//! Row mapping between the entity types and their SQL columns
//!
//! Addresses are stored as lowercase hex, `U256` values as decimal text and
//! block numbers, timestamps and log indices as INTEGER.

use alloy_primitives::{hex, Address, U256};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::str::FromStr;
use ticketgraph_core::{
    error::{Result, TicketgraphError},
    DataSource, Event, LogPosition, Ticket,
};

pub(crate) const EVENT_COLUMNS: &str = "id, organizer, metadata_cid, ticket_price, ticket_supply, \
     total_tickets_sold, created_at_timestamp, created_at_block_number";

pub(crate) const TICKET_COLUMNS: &str = "id, token_id, owner, event, is_checked_in, \
     minted_at_timestamp, minted_at_block_number, check_in_timestamp, \
     last_transfer_block, last_transfer_log_index";

pub(crate) fn address_text(address: Address) -> String {
    hex::encode_prefixed(address)
}

fn store_err(e: rusqlite::Error) -> TicketgraphError {
    TicketgraphError::Store(e.to_string())
}

fn parse_address(column: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw)
        .map_err(|e| TicketgraphError::Store(format!("Invalid {} {:?}: {}", column, raw, e)))
}

fn parse_u256(column: &str, raw: &str) -> Result<U256> {
    U256::from_str(raw)
        .map_err(|e| TicketgraphError::Store(format!("Invalid {} {:?}: {}", column, raw, e)))
}

struct EventRow {
    id: String,
    organizer: String,
    metadata_cid: String,
    ticket_price: String,
    ticket_supply: String,
    total_tickets_sold: String,
    created_at_timestamp: i64,
    created_at_block_number: i64,
}

impl EventRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            organizer: row.get(1)?,
            metadata_cid: row.get(2)?,
            ticket_price: row.get(3)?,
            ticket_supply: row.get(4)?,
            total_tickets_sold: row.get(5)?,
            created_at_timestamp: row.get(6)?,
            created_at_block_number: row.get(7)?,
        })
    }

    fn into_event(self) -> Result<Event> {
        Ok(Event {
            organizer: parse_address("organizer", &self.organizer)?,
            ticket_price: parse_u256("ticket_price", &self.ticket_price)?,
            ticket_supply: parse_u256("ticket_supply", &self.ticket_supply)?,
            total_tickets_sold: parse_u256("total_tickets_sold", &self.total_tickets_sold)?,
            id: self.id,
            metadata_cid: self.metadata_cid,
            created_at_timestamp: self.created_at_timestamp as u64,
            created_at_block_number: self.created_at_block_number as u64,
        })
    }
}

struct TicketRow {
    id: String,
    token_id: String,
    owner: String,
    event: String,
    is_checked_in: bool,
    minted_at_timestamp: i64,
    minted_at_block_number: i64,
    check_in_timestamp: Option<i64>,
    last_transfer_block: i64,
    last_transfer_log_index: i64,
}

impl TicketRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            token_id: row.get(1)?,
            owner: row.get(2)?,
            event: row.get(3)?,
            is_checked_in: row.get(4)?,
            minted_at_timestamp: row.get(5)?,
            minted_at_block_number: row.get(6)?,
            check_in_timestamp: row.get(7)?,
            last_transfer_block: row.get(8)?,
            last_transfer_log_index: row.get(9)?,
        })
    }

    fn into_ticket(self) -> Result<Ticket> {
        Ok(Ticket {
            token_id: parse_u256("token_id", &self.token_id)?,
            owner: parse_address("owner", &self.owner)?,
            id: self.id,
            event: self.event,
            is_checked_in: self.is_checked_in,
            minted_at_timestamp: self.minted_at_timestamp as u64,
            minted_at_block_number: self.minted_at_block_number as u64,
            check_in_timestamp: self.check_in_timestamp.map(|t| t as u64),
            last_transfer: LogPosition::new(
                self.last_transfer_block as u64,
                self.last_transfer_log_index as u64,
            ),
        })
    }
}

pub(crate) fn query_events<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(sql).map_err(store_err)?;
    let rows = stmt
        .query_map(params, EventRow::read)
        .map_err(store_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(store_err)?;
    rows.into_iter().map(EventRow::into_event).collect()
}

pub(crate) fn query_tickets<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(sql).map_err(store_err)?;
    let rows = stmt
        .query_map(params, TicketRow::read)
        .map_err(store_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(store_err)?;
    rows.into_iter().map(TicketRow::into_ticket).collect()
}

pub(crate) fn get_event(conn: &Connection, id: &str) -> Result<Option<Event>> {
    let sql = format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS);
    conn.query_row(&sql, [id], EventRow::read)
        .optional()
        .map_err(store_err)?
        .map(EventRow::into_event)
        .transpose()
}

pub(crate) fn get_ticket(conn: &Connection, id: &str) -> Result<Option<Ticket>> {
    let sql = format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS);
    conn.query_row(&sql, [id], TicketRow::read)
        .optional()
        .map_err(store_err)?
        .map(TicketRow::into_ticket)
        .transpose()
}

pub(crate) fn put_event(conn: &Connection, event: &Event) -> Result<()> {
    conn.execute(
        "INSERT INTO events (id, organizer, metadata_cid, ticket_price, ticket_supply,
                             total_tickets_sold, created_at_timestamp, created_at_block_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             organizer = excluded.organizer,
             metadata_cid = excluded.metadata_cid,
             ticket_price = excluded.ticket_price,
             ticket_supply = excluded.ticket_supply,
             total_tickets_sold = excluded.total_tickets_sold,
             created_at_timestamp = excluded.created_at_timestamp,
             created_at_block_number = excluded.created_at_block_number",
        params![
            event.id,
            address_text(event.organizer),
            event.metadata_cid,
            event.ticket_price.to_string(),
            event.ticket_supply.to_string(),
            event.total_tickets_sold.to_string(),
            event.created_at_timestamp as i64,
            event.created_at_block_number as i64,
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

pub(crate) fn put_ticket(conn: &Connection, ticket: &Ticket) -> Result<()> {
    conn.execute(
        "INSERT INTO tickets (id, token_id, owner, event, is_checked_in, minted_at_timestamp,
                              minted_at_block_number, check_in_timestamp,
                              last_transfer_block, last_transfer_log_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
             token_id = excluded.token_id,
             owner = excluded.owner,
             event = excluded.event,
             is_checked_in = excluded.is_checked_in,
             minted_at_timestamp = excluded.minted_at_timestamp,
             minted_at_block_number = excluded.minted_at_block_number,
             check_in_timestamp = excluded.check_in_timestamp,
             last_transfer_block = excluded.last_transfer_block,
             last_transfer_log_index = excluded.last_transfer_log_index",
        params![
            ticket.id,
            ticket.token_id.to_string(),
            address_text(ticket.owner),
            ticket.event,
            ticket.is_checked_in,
            ticket.minted_at_timestamp as i64,
            ticket.minted_at_block_number as i64,
            ticket.check_in_timestamp.map(|t| t as i64),
            ticket.last_transfer.block_number as i64,
            ticket.last_transfer.log_index as i64,
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

pub(crate) fn count_tickets_for_event(conn: &Connection, event_id: &str) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM tickets WHERE event = ?1",
        [event_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(store_err)
}

pub(crate) fn put_source(conn: &Connection, source: &DataSource) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO data_sources (address, registered_block, registered_log_index)
         VALUES (?1, ?2, ?3)",
        params![
            address_text(source.address),
            source.registered_at.block_number as i64,
            source.registered_at.log_index as i64,
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

pub(crate) fn sources(conn: &Connection) -> Result<Vec<DataSource>> {
    let mut stmt = conn
        .prepare(
            "SELECT address, registered_block, registered_log_index
             FROM data_sources ORDER BY rowid",
        )
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .map_err(store_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(store_err)?;

    rows.into_iter()
        .map(|(address, block, index)| {
            Ok(DataSource {
                address: parse_address("address", &address)?,
                registered_at: LogPosition::new(block as u64, index as u64),
            })
        })
        .collect()
}

pub(crate) fn get_cursor(conn: &Connection) -> Result<Option<LogPosition>> {
    let (block, index): (Option<i64>, Option<i64>) = conn
        .query_row(
            "SELECT cursor_block, cursor_log_index FROM indexer_meta WHERE id = 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(store_err)?;

    Ok(match (block, index) {
        (Some(block), Some(index)) => Some(LogPosition::new(block as u64, index as u64)),
        _ => None,
    })
}

pub(crate) fn set_cursor(conn: &Connection, cursor: LogPosition) -> Result<()> {
    conn.execute(
        "UPDATE indexer_meta SET cursor_block = ?1, cursor_log_index = ?2, updated_at = ?3
         WHERE id = 0",
        params![
            cursor.block_number as i64,
            cursor.log_index as i64,
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .map_err(store_err)?;
    Ok(())
}
