//! Query commands: print projected rows as JSON

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;
use ticketgraph::prelude::*;
use ticketgraph::event_id;

/// RFC 3339 rendering of a block timestamp
fn block_time(timestamp: u64) -> Value {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| Value::String(time.to_rfc3339()))
        .unwrap_or(Value::Null)
}

fn event_json(event: &Event) -> Result<Value> {
    let mut value = serde_json::to_value(event)?;
    value["created_at"] = block_time(event.created_at_timestamp);
    Ok(value)
}

fn ticket_json(ticket: &Ticket) -> Result<Value> {
    let mut value = serde_json::to_value(ticket)?;
    value["minted_at"] = block_time(ticket.minted_at_timestamp);
    value["checked_in_at"] = ticket
        .check_in_timestamp
        .map(block_time)
        .unwrap_or(Value::Null);
    Ok(value)
}

fn print(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn event(db_path: PathBuf, address: Address) -> Result<()> {
    let store = super::open_store(&db_path)?;
    let id = event_id(address);

    let Some(event) = store.event(&id).context("Failed to read event")? else {
        bail!("No event for contract {}", address);
    };
    let tickets = store
        .tickets_for_event(&id)
        .context("Failed to read tickets")?;
    let checked_in = tickets.iter().filter(|t| t.is_checked_in).count();

    let mut value = event_json(&event)?;
    value["tickets_checked_in"] = json!(checked_in);
    print(&value)
}

pub fn events(db_path: PathBuf, organizer: Option<Address>) -> Result<()> {
    let store = super::open_store(&db_path)?;

    let events = match organizer {
        Some(organizer) => store.events_by_organizer(organizer),
        None => store.events(),
    }
    .context("Failed to read events")?;

    let rows = events.iter().map(event_json).collect::<Result<Vec<_>>>()?;
    print(&Value::Array(rows))
}

pub fn tickets(db_path: PathBuf, event: Option<Address>, owner: Option<Address>) -> Result<()> {
    let store = super::open_store(&db_path)?;
    let event = event.map(event_id);

    let tickets = match (owner, event.as_deref()) {
        (Some(owner), event) => store.tickets_by_owner(owner, event),
        (None, Some(event)) => store.tickets_for_event(event),
        (None, None) => bail!("Pass --event or --owner"),
    }
    .context("Failed to read tickets")?;

    let rows = tickets.iter().map(ticket_json).collect::<Result<Vec<_>>>()?;
    print(&Value::Array(rows))
}
