//! In-memory entity store
//!
//! Backs tests and short-lived replays. Writes are staged in the transaction
//! and merged into the tables on commit, so a dropped or rolled back
//! transaction leaves no trace.

use crate::error::Result;
use crate::traits::{EntityStore, EntityTxn};
use crate::types::{DataSource, Event, LogPosition, Ticket};
use alloy_primitives::Address;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
struct Tables {
    events: HashMap<String, Event>,
    tickets: HashMap<String, Ticket>,
    sources: Vec<DataSource>,
    cursor: Option<LogPosition>,
}

/// Ordered copy of the entity tables, comparable with `==`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub events: BTreeMap<String, Event>,
    pub tickets: BTreeMap<String, Ticket>,
}

#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    tables: Mutex<Tables>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.lock();
        Snapshot {
            events: tables
                .events
                .iter()
                .map(|(id, e)| (id.clone(), e.clone()))
                .collect(),
            tickets: tables
                .tickets
                .iter()
                .map(|(id, t)| (id.clone(), t.clone()))
                .collect(),
        }
    }
}

pub struct MemoryTxn<'a> {
    tables: MutexGuard<'a, Tables>,
    events: HashMap<String, Event>,
    tickets: HashMap<String, Ticket>,
    sources: Vec<DataSource>,
}

impl<'a> EntityTxn for MemoryTxn<'a> {
    fn get_event(&self, id: &str) -> Result<Option<Event>> {
        Ok(self
            .events
            .get(id)
            .or_else(|| self.tables.events.get(id))
            .cloned())
    }

    fn put_event(&mut self, event: &Event) -> Result<()> {
        self.events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    fn get_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        Ok(self
            .tickets
            .get(id)
            .or_else(|| self.tables.tickets.get(id))
            .cloned())
    }

    fn put_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        self.tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    fn count_tickets_for_event(&self, event_id: &str) -> Result<u64> {
        let committed = self
            .tables
            .tickets
            .values()
            .filter(|t| t.event == event_id && !self.tickets.contains_key(&t.id))
            .count();
        let staged = self.tickets.values().filter(|t| t.event == event_id).count();
        Ok((committed + staged) as u64)
    }

    fn put_source(&mut self, source: &DataSource) -> Result<()> {
        let known = self
            .tables
            .sources
            .iter()
            .chain(self.sources.iter())
            .any(|s| s.address == source.address);
        if !known {
            self.sources.push(*source);
        }
        Ok(())
    }

    fn commit(mut self, cursor: LogPosition) -> Result<()> {
        let events = std::mem::take(&mut self.events);
        let tickets = std::mem::take(&mut self.tickets);
        let sources = std::mem::take(&mut self.sources);

        self.tables.events.extend(events);
        self.tables.tickets.extend(tickets);
        self.tables.sources.extend(sources);
        self.tables.cursor = Some(cursor);
        Ok(())
    }

    fn rollback(self) {}
}

impl EntityStore for MemoryEntityStore {
    type Txn<'a> = MemoryTxn<'a>;

    fn begin_txn(&self) -> Result<Self::Txn<'_>> {
        Ok(MemoryTxn {
            tables: self.tables.lock(),
            events: HashMap::new(),
            tickets: HashMap::new(),
            sources: Vec::new(),
        })
    }

    fn get_cursor(&self) -> Result<Option<LogPosition>> {
        Ok(self.tables.lock().cursor)
    }

    fn sources(&self) -> Result<Vec<DataSource>> {
        Ok(self.tables.lock().sources.clone())
    }

    fn event(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.tables.lock().events.get(id).cloned())
    }

    fn ticket(&self, id: &str) -> Result<Option<Ticket>> {
        Ok(self.tables.lock().tickets.get(id).cloned())
    }

    fn events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.tables.lock().events.values().cloned().collect();
        sort_newest_first(&mut events);
        Ok(events)
    }

    fn events_by_organizer(&self, organizer: Address) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .tables
            .lock()
            .events
            .values()
            .filter(|e| e.organizer == organizer)
            .cloned()
            .collect();
        sort_newest_first(&mut events);
        Ok(events)
    }

    fn tickets_for_event(&self, event_id: &str) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tables
            .lock()
            .tickets
            .values()
            .filter(|t| t.event == event_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.token_id.cmp(&b.token_id));
        Ok(tickets)
    }

    fn tickets_by_owner(&self, owner: Address, event_id: Option<&str>) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tables
            .lock()
            .tickets
            .values()
            .filter(|t| t.owner == owner && event_id.map_or(true, |id| t.event == id))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tickets)
    }
}

fn sort_newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| {
        b.created_at_timestamp
            .cmp(&a.created_at_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{event_id, ticket_id};
    use alloy_primitives::U256;

    fn event(contract: Address, created_at: u64) -> Event {
        Event {
            id: event_id(contract),
            organizer: Address::repeat_byte(0x01),
            metadata_cid: "Qm123".into(),
            ticket_price: U256::ZERO,
            ticket_supply: U256::from(10),
            total_tickets_sold: U256::ZERO,
            created_at_timestamp: created_at,
            created_at_block_number: created_at,
        }
    }

    fn ticket(contract: Address, token: u64, owner: Address) -> Ticket {
        Ticket {
            id: ticket_id(contract, U256::from(token)),
            token_id: U256::from(token),
            owner,
            event: event_id(contract),
            is_checked_in: false,
            minted_at_timestamp: 0,
            minted_at_block_number: 0,
            check_in_timestamp: None,
            last_transfer: LogPosition::new(0, 0),
        }
    }

    #[test]
    fn test_commit_makes_writes_visible() {
        let store = MemoryEntityStore::new();
        let contract = Address::repeat_byte(0xaa);

        let mut txn = store.begin_txn().unwrap();
        txn.put_event(&event(contract, 1)).unwrap();
        assert!(txn.get_event(&event_id(contract)).unwrap().is_some());
        txn.commit(LogPosition::new(1, 0)).unwrap();

        assert!(store.event(&event_id(contract)).unwrap().is_some());
        assert_eq!(store.get_cursor().unwrap(), Some(LogPosition::new(1, 0)));
    }

    #[test]
    fn test_dropped_txn_leaves_no_trace() {
        let store = MemoryEntityStore::new();
        let contract = Address::repeat_byte(0xaa);

        {
            let mut txn = store.begin_txn().unwrap();
            txn.put_event(&event(contract, 1)).unwrap();
            txn.rollback();
        }

        assert!(store.event(&event_id(contract)).unwrap().is_none());
        assert_eq!(store.get_cursor().unwrap(), None);
    }

    #[test]
    fn test_count_includes_staged_without_double_counting() {
        let store = MemoryEntityStore::new();
        let contract = Address::repeat_byte(0xaa);
        let holder = Address::repeat_byte(0x02);

        let mut txn = store.begin_txn().unwrap();
        txn.put_ticket(&ticket(contract, 1, holder)).unwrap();
        txn.commit(LogPosition::new(1, 0)).unwrap();

        let mut txn = store.begin_txn().unwrap();
        // Overwrite of a committed ticket must not count twice
        txn.put_ticket(&ticket(contract, 1, Address::repeat_byte(0x03)))
            .unwrap();
        txn.put_ticket(&ticket(contract, 2, holder)).unwrap();
        assert_eq!(txn.count_tickets_for_event(&event_id(contract)).unwrap(), 2);
    }

    #[test]
    fn test_sources_are_deduplicated() {
        let store = MemoryEntityStore::new();
        let source = DataSource {
            address: Address::repeat_byte(0xaa),
            registered_at: LogPosition::new(1, 0),
        };

        let mut txn = store.begin_txn().unwrap();
        txn.put_source(&source).unwrap();
        txn.put_source(&source).unwrap();
        txn.commit(LogPosition::new(1, 0)).unwrap();

        let mut txn = store.begin_txn().unwrap();
        txn.put_source(&source).unwrap();
        txn.commit(LogPosition::new(2, 0)).unwrap();

        assert_eq!(store.sources().unwrap(), vec![source]);
    }

    #[test]
    fn test_queries_are_ordered() {
        let store = MemoryEntityStore::new();
        let older = Address::repeat_byte(0xaa);
        let newer = Address::repeat_byte(0xbb);
        let holder = Address::repeat_byte(0x02);

        let mut txn = store.begin_txn().unwrap();
        txn.put_event(&event(older, 100)).unwrap();
        txn.put_event(&event(newer, 200)).unwrap();
        txn.put_ticket(&ticket(older, 10, holder)).unwrap();
        txn.put_ticket(&ticket(older, 2, holder)).unwrap();
        txn.put_ticket(&ticket(newer, 1, Address::repeat_byte(0x03)))
            .unwrap();
        txn.commit(LogPosition::new(3, 0)).unwrap();

        let events = store.events().unwrap();
        assert_eq!(events[0].id, event_id(newer));
        assert_eq!(events[1].id, event_id(older));

        let tokens: Vec<U256> = store
            .tickets_for_event(&event_id(older))
            .unwrap()
            .into_iter()
            .map(|t| t.token_id)
            .collect();
        assert_eq!(tokens, vec![U256::from(2), U256::from(10)]);

        assert_eq!(store.tickets_by_owner(holder, None).unwrap().len(), 2);
        assert_eq!(
            store
                .tickets_by_owner(holder, Some(&event_id(newer)))
                .unwrap()
                .len(),
            0
        );
    }
}
