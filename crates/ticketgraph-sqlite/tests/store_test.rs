//! Integration tests for the SQLite entity store

use alloy_primitives::{Address, U256};
use tempfile::TempDir;
use ticketgraph_core::{
    event_id, ticket_id, DataSource, EntityStore, EntityTxn, Event, LogPosition, StoreConfig,
    Ticket,
};
use ticketgraph_sqlite::SqliteEntityStore;

fn create_test_store() -> (SqliteEntityStore, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = SqliteEntityStore::open(StoreConfig::new(temp_dir.path().join("entities.db")))
        .unwrap();
    (store, temp_dir)
}

fn sample_event(contract: Address, organizer: Address, created_at: u64) -> Event {
    Event {
        id: event_id(contract),
        organizer,
        metadata_cid: "QmSampleCid".into(),
        ticket_price: U256::from(10u64).pow(U256::from(18)),
        ticket_supply: U256::from(100),
        total_tickets_sold: U256::ZERO,
        created_at_timestamp: created_at,
        created_at_block_number: created_at / 2,
    }
}

fn sample_ticket(contract: Address, token: u64, owner: Address) -> Ticket {
    Ticket {
        id: ticket_id(contract, U256::from(token)),
        token_id: U256::from(token),
        owner,
        event: event_id(contract),
        is_checked_in: false,
        minted_at_timestamp: 1_700_000_000,
        minted_at_block_number: 42,
        check_in_timestamp: None,
        last_transfer: LogPosition::new(42, 3),
    }
}

#[test]
fn test_fresh_store_has_no_cursor() {
    let (store, _temp) = create_test_store();

    assert_eq!(store.get_cursor().unwrap(), None);
    assert!(store.sources().unwrap().is_empty());
    assert!(store.events().unwrap().is_empty());
    assert_eq!(store.schema_version().unwrap(), 1);
}

#[test]
fn test_event_and_ticket_roundtrip_through_columns() {
    let (store, _temp) = create_test_store();
    let contract = Address::repeat_byte(0xaa);
    let event = sample_event(contract, Address::repeat_byte(0x01), 1_700_000_000);
    let mut ticket = sample_ticket(contract, 7, Address::repeat_byte(0x02));
    ticket.is_checked_in = true;
    ticket.check_in_timestamp = Some(1_700_000_500);

    let mut txn = store.begin_txn().unwrap();
    txn.put_event(&event).unwrap();
    txn.put_ticket(&ticket).unwrap();
    txn.commit(LogPosition::new(42, 3)).unwrap();

    assert_eq!(store.event(&event.id).unwrap(), Some(event));
    assert_eq!(store.ticket(&ticket.id).unwrap(), Some(ticket));
    assert_eq!(store.get_cursor().unwrap(), Some(LogPosition::new(42, 3)));
}

#[test]
fn test_put_replaces_existing_row() {
    let (store, _temp) = create_test_store();
    let contract = Address::repeat_byte(0xaa);
    let mut ticket = sample_ticket(contract, 1, Address::repeat_byte(0x02));

    let mut txn = store.begin_txn().unwrap();
    txn.put_ticket(&ticket).unwrap();
    txn.commit(LogPosition::new(1, 0)).unwrap();

    ticket.owner = Address::repeat_byte(0x03);
    let mut txn = store.begin_txn().unwrap();
    txn.put_ticket(&ticket).unwrap();
    assert_eq!(txn.count_tickets_for_event(&event_id(contract)).unwrap(), 1);
    txn.commit(LogPosition::new(2, 0)).unwrap();

    let stored = store.ticket(&ticket.id).unwrap().unwrap();
    assert_eq!(stored.owner, Address::repeat_byte(0x03));
}

#[test]
fn test_uncommitted_txn_is_rolled_back_on_drop() {
    let (store, _temp) = create_test_store();
    let contract = Address::repeat_byte(0xaa);

    {
        let mut txn = store.begin_txn().unwrap();
        txn.put_event(&sample_event(contract, Address::repeat_byte(0x01), 1))
            .unwrap();
    }

    assert!(store.event(&event_id(contract)).unwrap().is_none());
    assert_eq!(store.get_cursor().unwrap(), None);
}

#[test]
fn test_sources_keep_registration_order_and_ignore_duplicates() {
    let (store, _temp) = create_test_store();
    let first = DataSource {
        address: Address::repeat_byte(0xbb),
        registered_at: LogPosition::new(5, 0),
    };
    let second = DataSource {
        address: Address::repeat_byte(0xaa),
        registered_at: LogPosition::new(6, 1),
    };

    let mut txn = store.begin_txn().unwrap();
    txn.put_source(&first).unwrap();
    txn.put_source(&second).unwrap();
    txn.put_source(&DataSource {
        registered_at: LogPosition::new(9, 9),
        ..first
    })
    .unwrap();
    txn.commit(LogPosition::new(6, 1)).unwrap();

    assert_eq!(store.sources().unwrap(), vec![first, second]);
}

#[test]
fn test_read_paths() {
    let (store, _temp) = create_test_store();
    let organizer = Address::repeat_byte(0x01);
    let holder = Address::repeat_byte(0x02);
    let older = Address::repeat_byte(0xaa);
    let newer = Address::repeat_byte(0xbb);

    let mut txn = store.begin_txn().unwrap();
    txn.put_event(&sample_event(older, organizer, 100)).unwrap();
    txn.put_event(&sample_event(newer, Address::repeat_byte(0x09), 200))
        .unwrap();
    txn.put_ticket(&sample_ticket(older, 10, holder)).unwrap();
    txn.put_ticket(&sample_ticket(older, 9, holder)).unwrap();
    txn.put_ticket(&sample_ticket(newer, 1, holder)).unwrap();
    txn.commit(LogPosition::new(3, 0)).unwrap();

    let ids: Vec<String> = store.events().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![event_id(newer), event_id(older)]);

    let by_organizer = store.events_by_organizer(organizer).unwrap();
    assert_eq!(by_organizer.len(), 1);
    assert_eq!(by_organizer[0].id, event_id(older));

    // Numeric, not lexicographic, token order
    let tokens: Vec<U256> = store
        .tickets_for_event(&event_id(older))
        .unwrap()
        .into_iter()
        .map(|t| t.token_id)
        .collect();
    assert_eq!(tokens, vec![U256::from(9), U256::from(10)]);

    assert_eq!(store.tickets_by_owner(holder, None).unwrap().len(), 3);
    assert_eq!(
        store
            .tickets_by_owner(holder, Some(&event_id(newer)))
            .unwrap()
            .len(),
        1
    );
    assert!(store
        .tickets_by_owner(Address::repeat_byte(0x05), None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_reopen_preserves_state() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("entities.db");
    let contract = Address::repeat_byte(0xaa);

    {
        let store = SqliteEntityStore::open(StoreConfig::new(path.clone())).unwrap();
        let mut txn = store.begin_txn().unwrap();
        txn.put_event(&sample_event(contract, Address::repeat_byte(0x01), 1))
            .unwrap();
        txn.put_source(&DataSource {
            address: contract,
            registered_at: LogPosition::new(1, 0),
        })
        .unwrap();
        txn.commit(LogPosition::new(1, 0)).unwrap();
    }

    let store = SqliteEntityStore::open(StoreConfig::new(path)).unwrap();
    assert!(store.event(&event_id(contract)).unwrap().is_some());
    assert_eq!(store.sources().unwrap().len(), 1);
    assert_eq!(store.get_cursor().unwrap(), Some(LogPosition::new(1, 0)));
}
