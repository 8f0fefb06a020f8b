use crate::types::log::LogPosition;
use alloy_primitives::{hex, Address, U256};
use serde::{Deserialize, Serialize};

/// Canonical key of an `Event`: lowercase `0x`-prefixed hex of the contract address
pub fn event_id(contract: Address) -> String {
    hex::encode_prefixed(contract)
}

/// Canonical key of a `Ticket`: `<event id>-<token id in decimal>`
pub fn ticket_id(contract: Address, token_id: U256) -> String {
    format!("{}-{}", event_id(contract), token_id)
}

/// One ticketed event, deployed as its own contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Contract address in canonical form (see [`event_id`])
    pub id: String,
    pub organizer: Address,
    pub metadata_cid: String,
    pub ticket_price: U256,
    pub ticket_supply: U256,
    /// Number of distinct tickets minted for this event
    pub total_tickets_sold: U256,
    pub created_at_timestamp: u64,
    pub created_at_block_number: u64,
}

/// One minted ticket NFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// `<event id>-<token id>` (see [`ticket_id`])
    pub id: String,
    pub token_id: U256,
    pub owner: Address,
    /// Id of the owning `Event`
    pub event: String,
    pub is_checked_in: bool,
    pub minted_at_timestamp: u64,
    pub minted_at_block_number: u64,
    pub check_in_timestamp: Option<u64>,
    /// Position of the log that last assigned `owner` (the mint, then each transfer)
    pub last_transfer: LogPosition,
}

/// An event contract whose logs the host delivers to the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub address: Address,
    /// Position of the `EventCreated` log that registered the contract
    pub registered_at: LogPosition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_are_lowercase_hex() {
        let contract = Address::from_str("0x9033f9e52E26Ed90D02192ec84E116479a983463").unwrap();

        assert_eq!(
            event_id(contract),
            "0x9033f9e52e26ed90d02192ec84e116479a983463"
        );
        assert_eq!(
            ticket_id(contract, U256::from(42)),
            "0x9033f9e52e26ed90d02192ec84e116479a983463-42"
        );
    }

    #[test]
    fn test_ticket_ids_are_unique_across_events() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);

        assert_ne!(ticket_id(a, U256::from(1)), ticket_id(b, U256::from(1)));
        assert_ne!(ticket_id(a, U256::from(1)), ticket_id(a, U256::from(11)));
    }
}
