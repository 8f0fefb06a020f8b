//! Contract ABI and raw log decoding
//!
//! The event factory emits `EventCreated`; every event contract it deploys is
//! an ERC-721 emitting `Transfer` and `TicketCheckedIn`. Raw logs (address,
//! topics, data) are matched on `topic0` and decoded into [`ChainLog`]s.
//!
//! # Example
//!
//! ```
//! use alloy_primitives::{Address, U256};
//! use alloy_sol_types::SolEvent;
//! use ticketgraph::abi::{self, RawLog};
//! use ticketgraph::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let contract = Address::repeat_byte(0xaa);
//! let transfer = abi::contract::Transfer {
//!     from: Address::ZERO,
//!     to: Address::repeat_byte(0x02),
//!     tokenId: U256::from(1),
//! };
//! let raw = RawLog::new(contract, transfer.encode_log_data(), BlockMeta { number: 7, timestamp: 1_700_000_000 }, 0);
//!
//! let log = abi::decode_log(&raw)?.expect("known event");
//! assert!(matches!(log.kind, LogKind::Transfer(t) if t.is_mint()));
//! # Ok(())
//! # }
//! ```

use alloy_primitives::{Address, Bytes, LogData, B256};
use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};
use ticketgraph_core::{
    error::{Result, TicketgraphError},
    BlockMeta, ChainLog, EventCreated, LogKind, TicketCheckedIn, Transfer,
};

/// Solidity event declarations of the factory and event contracts
pub mod contract {
    alloy_sol_types::sol! {
        #[derive(Debug)]
        event EventCreated(
            address indexed eventContract,
            address indexed organizer,
            string metadataCID,
            uint256 ticketPrice,
            uint256 ticketSupply
        );

        #[derive(Debug)]
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        #[derive(Debug)]
        event TicketCheckedIn(uint256 indexed tokenId);
    }
}

/// An undecoded log as returned by `eth_getLogs`, flattened with its block metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub log_index: u64,
}

impl RawLog {
    pub fn new(address: Address, log_data: LogData, block: BlockMeta, log_index: u64) -> Self {
        Self {
            address,
            topics: log_data.topics().to_vec(),
            data: log_data.data,
            block_number: block.number,
            block_timestamp: block.timestamp,
            log_index,
        }
    }

    pub fn block(&self) -> BlockMeta {
        BlockMeta {
            number: self.block_number,
            timestamp: self.block_timestamp,
        }
    }
}

fn decode_err(name: &'static str) -> impl Fn(alloy_sol_types::Error) -> TicketgraphError {
    move |e| TicketgraphError::Decode(format!("{}: {}", name, e))
}

/// Decode a raw log into a typed [`ChainLog`]
///
/// Returns `Ok(None)` for logs whose `topic0` is not one of the three
/// projected events (approvals, ownership changes...). A log carrying a known
/// signature but a malformed body is an error.
pub fn decode_log(raw: &RawLog) -> Result<Option<ChainLog>> {
    let Some(topic0) = raw.topics.first() else {
        return Ok(None);
    };
    let topics = raw.topics.iter().copied();

    let kind = if *topic0 == contract::EventCreated::SIGNATURE_HASH {
        let event = contract::EventCreated::decode_raw_log(topics, &raw.data, true)
            .map_err(decode_err("EventCreated"))?;
        LogKind::EventCreated(EventCreated {
            event_contract: event.eventContract,
            organizer: event.organizer,
            metadata_cid: event.metadataCID,
            ticket_price: event.ticketPrice,
            ticket_supply: event.ticketSupply,
        })
    } else if *topic0 == contract::Transfer::SIGNATURE_HASH {
        let event = contract::Transfer::decode_raw_log(topics, &raw.data, true)
            .map_err(decode_err("Transfer"))?;
        LogKind::Transfer(Transfer {
            from: event.from,
            to: event.to,
            token_id: event.tokenId,
        })
    } else if *topic0 == contract::TicketCheckedIn::SIGNATURE_HASH {
        let event = contract::TicketCheckedIn::decode_raw_log(topics, &raw.data, true)
            .map_err(decode_err("TicketCheckedIn"))?;
        LogKind::TicketCheckedIn(TicketCheckedIn {
            token_id: event.tokenId,
        })
    } else {
        return Ok(None);
    };

    Ok(Some(ChainLog::new(
        raw.address,
        raw.block(),
        raw.log_index,
        kind,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    const BLOCK: BlockMeta = BlockMeta {
        number: 100,
        timestamp: 1_700_000_000,
    };

    #[test]
    fn test_decode_event_created() {
        let factory = Address::repeat_byte(0xfa);
        let created = contract::EventCreated {
            eventContract: Address::repeat_byte(0xaa),
            organizer: Address::repeat_byte(0x01),
            metadataCID: "Qm123".into(),
            ticketPrice: U256::ZERO,
            ticketSupply: U256::from(10),
        };
        let raw = RawLog::new(factory, created.encode_log_data(), BLOCK, 4);

        let log = decode_log(&raw).unwrap().unwrap();

        assert_eq!(log.address, factory);
        assert_eq!(log.log_index, 4);
        assert_eq!(log.block, BLOCK);
        assert_eq!(
            log.kind,
            LogKind::EventCreated(EventCreated {
                event_contract: Address::repeat_byte(0xaa),
                organizer: Address::repeat_byte(0x01),
                metadata_cid: "Qm123".into(),
                ticket_price: U256::ZERO,
                ticket_supply: U256::from(10),
            })
        );
    }

    #[test]
    fn test_decode_check_in() {
        let checked_in = contract::TicketCheckedIn {
            tokenId: U256::from(3),
        };
        let raw = RawLog::new(Address::repeat_byte(0xaa), checked_in.encode_log_data(), BLOCK, 0);

        let log = decode_log(&raw).unwrap().unwrap();
        assert_eq!(
            log.kind,
            LogKind::TicketCheckedIn(TicketCheckedIn {
                token_id: U256::from(3)
            })
        );
    }

    #[test]
    fn test_unknown_topic_is_ignored() {
        let raw = RawLog {
            address: Address::repeat_byte(0xaa),
            topics: vec![B256::repeat_byte(0x42)],
            data: Bytes::new(),
            block_number: 1,
            block_timestamp: 1,
            log_index: 0,
        };

        assert!(decode_log(&raw).unwrap().is_none());
    }

    #[test]
    fn test_log_without_topics_is_ignored() {
        let raw = RawLog {
            address: Address::repeat_byte(0xaa),
            topics: Vec::new(),
            data: Bytes::new(),
            block_number: 1,
            block_timestamp: 1,
            log_index: 0,
        };

        assert!(decode_log(&raw).unwrap().is_none());
    }

    #[test]
    fn test_malformed_event_created_is_an_error() {
        // Known signature, but the body is too short for (string, uint256, uint256)
        let raw = RawLog {
            address: Address::repeat_byte(0xfa),
            topics: vec![
                contract::EventCreated::SIGNATURE_HASH,
                Address::repeat_byte(0xaa).into_word(),
                Address::repeat_byte(0x01).into_word(),
            ],
            data: Bytes::from(vec![0u8; 4]),
            block_number: 1,
            block_timestamp: 1,
            log_index: 0,
        };

        assert!(matches!(
            decode_log(&raw),
            Err(TicketgraphError::Decode(_))
        ));
    }
}
