use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a log in the chain: block number, then log index within the block
///
/// Ordering is lexicographic, which is the order the chain emitted the logs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogPosition {
    pub block_number: u64,
    pub log_index: u64,
}

impl LogPosition {
    pub fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

impl fmt::Display for LogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}

/// Block metadata attached to every log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub number: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

/// `EventCreated` emitted by the event factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreated {
    pub event_contract: Address,
    pub organizer: Address,
    pub metadata_cid: String,
    pub ticket_price: U256,
    pub ticket_supply: U256,
}

/// ERC-721 `Transfer` emitted by an event contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub token_id: U256,
}

impl Transfer {
    /// A transfer out of the zero address creates the token
    pub fn is_mint(&self) -> bool {
        self.from == Address::ZERO
    }
}

/// `TicketCheckedIn` emitted by an event contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCheckedIn {
    pub token_id: U256,
}

/// Payload of a decoded log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogKind {
    EventCreated(EventCreated),
    Transfer(Transfer),
    TicketCheckedIn(TicketCheckedIn),
}

impl LogKind {
    pub fn name(&self) -> &'static str {
        match self {
            LogKind::EventCreated(_) => "EventCreated",
            LogKind::Transfer(_) => "Transfer",
            LogKind::TicketCheckedIn(_) => "TicketCheckedIn",
        }
    }
}

/// A typed on-chain log, the unit of input to the projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLog {
    /// Address of the contract that emitted the log
    pub address: Address,
    pub block: BlockMeta,
    pub log_index: u64,
    pub kind: LogKind,
}

impl ChainLog {
    pub fn new(address: Address, block: BlockMeta, log_index: u64, kind: LogKind) -> Self {
        Self {
            address,
            block,
            log_index,
            kind,
        }
    }

    pub fn position(&self) -> LogPosition {
        LogPosition::new(self.block.number, self.log_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_orders_by_block_then_index() {
        let a = LogPosition::new(10, 5);
        let b = LogPosition::new(10, 6);
        let c = LogPosition::new(11, 0);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "10:5");
    }

    #[test]
    fn test_mint_detection() {
        let mint = Transfer {
            from: Address::ZERO,
            to: Address::repeat_byte(0x02),
            token_id: U256::from(1),
        };
        let resale = Transfer {
            from: Address::repeat_byte(0x02),
            ..mint
        };

        assert!(mint.is_mint());
        assert!(!resale.is_mint());
    }
}
