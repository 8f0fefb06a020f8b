//! Data-source registry
//!
//! Decides which logs the indexer feeds to the projection:
//! - `EventCreated` from a configured factory (any emitter if none is configured)
//! - `Transfer`/`TicketCheckedIn` from an event contract registered by a
//!   prior `EventCreated`, at or after the block it was registered in

use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use ticketgraph_core::{
    observe, ChainLog, DataSource, IndexerConfig, LogKind, LogPosition, SourceRegistrar,
};

#[derive(Debug, Clone, Default)]
pub struct DataSourceRegistry {
    factories: HashSet<Address>,
    sources: HashMap<Address, LogPosition>,
    order: Vec<Address>,
}

impl DataSourceRegistry {
    pub fn new(factories: impl IntoIterator<Item = Address>) -> Self {
        Self {
            factories: factories.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new(config.factory_addresses.iter().copied())
    }

    /// Re-register persisted sources without logging them as new
    pub fn restore(&mut self, sources: impl IntoIterator<Item = DataSource>) {
        for source in sources {
            self.insert(source);
        }
    }

    fn insert(&mut self, source: DataSource) -> bool {
        if self.sources.contains_key(&source.address) {
            return false;
        }
        self.sources.insert(source.address, source.registered_at);
        self.order.push(source.address);
        true
    }

    /// Whether `log` comes from a source the projection listens to
    pub fn accepts(&self, log: &ChainLog) -> bool {
        match &log.kind {
            LogKind::EventCreated(_) => {
                self.factories.is_empty() || self.factories.contains(&log.address)
            }
            LogKind::Transfer(_) | LogKind::TicketCheckedIn(_) => self
                .sources
                .get(&log.address)
                .is_some_and(|registered| log.block.number >= registered.block_number),
        }
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.sources.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Registered sources in registration order
    pub fn sources(&self) -> Vec<DataSource> {
        self.order
            .iter()
            .filter_map(|address| {
                self.sources.get(address).map(|registered_at| DataSource {
                    address: *address,
                    registered_at: *registered_at,
                })
            })
            .collect()
    }
}

impl SourceRegistrar for DataSourceRegistry {
    fn register_source(&mut self, source: DataSource) -> bool {
        let added = self.insert(source);
        if added {
            tracing::info!(
                "Registered event contract {} at {}",
                source.address,
                source.registered_at
            );
            observe::record_source_registered();
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use ticketgraph_core::{BlockMeta, EventCreated, TicketCheckedIn, Transfer};

    const FACTORY: Address = Address::repeat_byte(0xfa);
    const CONTRACT: Address = Address::repeat_byte(0xaa);

    fn log(address: Address, block: u64, kind: LogKind) -> ChainLog {
        ChainLog::new(
            address,
            BlockMeta {
                number: block,
                timestamp: block,
            },
            0,
            kind,
        )
    }

    fn created() -> LogKind {
        LogKind::EventCreated(EventCreated {
            event_contract: CONTRACT,
            organizer: Address::repeat_byte(0x01),
            metadata_cid: String::new(),
            ticket_price: U256::ZERO,
            ticket_supply: U256::ZERO,
        })
    }

    fn mint() -> LogKind {
        LogKind::Transfer(Transfer {
            from: Address::ZERO,
            to: Address::repeat_byte(0x02),
            token_id: U256::from(1),
        })
    }

    #[test]
    fn test_factory_filter() {
        let registry = DataSourceRegistry::new([FACTORY]);
        assert!(registry.accepts(&log(FACTORY, 1, created())));
        assert!(!registry.accepts(&log(Address::repeat_byte(0x66), 1, created())));

        let open = DataSourceRegistry::new([]);
        assert!(open.accepts(&log(Address::repeat_byte(0x66), 1, created())));
    }

    #[test]
    fn test_contract_logs_need_registration() {
        let mut registry = DataSourceRegistry::new([FACTORY]);
        assert!(!registry.accepts(&log(CONTRACT, 10, mint())));

        assert!(registry.register_source(DataSource {
            address: CONTRACT,
            registered_at: LogPosition::new(10, 3),
        }));

        assert!(registry.accepts(&log(CONTRACT, 10, mint())));
        assert!(registry.accepts(&log(
            CONTRACT,
            11,
            LogKind::TicketCheckedIn(TicketCheckedIn {
                token_id: U256::from(1)
            })
        )));
        assert!(!registry.accepts(&log(CONTRACT, 9, mint())));
        // A registered contract is not a factory
        assert!(!registry.accepts(&log(CONTRACT, 12, created())));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = DataSourceRegistry::new([]);
        let source = DataSource {
            address: CONTRACT,
            registered_at: LogPosition::new(5, 0),
        };

        assert!(registry.register_source(source));
        assert!(!registry.register_source(DataSource {
            registered_at: LogPosition::new(8, 0),
            ..source
        }));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sources(), vec![source]);
    }

    #[test]
    fn test_restore_keeps_order() {
        let first = DataSource {
            address: Address::repeat_byte(0xbb),
            registered_at: LogPosition::new(1, 0),
        };
        let second = DataSource {
            address: CONTRACT,
            registered_at: LogPosition::new(2, 0),
        };
        let mut registry = DataSourceRegistry::new([]);

        registry.restore(vec![first, second, first]);

        assert_eq!(registry.sources(), vec![first, second]);
        assert!(registry.is_registered(&CONTRACT));
    }
}
