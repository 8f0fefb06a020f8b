use crate::error::{Result, TicketgraphError};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the indexer does when applying a log fails with a store error
///
/// Inconsistent logs (missing parents, duplicates) are never errors; they are
/// skipped by the projection itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop on the first failure (default). A log that cannot be applied
    /// leaves the projection incomplete.
    #[default]
    FailFast,
    /// Log the failure, advance the cursor past the log and continue.
    LogAndSkip,
}

/// Configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Event factory contracts whose `EventCreated` logs are accepted.
    /// Empty: accept `EventCreated` from any emitter.
    #[serde(default)]
    pub factory_addresses: Vec<Address>,

    /// Logs below this block are ignored
    /// Default: 0
    #[serde(default)]
    pub start_block: u64,

    /// Maximum number of logs pulled from a source per batch
    /// Default: 500
    #[serde(default = "default_batch_logs_max")]
    pub batch_logs_max: usize,

    /// Poll interval when caught up (milliseconds)
    /// Default: 1000ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_batch_logs_max() -> usize {
    500
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            factory_addresses: Vec::new(),
            start_block: 0,
            batch_logs_max: default_batch_logs_max(),
            poll_interval_ms: default_poll_interval_ms(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl IndexerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        if !self.factory_addresses.contains(&factory) {
            self.factory_addresses.push(factory);
        }
        self
    }

    pub fn with_start_block(mut self, block: u64) -> Self {
        self.start_block = block;
        self
    }

    pub fn with_batch_logs_max(mut self, max: usize) -> Self {
        self.batch_logs_max = max;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            TicketgraphError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create config from environment variables
    ///
    /// Looks for:
    /// - TICKETGRAPH_FACTORY_ADDRESS (comma separated)
    /// - TICKETGRAPH_START_BLOCK
    /// - TICKETGRAPH_BATCH_LOGS_MAX
    /// - TICKETGRAPH_POLL_INTERVAL_MS
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        use std::env;

        let mut config = Self::default();

        if let Ok(addresses) = env::var("TICKETGRAPH_FACTORY_ADDRESS") {
            for raw in addresses.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let factory: Address = raw.parse().map_err(|e| {
                    TicketgraphError::Config(format!("Invalid factory address {}: {}", raw, e))
                })?;
                config = config.with_factory(factory);
            }
        }

        if let Ok(block) = env::var("TICKETGRAPH_START_BLOCK") {
            config.start_block = block
                .parse()
                .map_err(|e| TicketgraphError::Config(format!("Invalid start block: {}", e)))?;
        }

        if let Ok(max) = env::var("TICKETGRAPH_BATCH_LOGS_MAX") {
            config.batch_logs_max = max
                .parse()
                .map_err(|e| TicketgraphError::Config(format!("Invalid batch size: {}", e)))?;
        }

        if let Ok(ms) = env::var("TICKETGRAPH_POLL_INTERVAL_MS") {
            config.poll_interval_ms = ms
                .parse()
                .map_err(|e| TicketgraphError::Config(format!("Invalid poll interval: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_logs_max == 0 {
            return Err(TicketgraphError::Config(
                "batch_logs_max must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: IndexerConfig = serde_json::from_str("{}").unwrap();

        assert!(config.factory_addresses.is_empty());
        assert_eq!(config.batch_logs_max, 500);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
    }

    #[test]
    fn test_error_policy_snake_case() {
        let config: IndexerConfig =
            serde_json::from_str(r#"{"error_policy": "log_and_skip", "start_block": 12}"#).unwrap();

        assert_eq!(config.error_policy, ErrorPolicy::LogAndSkip);
        assert_eq!(config.start_block, 12);
    }

    #[test]
    fn test_with_factory_deduplicates() {
        let factory = Address::repeat_byte(0x11);
        let config = IndexerConfig::new()
            .with_factory(factory)
            .with_factory(factory);

        assert_eq!(config.factory_addresses, vec![factory]);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let config = IndexerConfig::new().with_batch_logs_max(0);
        assert!(config.validate().is_err());
    }
}
