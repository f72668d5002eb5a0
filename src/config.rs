/// Configuration for the vote ledger engine.
///
/// Loaded from environment variables; every knob has a default so the
/// engine runs unconfigured in development.
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteLedgerConfig {
    /// Upper bound in milliseconds for any single store round trip on
    /// the synchronous vote path.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Capacity of the karma adjustment queue; submissions beyond this
    /// are dropped, not blocked on.
    #[serde(default = "default_karma_queue_capacity")]
    pub karma_queue_capacity: usize,
    /// Number of background workers draining the karma queue.
    #[serde(default = "default_karma_workers")]
    pub karma_workers: usize,
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_karma_queue_capacity() -> usize {
    1_024
}

fn default_karma_workers() -> usize {
    4
}

impl Default for VoteLedgerConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            karma_queue_capacity: default_karma_queue_capacity(),
            karma_workers: default_karma_workers(),
        }
    }
}

impl VoteLedgerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            store_timeout_ms: std::env::var("VOTE_STORE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_store_timeout_ms),
            karma_queue_capacity: std::env::var("KARMA_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_karma_queue_capacity),
            karma_workers: std::env::var("KARMA_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_karma_workers),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = VoteLedgerConfig::default();

        assert_eq!(config.store_timeout_ms, 2_000);
        assert_eq!(config.store_timeout(), Duration::from_millis(2_000));
        assert_eq!(config.karma_queue_capacity, 1_024);
        assert_eq!(config.karma_workers, 4);
    }
}
