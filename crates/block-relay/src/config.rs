//! # Relay Configuration
//!
//! Configuration for the block relay, its tasks and its chain source.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{
    invariant_sampling_rate, RelayError, DEFAULT_BACKOFF_MS, DEFAULT_RECEIPT_POLL_MS,
    DEFAULT_STATUS_INTERVAL_MS, DEFAULT_WORKER_THREADS,
};

/// Block relay configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// JSON-RPC endpoint of the chain-data source.
    pub source_url: String,

    /// Height the sync cursor starts from.
    pub start_height: u64,

    /// Fraction of blocks whose receipts are verified (0.0 to 1.0).
    pub receipt_rate: f64,

    /// Delay between sync attempts while the source has nothing new.
    pub backoff_interval_ms: u64,

    /// Interval of the throughput status report.
    pub status_interval_ms: u64,

    /// Worker threads of the task runtime.
    pub worker_threads: usize,

    /// Timeout of a single JSON-RPC request.
    pub request_timeout_ms: u64,

    /// Poll interval while waiting for a submitted transaction to be mined.
    pub receipt_poll_interval_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            source_url: "http://localhost:8545".to_string(),
            start_height: 0,
            receipt_rate: 0.0,
            backoff_interval_ms: DEFAULT_BACKOFF_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            worker_threads: DEFAULT_WORKER_THREADS,
            request_timeout_ms: 10_000,
            receipt_poll_interval_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }
}

impl RelayConfig {
    /// Create a config for testing (short intervals).
    pub fn for_testing() -> Self {
        Self {
            source_url: "http://127.0.0.1:8545".to_string(),
            start_height: 0,
            receipt_rate: 0.0,
            backoff_interval_ms: 10,
            status_interval_ms: 50,
            worker_threads: 2,
            request_timeout_ms: 1_000,
            receipt_poll_interval_ms: 10,
        }
    }

    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.source_url.is_empty() {
            return Err(RelayError::InvalidConfig("source_url is empty".to_string()));
        }
        invariant_sampling_rate(self.receipt_rate)?;
        if self.backoff_interval_ms == 0 {
            return Err(RelayError::InvalidConfig(
                "backoff_interval_ms must be positive".to_string(),
            ));
        }
        if self.status_interval_ms == 0 {
            return Err(RelayError::InvalidConfig(
                "status_interval_ms must be positive".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(RelayError::InvalidConfig(
                "worker_threads must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Backoff interval as a `Duration`.
    pub fn backoff_interval(&self) -> Duration {
        Duration::from_millis(self.backoff_interval_ms)
    }

    /// Status interval as a `Duration`.
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Receipt poll interval as a `Duration`.
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
