//! # Domain Invariants
//!
//! Constants and rules that must always hold for a relay instance.

use super::errors::RelayError;
use super::value_objects::BlockHeight;

/// Default delay between retries once the source stops yielding blocks.
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;

/// Default interval of the throughput status report.
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 10_000;

/// Default number of runtime worker threads.
pub const DEFAULT_WORKER_THREADS: usize = 5;

/// Default poll interval while waiting for a transaction to be mined.
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Size of a header hash and of a transaction hash.
pub const HASH_LEN: usize = 32;

/// Invariant: the start height may only be configured once, and only while
/// the cursor is still unset (zero).
pub fn invariant_start_unconfigured(
    configured: bool,
    current: BlockHeight,
) -> Result<(), RelayError> {
    if configured || current != 0 {
        return Err(RelayError::AlreadyStarted { height: current });
    }
    Ok(())
}

/// Invariant: the cursor only ever moves forward by exactly one.
pub fn invariant_cursor_step(previous: BlockHeight, next: BlockHeight) -> bool {
    previous.checked_add(1) == Some(next)
}

/// Invariant: a receipt sampling rate must be a number.
///
/// Out-of-range values are accepted and saturate at the ends of [0, 1].
pub fn invariant_sampling_rate(rate: f64) -> Result<(), RelayError> {
    if rate.is_nan() {
        return Err(RelayError::InvalidConfig(
            "receipt rate must be a number".to_string(),
        ));
    }
    Ok(())
}
