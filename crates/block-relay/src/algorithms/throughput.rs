//! # Throughput
//!
//! Block-rate arithmetic shared by the status task and the throughput
//! evaluation.

use std::time::Duration;

/// Blocks per second between two cursor observations taken `interval` apart.
///
/// A cursor that did not move (or an empty interval) yields `0.0`.
pub fn rate_per_second(previous: u64, current: u64, interval: Duration) -> f64 {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / secs
}

/// Blocks per second for `blocks` pushed in `elapsed`.
pub fn blocks_per_second(blocks: u64, elapsed: Duration) -> f64 {
    rate_per_second(0, blocks, elapsed)
}
