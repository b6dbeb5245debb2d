//! # Receipt Sampler
//!
//! Decides, per block, whether receipts are verified.
//!
//! The decision is a pure function of the header hash: the last hash byte is
//! compared against `floor(rate * 255)`. Repeated runs at a fixed rate sample
//! the same blocks.
//!
//! Known boundary gap: at rate 1.0 the threshold is 255 and the comparison is
//! strict, so a block whose hash ends in `0xff` is never sampled.

use serde::{Deserialize, Serialize};

use crate::domain::Hash;

/// Integer sampling threshold over the domain of one hash byte.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct SamplingThreshold(u8);

impl SamplingThreshold {
    /// Threshold that never samples.
    pub const NEVER: Self = SamplingThreshold(0);

    /// Convert a rate into a threshold; saturates outside [0, 1], NaN maps to 0.
    pub fn from_rate(rate: f64) -> Self {
        if rate.is_nan() || rate <= 0.0 {
            return Self::NEVER;
        }
        let scaled = (rate.min(1.0) * f64::from(u8::MAX)).floor();
        SamplingThreshold(scaled as u8)
    }

    /// Build directly from a raw threshold byte.
    pub const fn from_raw(raw: u8) -> Self {
        SamplingThreshold(raw)
    }

    /// Raw threshold byte.
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// Whether the block with this header hash is selected.
    pub fn selects(&self, header_hash: &Hash) -> bool {
        header_hash[header_hash.len() - 1] < self.0
    }
}

/// `ShouldVerifyReceipts(headerHash, rate)`.
pub fn should_verify_receipts(header_hash: &Hash, rate: f64) -> bool {
    SamplingThreshold::from_rate(rate).selects(header_hash)
}
