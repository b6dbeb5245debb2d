//! # Algorithms Module
//!
//! Pure functions used by the relay, its tasks and the trusted verifier.

pub mod adaptive_interval;
pub mod hashing;
pub mod hex_codec;
pub mod receipt_sampler;
pub mod throughput;

pub use adaptive_interval::{AdaptiveInterval, IntervalMode};
pub use hashing::keccak256;
pub use hex_codec::{decode_hex_array, decode_hex_bytes, decode_hex_u64, encode_hex};
pub use receipt_sampler::{should_verify_receipts, SamplingThreshold};
pub use throughput::{blocks_per_second, rate_per_second};
