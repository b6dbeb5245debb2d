//! # Hashing
//!
//! Keccak-256, the hash used for header identity and transaction hashes.

use sha3::{Digest, Keccak256};

use crate::domain::Hash;

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&digest);
    output
}
