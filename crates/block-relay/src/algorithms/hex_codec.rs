//! # Hex Codec
//!
//! Decoding of `0x`-prefixed hex results returned by the chain source.
//!
//! Anything that is not `"0x"` followed by at least one digit is a protocol
//! error. Odd-length quantities (`"0x1"`) are left-padded with a zero nibble.

use crate::domain::RelayError;

/// Decode a `0x`-prefixed hex string into bytes.
///
/// # Errors
///
/// `RelayError::Source` if the prefix is missing, the string is shorter than
/// three characters, or a non-hex digit is present.
pub fn decode_hex_bytes(hex_str: &str) -> Result<Vec<u8>, RelayError> {
    let digits = strip_prefix(hex_str)?;

    if digits.len() % 2 == 1 {
        let mut padded = String::with_capacity(digits.len() + 1);
        padded.push('0');
        padded.push_str(digits);
        return hex::decode(&padded).map_err(RelayError::source);
    }

    hex::decode(digits).map_err(RelayError::source)
}

/// Decode a `0x`-prefixed hex string into a fixed-size array.
pub fn decode_hex_array<const N: usize>(hex_str: &str) -> Result<[u8; N], RelayError> {
    let bytes = decode_hex_bytes(hex_str)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        RelayError::Source(format!(
            "expected {} bytes, source returned {}",
            N,
            bytes.len()
        ))
    })
}

/// Decode a `0x`-prefixed big-endian hex quantity into a `u64`.
pub fn decode_hex_u64(hex_str: &str) -> Result<u64, RelayError> {
    let bytes = decode_hex_bytes(hex_str)?;
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();

    if significant.len() > 8 {
        return Err(RelayError::Source(format!(
            "quantity {} does not fit in 64 bits",
            hex_str
        )));
    }

    Ok(significant
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_prefix(hex_str: &str) -> Result<&str, RelayError> {
    if hex_str.len() < 3 {
        return Err(RelayError::Source(format!(
            "hex result too short: {:?}",
            hex_str
        )));
    }
    hex_str
        .strip_prefix("0x")
        .ok_or_else(|| RelayError::Source(format!("hex result missing 0x prefix: {:?}", hex_str)))
}
