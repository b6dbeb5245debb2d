//! # Header View
//!
//! Minimal decoded view of an Ethereum block header: only the fields the
//! receipts check needs. The header hash is Keccak-256 of the raw RLP.

use rlp::{Rlp, RlpStream};

use crate::algorithms::keccak256;
use crate::domain::{BlockHeight, Hash, RelayError, HASH_LEN};

/// Position of `receiptsRoot` in the header list.
const RECEIPTS_ROOT_INDEX: usize = 5;
/// Position of `number` in the header list.
const NUMBER_INDEX: usize = 8;
/// Fields every header since genesis carries.
const MIN_HEADER_FIELDS: usize = 15;

/// Fields read from a raw header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderView {
    /// Keccak-256 of the raw header bytes.
    pub hash: Hash,
    /// Block number.
    pub number: BlockHeight,
    /// Root of the block's receipts trie.
    pub receipts_root: Hash,
}

impl HeaderView {
    /// Decode the fields of interest from raw header RLP.
    pub fn decode(raw: &[u8]) -> Result<Self, RelayError> {
        let rlp = Rlp::new(raw);
        if !rlp.is_list() {
            return Err(RelayError::InvalidHeader("header is not an RLP list".to_string()));
        }

        let fields = rlp.item_count().map_err(invalid)?;
        if fields < MIN_HEADER_FIELDS {
            return Err(RelayError::InvalidHeader(format!(
                "header has {} fields, expected at least {}",
                fields, MIN_HEADER_FIELDS
            )));
        }

        let root: Vec<u8> = rlp.val_at(RECEIPTS_ROOT_INDEX).map_err(invalid)?;
        if root.len() != HASH_LEN {
            return Err(RelayError::InvalidHeader(format!(
                "receipts root is {} bytes",
                root.len()
            )));
        }
        let mut receipts_root = [0u8; HASH_LEN];
        receipts_root.copy_from_slice(&root);

        let number: u64 = rlp.val_at(NUMBER_INDEX).map_err(invalid)?;

        Ok(Self {
            hash: keccak256(raw),
            number,
            receipts_root,
        })
    }
}

fn invalid(err: rlp::DecoderError) -> RelayError {
    RelayError::InvalidHeader(err.to_string())
}

/// Well-formed legacy (15-field) header with the given number and receipts
/// root; every other field is zeroed. Used by tests and the throughput demo.
pub fn sample_header_rlp(number: BlockHeight, receipts_root: Hash) -> Vec<u8> {
    let zero_hash = vec![0u8; HASH_LEN];
    let mut stream = RlpStream::new_list(MIN_HEADER_FIELDS);
    stream.append(&zero_hash); // parentHash
    stream.append(&zero_hash); // ommersHash
    stream.append(&vec![0u8; 20]); // beneficiary
    stream.append(&zero_hash); // stateRoot
    stream.append(&zero_hash); // transactionsRoot
    stream.append(&receipts_root.to_vec());
    stream.append(&vec![0u8; 256]); // logsBloom
    stream.append(&0u64); // difficulty
    stream.append(&number);
    stream.append(&30_000_000u64); // gasLimit
    stream.append(&0u64); // gasUsed
    stream.append(&number); // timestamp
    stream.append_empty_data(); // extraData
    stream.append(&zero_hash); // mixHash
    stream.append(&vec![0u8; 8]); // nonce
    stream.out().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sample_header() {
        let root = [0x5au8; 32];
        let raw = sample_header_rlp(8_875_000, root);
        let header = HeaderView::decode(&raw).unwrap();
        assert_eq!(header.number, 8_875_000);
        assert_eq!(header.receipts_root, root);
        assert_eq!(header.hash, keccak256(&raw));
    }

    #[test]
    fn test_genesis_number() {
        let header = HeaderView::decode(&sample_header_rlp(0, [0u8; 32])).unwrap();
        assert_eq!(header.number, 0);
    }

    #[test]
    fn test_distinct_numbers_distinct_hashes() {
        let a = HeaderView::decode(&sample_header_rlp(1, [0u8; 32])).unwrap();
        let b = HeaderView::decode(&sample_header_rlp(2, [0u8; 32])).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_rejects_non_list() {
        let result = HeaderView::decode(&[0x83, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(RelayError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_short_list() {
        let mut stream = RlpStream::new_list(3);
        stream.append(&1u64).append(&2u64).append(&3u64);
        let result = HeaderView::decode(&stream.out());
        assert!(matches!(result, Err(RelayError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_placeholder_bytes() {
        assert!(HeaderView::decode(b"header-\0\0\0\0\0\0\0\x01").is_err());
    }
}
