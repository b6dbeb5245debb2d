//! # Trusted Side
//!
//! Code that runs behind the trust boundary: header decoding, sampled
//! receipts verification and the verified-block event sink.

pub mod header;
pub mod sink;
pub mod verifier;

pub use header::{sample_header_rlp, HeaderView};
pub use sink::{BroadcastBlockSink, VerifiedBlock, VerifiedBlockSink, DEFAULT_SINK_CAPACITY};
pub use verifier::{HostServices, OrderedTrieReceiptsRoot, ReceiptsRootCalculator, TrustedVerifier};
