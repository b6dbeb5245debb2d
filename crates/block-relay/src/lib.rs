//! # Block Relay
//!
//! Trust-boundary block relay and adaptive sync engine.
//!
//! Pulls block headers one height at a time from an untrusted chain-data
//! source, pushes them across a trust boundary into a verifier, and lets the
//! verifier pull receipts for a hash-sampled subset of blocks.
//!
//! ## Flow
//!
//! ```text
//! SyncTask ──tick──→ BlockRelay::advance ──→ ChainSource::header(height)
//!                         │
//!                         └─PushHeader─→ [boundary] ─→ TrustedVerifier
//!                                                         │ sampled?
//!                    ChainSource::receipts ←─GetReceiptsByHeight─┘
//!
//! StatusTask ──tick──→ BlockRelay::current_height ──→ blocks/sec report
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! block-relay/
//! ├── domain/          # Errors, value objects, invariants
//! ├── algorithms/      # Hex codec, receipt sampler, adaptive interval, throughput
//! ├── ports/           # RelayApi (inbound) + ChainSource, BlockVerifier (outbound)
//! ├── adapters/        # Geth JSON-RPC chain source
//! ├── boundary/        # Buffers, handles, status shield, host and enclave endpoints
//! ├── application/     # BlockRelay, SyncTask/StatusTask, TaskPool, RelayContext
//! ├── trusted/         # Header view, receipts-sampling verifier, event sink
//! └── config.rs        # RelayConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod boundary;
pub mod config;
pub mod domain;
pub mod ports;
pub mod trusted;

// Re-exports
pub use adapters::GethRpcSource;
pub use algorithms::{
    decode_hex_bytes, decode_hex_u64, encode_hex, keccak256, rate_per_second,
    should_verify_receipts, IntervalMode, SamplingThreshold,
};
pub use application::{
    build_runtime, BlockRelay, RelayContext, RelayPhase, StatusReport, StatusTask, SyncTask,
    TaskPool, TickingTask,
};
pub use boundary::{
    BoundaryHandle, BoundaryStatus, BufferArena, CrossBoundaryBuffer, Domain, EnclaveEndpoint,
    EnclaveVerifier, HandleTable, HostEndpoint,
};
pub use config::RelayConfig;
pub use domain::{BlockHeight, BlockParam, Hash, RelayError, TxHash};
pub use ports::{BlockVerifier, ChainSource, MockChainSource, RecordingVerifier, RelayApi};
pub use trusted::{
    sample_header_rlp, BroadcastBlockSink, HeaderView, HostServices, OrderedTrieReceiptsRoot,
    ReceiptsRootCalculator, TrustedVerifier, VerifiedBlock, VerifiedBlockSink,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
