//! # Domain Errors
//!
//! Error types for the block relay.
//!
//! Every failure on the untrusted side collapses into one of a few kinds; the
//! relay itself only distinguishes "succeeded" from "failed".

use thiserror::Error;

use super::value_objects::BoundaryStatus;

/// Hash type alias (32-byte Keccak-256)
pub type Hash = [u8; 32];

/// Block relay error types.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Upstream fetch failed or returned malformed data
    /// (transport, status code, JSON shape, hex prefix, length).
    #[error("Chain source unavailable or malformed: {0}")]
    Source(String),

    /// A trust-boundary call returned a non-success status.
    #[error("Boundary call failed: {0}")]
    Boundary(BoundaryStatus),

    /// No verifier has been bound to the relay.
    #[error("No verifier bound to relay")]
    NoVerifierBound,

    /// The bound verifier has been dropped.
    #[error("Bound verifier is no longer available")]
    VerifierDropped,

    /// The relay a task or handle refers to has been dropped.
    #[error("Block relay is no longer available")]
    RelayDropped,

    /// Receipts root computed from fetched receipts does not match the header.
    #[error("Receipts root mismatch at height {height}")]
    VerificationMismatch {
        /// Height of the offending block
        height: u64,
        /// Root carried by the header
        expected: Hash,
        /// Root computed from the fetched receipts
        computed: Hash,
    },

    /// The start height can only be configured before the relay advances.
    #[error("Relay already started at height {height}")]
    AlreadyStarted {
        /// Cursor at the time of the rejected call
        height: u64,
    },

    /// Another sync task already drives this relay.
    #[error("Relay already has a sync task")]
    SyncAlreadyOwned,

    /// Header bytes could not be decoded.
    #[error("Invalid block header: {0}")]
    InvalidHeader(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// Wrap any displayable upstream failure as a source error.
    pub fn source<E: std::fmt::Display>(err: E) -> Self {
        RelayError::Source(err.to_string())
    }

    /// True for failures of the verifier binding rather than the data path.
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            RelayError::NoVerifierBound | RelayError::VerifierDropped | RelayError::RelayDropped
        )
    }
}

impl From<BoundaryStatus> for RelayError {
    fn from(status: BoundaryStatus) -> Self {
        RelayError::Boundary(status)
    }
}
