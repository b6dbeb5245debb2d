//! # Domain Value Objects
//!
//! Immutable value types shared by the relay, the boundary and the verifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position in the chain, used as the sync cursor.
pub type BlockHeight = u64;

/// Identifier of a submitted transaction.
pub type TxHash = [u8; 32];

/// Block selector understood by the chain source.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlockParam {
    /// A concrete height.
    Number(BlockHeight),
    /// The most recent block.
    Latest,
    /// The genesis block.
    Earliest,
    /// The pending block.
    Pending,
}

impl BlockParam {
    /// Render as a JSON-RPC parameter (`0x`-prefixed hex or tag).
    pub fn to_rpc_param(&self) -> String {
        match self {
            BlockParam::Number(height) => format!("{:#x}", height),
            BlockParam::Latest => "latest".to_string(),
            BlockParam::Earliest => "earliest".to_string(),
            BlockParam::Pending => "pending".to_string(),
        }
    }
}

impl From<BlockHeight> for BlockParam {
    fn from(height: BlockHeight) -> Self {
        BlockParam::Number(height)
    }
}

impl fmt::Display for BlockParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rpc_param())
    }
}

/// Status code returned by every trust-boundary call.
///
/// Nothing richer than this crosses the boundary; errors and panics on the
/// callee side are converted into one of these before returning.
#[derive(Clone, Copy, Debug, Error, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BoundaryStatus {
    /// The call completed.
    #[error("success")]
    Success,
    /// The callee failed (error or panic) while serving the call.
    #[error("unexpected failure on callee side")]
    Unexpected,
    /// The handle does not resolve to a live target.
    #[error("invalid or expired handle")]
    InvalidHandle,
    /// An input or buffer did not satisfy the call contract.
    #[error("invalid parameter")]
    InvalidParameter,
}

impl BoundaryStatus {
    /// True only for [`BoundaryStatus::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, BoundaryStatus::Success)
    }

    /// Convert into a `Result`, keeping non-success statuses as the error.
    pub fn into_result(self) -> Result<(), BoundaryStatus> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_param_number() {
        assert_eq!(BlockParam::Number(1).to_rpc_param(), "0x1");
        assert_eq!(BlockParam::Number(8875000).to_rpc_param(), "0x876bf8");
        assert_eq!(BlockParam::Number(0).to_rpc_param(), "0x0");
    }

    #[test]
    fn test_block_param_tags() {
        assert_eq!(BlockParam::Latest.to_rpc_param(), "latest");
        assert_eq!(BlockParam::Earliest.to_string(), "earliest");
        assert_eq!(BlockParam::Pending.to_string(), "pending");
    }

    #[test]
    fn test_boundary_status_result() {
        assert!(BoundaryStatus::Success.into_result().is_ok());
        assert_eq!(
            BoundaryStatus::InvalidHandle.into_result(),
            Err(BoundaryStatus::InvalidHandle)
        );
    }
}
