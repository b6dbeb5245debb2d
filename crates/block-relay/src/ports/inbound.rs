//! # Inbound Ports
//!
//! API trait defining what the block relay offers to tasks and to the host
//! side of the trust boundary.

use async_trait::async_trait;
use std::sync::Arc;

use super::outbound::BlockVerifier;
use crate::domain::{BlockHeight, RelayError, TxHash};

/// Block relay API - inbound port.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Height the next `advance` will fetch. Lock-free.
    fn current_height(&self) -> BlockHeight;

    /// One-time start height; rejected once the relay has been configured
    /// or has advanced.
    fn configure_start(&self, height: BlockHeight) -> Result<(), RelayError>;

    /// Replace the verifier binding. The relay keeps only a weak reference.
    fn bind(&self, verifier: &Arc<dyn BlockVerifier>);

    /// Fetch the header at the cursor and deliver it to the bound verifier.
    ///
    /// Never fails loudly: every error (and panic) becomes `false`.
    async fn advance(&self) -> bool;

    /// Raw receipts of the block at `height`, in upstream order.
    async fn receipts_by_height(&self, height: BlockHeight) -> Result<Vec<Vec<u8>>, RelayError>;

    /// Current head height of the chain source.
    async fn latest_height(&self) -> Result<BlockHeight, RelayError>;

    /// Submit a signed raw transaction to the chain source.
    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError>;
}
