//! # Host Endpoint
//!
//! Untrusted side of the boundary: serves the calls the trusted verifier
//! makes outward. Each call names its relay by handle; variable-length
//! results are allocated in the host arena and released by the trusted
//! caller after it has copied them.

use rlp::Rlp;
use std::sync::Arc;
use tracing::debug;

use super::buffer::{BufferArena, CrossBoundaryBuffer, Domain};
use super::channel::BoundaryChannel;
use super::handle::{BoundaryHandle, HandleTable};
use crate::domain::{BlockHeight, BoundaryStatus, RelayError, TxHash};
use crate::ports::inbound::RelayApi;

/// RLP list of raw receipts, each an opaque byte string.
pub fn encode_receipts_list(receipts: &[Vec<u8>]) -> Vec<u8> {
    rlp::encode_list::<Vec<u8>, Vec<u8>>(receipts).to_vec()
}

/// Inverse of [`encode_receipts_list`].
pub fn decode_receipts_list(bytes: &[u8]) -> Result<Vec<Vec<u8>>, RelayError> {
    let rlp = Rlp::new(bytes);
    if !rlp.is_list() {
        return Err(RelayError::Source(
            "malformed receipts list: not an RLP list".to_string(),
        ));
    }
    rlp.as_list::<Vec<u8>>()
        .map_err(|e| RelayError::Source(format!("malformed receipts list: {}", e)))
}

/// Host-side call table.
pub struct HostEndpoint {
    relays: HandleTable<dyn RelayApi>,
    arena: BufferArena,
    channel: BoundaryChannel,
}

impl Default for HostEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEndpoint {
    /// Endpoint with no registered relays.
    pub fn new() -> Self {
        Self {
            relays: HandleTable::new(),
            arena: BufferArena::new(Domain::Untrusted),
            channel: BoundaryChannel::new("host"),
        }
    }

    /// Expose `relay` to the trusted side. The endpoint keeps only a weak
    /// reference.
    pub fn register(&self, relay: &Arc<dyn RelayApi>) -> BoundaryHandle {
        let handle = self.relays.register(relay);
        debug!("[host] Registered relay as {}", handle);
        handle
    }

    /// Withdraw a relay handle.
    pub fn revoke(&self, handle: BoundaryHandle) -> bool {
        self.relays.revoke(handle)
    }

    /// Arena holding buffers this endpoint has handed out.
    pub fn arena(&self) -> &BufferArena {
        &self.arena
    }

    /// GetReceiptsByHeight: RLP list of the raw receipts at `height`.
    pub async fn get_receipts_by_height(
        &self,
        handle: BoundaryHandle,
        height: BlockHeight,
    ) -> Result<CrossBoundaryBuffer, BoundaryStatus> {
        self.channel
            .call("get_receipts_by_height", async {
                let relay = self.relays.resolve(handle)?;
                let receipts = relay.receipts_by_height(height).await?;
                debug!("[host] {} receipts for block #{}", receipts.len(), height);
                Ok::<_, RelayError>(self.arena.allocate(encode_receipts_list(&receipts)))
            })
            .await
    }

    /// GetLatestHeight: head height of the relay's chain source.
    pub async fn get_latest_height(
        &self,
        handle: BoundaryHandle,
    ) -> Result<BlockHeight, BoundaryStatus> {
        self.channel
            .call("get_latest_height", async {
                let relay = self.relays.resolve(handle)?;
                relay.latest_height().await
            })
            .await
    }

    /// SendRawTransaction: the input is copied before it is used.
    pub async fn send_raw_transaction(
        &self,
        handle: BoundaryHandle,
        raw_txn: &[u8],
    ) -> Result<TxHash, BoundaryStatus> {
        let raw_txn = raw_txn.to_vec();
        self.channel
            .call("send_raw_transaction", async {
                let relay = self.relays.resolve(handle)?;
                relay.send_raw_transaction(&raw_txn).await
            })
            .await
    }
}
