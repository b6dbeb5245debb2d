//! # Block Relay
//!
//! Application service moving headers from the chain source to the bound
//! verifier, one height at a time.
//!
//! The cursor is the height the next `advance` fetches. It is incremented
//! after a successful fetch and before delivery, so a height whose delivery
//! fails is not retried.

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::domain::{
    invariant_start_unconfigured, BlockHeight, BlockParam, RelayError, TxHash,
    DEFAULT_RECEIPT_POLL_MS,
};
use crate::ports::{BlockVerifier, ChainSource, RelayApi};

/// Whether an `advance` is in progress.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[repr(u8)]
pub enum RelayPhase {
    /// No advance running.
    Idle = 0,
    /// An advance is fetching or delivering.
    Advancing = 1,
}

impl RelayPhase {
    fn from_u8(raw: u8) -> Self {
        if raw == RelayPhase::Advancing as u8 {
            RelayPhase::Advancing
        } else {
            RelayPhase::Idle
        }
    }
}

/// Block relay - the untrusted half of the sync pipeline.
pub struct BlockRelay {
    /// Upstream chain data.
    source: Arc<dyn ChainSource>,
    /// Weak binding to the verifier.
    verifier: RwLock<Option<Weak<dyn BlockVerifier>>>,
    /// Next height to fetch.
    current_height: AtomicU64,
    /// Set once the start height has been configured.
    configured: AtomicBool,
    /// Set while a sync task drives this relay.
    sync_owned: AtomicBool,
    /// `RelayPhase` as a byte.
    phase: AtomicU8,
    /// Poll interval of `wait_for_transaction_receipt`.
    receipt_poll_interval: Duration,
}

impl BlockRelay {
    /// Relay over `source`, cursor at 0, no verifier bound.
    pub fn new(source: Arc<dyn ChainSource>) -> Self {
        Self {
            source,
            verifier: RwLock::new(None),
            current_height: AtomicU64::new(0),
            configured: AtomicBool::new(false),
            sync_owned: AtomicBool::new(false),
            phase: AtomicU8::new(RelayPhase::Idle as u8),
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_MS),
        }
    }

    /// Override the receipt poll interval.
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    /// Current phase.
    pub fn phase(&self) -> RelayPhase {
        RelayPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// True while a verifier is bound and alive.
    pub fn has_verifier(&self) -> bool {
        self.bound_verifier().is_ok()
    }

    fn bound_verifier(&self) -> Result<Arc<dyn BlockVerifier>, RelayError> {
        let binding = self.verifier.read();
        let weak = binding.as_ref().ok_or(RelayError::NoVerifierBound)?;
        weak.upgrade().ok_or(RelayError::VerifierDropped)
    }

    /// Fetch the header at the cursor and deliver it. The cursor moves past
    /// the header once it is fetched, even if delivery then fails.
    async fn try_push_next_block(&self) -> Result<BlockHeight, RelayError> {
        let height = self.current_height.load(Ordering::Acquire);
        let header = self.source.header(BlockParam::Number(height)).await?;
        self.current_height.fetch_add(1, Ordering::AcqRel);

        let verifier = self.bound_verifier()?;
        verifier.recv_block(header).await?;
        Ok(height)
    }

    /// Fetch the header at `height` and deliver it, leaving the cursor alone.
    pub async fn push_block(&self, height: BlockHeight) -> Result<(), RelayError> {
        let header = self.source.header(BlockParam::Number(height)).await?;
        self.bound_verifier()?.recv_block(header).await
    }

    /// Raw block bytes at `height`.
    pub async fn block_by_height(&self, height: BlockHeight) -> Result<Vec<u8>, RelayError> {
        self.source.body(BlockParam::Number(height)).await
    }

    /// Poll the source until the transaction is mined and return its
    /// receipt object.
    pub async fn wait_for_transaction_receipt(
        &self,
        txn_hash: &TxHash,
    ) -> Result<Value, RelayError> {
        loop {
            if let Some(receipt) = self.source.transaction_receipt(txn_hash).await? {
                return Ok(receipt);
            }
            debug!(
                "[block-relay] Transaction 0x{} not mined yet",
                hex::encode(txn_hash)
            );
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    /// Mark the relay as driven by a sync task.
    pub(crate) fn claim_sync(&self) -> Result<(), RelayError> {
        self.sync_owned
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| RelayError::SyncAlreadyOwned)
    }

    /// Undo `claim_sync`.
    pub(crate) fn release_sync(&self) {
        self.sync_owned.store(false, Ordering::Release);
    }

    /// True while a sync task drives this relay.
    pub fn is_sync_owned(&self) -> bool {
        self.sync_owned.load(Ordering::Acquire)
    }
}

#[async_trait]
impl RelayApi for BlockRelay {
    fn current_height(&self) -> BlockHeight {
        self.current_height.load(Ordering::Acquire)
    }

    fn configure_start(&self, height: BlockHeight) -> Result<(), RelayError> {
        let current = self.current_height();
        invariant_start_unconfigured(self.configured.load(Ordering::Acquire), current)?;
        if self
            .configured
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RelayError::AlreadyStarted { height: current });
        }
        self.current_height.store(height, Ordering::Release);
        info!("[block-relay] Starting from block #{}", height);
        Ok(())
    }

    fn bind(&self, verifier: &Arc<dyn BlockVerifier>) {
        *self.verifier.write() = Some(Arc::downgrade(verifier));
        debug!("[block-relay] Verifier bound");
    }

    async fn advance(&self) -> bool {
        if self
            .phase
            .compare_exchange(
                RelayPhase::Idle as u8,
                RelayPhase::Advancing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            warn!("[block-relay] Advance already in progress");
            return false;
        }

        let outcome = AssertUnwindSafe(self.try_push_next_block())
            .catch_unwind()
            .await;
        self.phase.store(RelayPhase::Idle as u8, Ordering::Release);

        match outcome {
            Ok(Ok(height)) => {
                debug!("[block-relay] Pushed block #{}", height);
                true
            }
            Ok(Err(e)) if e.is_binding() => {
                warn!("[block-relay] Advance failed: {}", e);
                false
            }
            Ok(Err(e)) => {
                debug!(
                    "[block-relay] Advance stopped at #{}: {}",
                    self.current_height(),
                    e
                );
                false
            }
            Err(_) => {
                error!("[block-relay] Advance panicked");
                false
            }
        }
    }

    async fn receipts_by_height(&self, height: BlockHeight) -> Result<Vec<Vec<u8>>, RelayError> {
        self.source.receipts(BlockParam::Number(height)).await
    }

    async fn latest_height(&self) -> Result<BlockHeight, RelayError> {
        self.source.block_number().await
    }

    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
        let hash = self.source.send_raw_transaction(raw_txn).await?;
        info!("[block-relay] Transaction sent: 0x{}", hex::encode(hash));
        Ok(hash)
    }
}
