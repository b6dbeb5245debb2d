//! # Outbound Ports
//!
//! Traits for external collaborators: the chain-data source and the verifier
//! sitting behind the trust boundary.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::algorithms::keccak256;
use crate::domain::{BlockHeight, BlockParam, RelayError, TxHash};

/// Chain-data source - outbound port.
///
/// Stateless request/response; every failure is a `RelayError::Source`.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Raw (RLP) header bytes.
    async fn header(&self, param: BlockParam) -> Result<Vec<u8>, RelayError>;

    /// Raw (RLP) block bytes.
    async fn body(&self, param: BlockParam) -> Result<Vec<u8>, RelayError>;

    /// Raw receipts, in the order the source lists them.
    async fn receipts(&self, param: BlockParam) -> Result<Vec<Vec<u8>>, RelayError>;

    /// Submit a signed raw transaction; returns its 32-byte hash.
    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError>;

    /// Receipt object of a transaction, `None` while it is not yet mined.
    async fn transaction_receipt(
        &self,
        txn_hash: &TxHash,
    ) -> Result<Option<serde_json::Value>, RelayError>;

    /// Current chain height.
    async fn block_number(&self) -> Result<BlockHeight, RelayError>;
}

/// Verifier reachable across the trust boundary - outbound port.
///
/// Accepts an opaque header payload and answers only success or failure.
#[async_trait]
pub trait BlockVerifier: Send + Sync {
    /// Hand one header over for verification.
    async fn recv_block(&self, header: Vec<u8>) -> Result<(), RelayError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockChainState {
    headers: BTreeMap<BlockHeight, Vec<u8>>,
    bodies: HashMap<BlockHeight, Vec<u8>>,
    receipts: HashMap<BlockHeight, Vec<Vec<u8>>>,
    sent: Vec<Vec<u8>>,
    unmined_polls: u32,
}

/// In-memory chain source for testing.
///
/// Heights without a stored header answer with a source error, the way a
/// node does for blocks it has not seen yet.
#[derive(Default)]
pub struct MockChainSource {
    state: Mutex<MockChainState>,
    failing: AtomicBool,
    header_requests: AtomicU64,
    receipt_requests: AtomicU64,
}

impl MockChainSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source holding `header_for(h)` for every height in `heights`.
    pub fn with_headers(heights: impl IntoIterator<Item = BlockHeight>) -> Self {
        let source = Self::new();
        for height in heights {
            source.insert_header(height, Self::header_for(height));
        }
        source
    }

    /// Deterministic placeholder header for `height`.
    pub fn header_for(height: BlockHeight) -> Vec<u8> {
        let mut bytes = b"header-".to_vec();
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    /// Store a header.
    pub fn insert_header(&self, height: BlockHeight, header: Vec<u8>) {
        self.state.lock().headers.insert(height, header);
    }

    /// Store a block body.
    pub fn insert_body(&self, height: BlockHeight, body: Vec<u8>) {
        self.state.lock().bodies.insert(height, body);
    }

    /// Store receipts.
    pub fn insert_receipts(&self, height: BlockHeight, receipts: Vec<Vec<u8>>) {
        self.state.lock().receipts.insert(height, receipts);
    }

    /// Number of `eth_getTransactionReceipt` polls answered with `null`
    /// before a receipt appears.
    pub fn set_unmined_polls(&self, polls: u32) {
        self.state.lock().unmined_polls = polls;
    }

    /// Make every call fail (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Header requests served so far, failed ones included.
    pub fn header_requests(&self) -> u64 {
        self.header_requests.load(Ordering::SeqCst)
    }

    /// Receipt requests served so far, failed ones included.
    pub fn receipt_requests(&self) -> u64 {
        self.receipt_requests.load(Ordering::SeqCst)
    }

    /// Raw transactions submitted so far.
    pub fn sent_transactions(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    fn check_available(&self) -> Result<(), RelayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::Source("Mock failure".to_string()));
        }
        Ok(())
    }

    fn resolve(&self, param: BlockParam) -> Result<BlockHeight, RelayError> {
        let state = self.state.lock();
        match param {
            BlockParam::Number(height) => Ok(height),
            BlockParam::Earliest => Ok(0),
            BlockParam::Latest | BlockParam::Pending => state
                .headers
                .keys()
                .next_back()
                .copied()
                .ok_or_else(|| RelayError::Source("Mock chain is empty".to_string())),
        }
    }
}

#[async_trait]
impl ChainSource for MockChainSource {
    async fn header(&self, param: BlockParam) -> Result<Vec<u8>, RelayError> {
        self.header_requests.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let height = self.resolve(param)?;
        self.state
            .lock()
            .headers
            .get(&height)
            .cloned()
            .ok_or_else(|| RelayError::Source(format!("header {} not found", param)))
    }

    async fn body(&self, param: BlockParam) -> Result<Vec<u8>, RelayError> {
        self.check_available()?;
        let height = self.resolve(param)?;
        self.state
            .lock()
            .bodies
            .get(&height)
            .cloned()
            .ok_or_else(|| RelayError::Source(format!("body {} not found", param)))
    }

    async fn receipts(&self, param: BlockParam) -> Result<Vec<Vec<u8>>, RelayError> {
        self.receipt_requests.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let height = self.resolve(param)?;
        self.state
            .lock()
            .receipts
            .get(&height)
            .cloned()
            .ok_or_else(|| RelayError::Source(format!("receipts {} not found", param)))
    }

    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
        self.check_available()?;
        self.state.lock().sent.push(raw_txn.to_vec());
        Ok(keccak256(raw_txn))
    }

    async fn transaction_receipt(
        &self,
        txn_hash: &TxHash,
    ) -> Result<Option<serde_json::Value>, RelayError> {
        self.check_available()?;
        let mut state = self.state.lock();
        if state.unmined_polls > 0 {
            state.unmined_polls -= 1;
            return Ok(None);
        }
        Ok(Some(serde_json::json!({
            "transactionHash": format!("0x{}", hex::encode(txn_hash)),
            "status": "0x1",
        })))
    }

    async fn block_number(&self) -> Result<BlockHeight, RelayError> {
        self.check_available()?;
        self.resolve(BlockParam::Latest)
    }
}

/// Verifier double that records every header it receives.
#[derive(Default)]
pub struct RecordingVerifier {
    received: Mutex<Vec<Vec<u8>>>,
    failing: AtomicBool,
}

impl RecordingVerifier {
    /// Accepting verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every header (or stop rejecting).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Headers received so far, rejected ones included.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl BlockVerifier for RecordingVerifier {
    async fn recv_block(&self, header: Vec<u8>) -> Result<(), RelayError> {
        self.received.lock().push(header);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::InvalidHeader("Mock rejection".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_serves_headers() {
        let source = MockChainSource::with_headers(0..3);
        let header = source.header(BlockParam::Number(2)).await.unwrap();
        assert_eq!(header, MockChainSource::header_for(2));
        assert_eq!(source.header_requests(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_missing_height() {
        let source = MockChainSource::with_headers(0..3);
        let result = source.header(BlockParam::Number(3)).await;
        assert!(matches!(result, Err(RelayError::Source(_))));
    }

    #[tokio::test]
    async fn test_mock_source_failing() {
        let source = MockChainSource::with_headers(0..3);
        source.set_failing(true);
        assert!(source.header(BlockParam::Number(0)).await.is_err());
        assert!(source.block_number().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_source_latest() {
        let source = MockChainSource::with_headers(5..10);
        assert_eq!(source.block_number().await.unwrap(), 9);
        let latest = source.header(BlockParam::Latest).await.unwrap();
        assert_eq!(latest, MockChainSource::header_for(9));
    }

    #[tokio::test]
    async fn test_mock_source_unmined_polls() {
        let source = MockChainSource::new();
        source.set_unmined_polls(1);
        let hash = source.send_raw_transaction(&[0xab]).await.unwrap();
        assert!(source.transaction_receipt(&hash).await.unwrap().is_none());
        assert!(source.transaction_receipt(&hash).await.unwrap().is_some());
        assert_eq!(source.sent_transactions(), vec![vec![0xab]]);
    }

    #[tokio::test]
    async fn test_recording_verifier() {
        let verifier = RecordingVerifier::new();
        verifier.recv_block(vec![1]).await.unwrap();
        verifier.set_failing(true);
        assert!(verifier.recv_block(vec![2]).await.is_err());
        assert_eq!(verifier.received(), vec![vec![1], vec![2]]);
    }
}
