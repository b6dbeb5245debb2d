//! # Trusted Verifier
//!
//! Receives raw headers across the boundary. For a hash-sampled subset of
//! blocks it pulls the receipts back from the host and checks them against
//! the header's receipts root before reporting the block as verified.

use async_trait::async_trait;
use keccak_hasher::KeccakHasher;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::header::HeaderView;
use super::sink::{VerifiedBlock, VerifiedBlockSink};
use crate::algorithms::SamplingThreshold;
use crate::domain::{invariant_sampling_rate, BlockHeight, Hash, RelayError, TxHash, HASH_LEN};

/// Host calls available to the trusted side.
#[async_trait]
pub trait HostServices: Send + Sync {
    /// Raw receipts of the block at `height`.
    async fn receipts_by_height(&self, height: BlockHeight) -> Result<Vec<Vec<u8>>, RelayError>;

    /// Head height of the host's chain source.
    async fn latest_height(&self) -> Result<BlockHeight, RelayError>;

    /// Submit a signed raw transaction through the host.
    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError>;
}

/// Receipts-root computation over raw receipts in block order.
pub trait ReceiptsRootCalculator: Send + Sync {
    /// Root of the ordered receipts trie.
    fn receipts_root(&self, receipts: &[Vec<u8>]) -> Hash;
}

/// Ethereum ordered-trie root (keys are RLP-encoded indices).
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderedTrieReceiptsRoot;

impl ReceiptsRootCalculator for OrderedTrieReceiptsRoot {
    fn receipts_root(&self, receipts: &[Vec<u8>]) -> Hash {
        let root = triehash::ordered_trie_root::<KeccakHasher, _>(receipts.iter());
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(root.as_ref());
        out
    }
}

/// Header verifier living on the trusted side.
pub struct TrustedVerifier {
    host: Arc<dyn HostServices>,
    roots: Arc<dyn ReceiptsRootCalculator>,
    sink: Arc<dyn VerifiedBlockSink>,
    threshold: AtomicU8,
    verified: AtomicU64,
    receipts_checked: AtomicU64,
}

impl TrustedVerifier {
    /// Verifier sampling receipts at `rate`.
    pub fn new(
        host: Arc<dyn HostServices>,
        roots: Arc<dyn ReceiptsRootCalculator>,
        sink: Arc<dyn VerifiedBlockSink>,
        rate: f64,
    ) -> Result<Self, RelayError> {
        invariant_sampling_rate(rate)?;
        Ok(Self {
            host,
            roots,
            sink,
            threshold: AtomicU8::new(SamplingThreshold::from_rate(rate).raw()),
            verified: AtomicU64::new(0),
            receipts_checked: AtomicU64::new(0),
        })
    }

    /// Swap in the threshold for `rate`; blocks appended afterwards use it.
    pub fn set_receipt_rate(&self, rate: f64) -> Result<(), RelayError> {
        invariant_sampling_rate(rate)?;
        let threshold = SamplingThreshold::from_rate(rate);
        self.threshold.store(threshold.raw(), Ordering::Release);
        info!(
            "[verifier] Receipt rate set to {:.2} (threshold {})",
            rate,
            threshold.raw()
        );
        Ok(())
    }

    /// Current sampling threshold.
    pub fn threshold(&self) -> SamplingThreshold {
        SamplingThreshold::from_raw(self.threshold.load(Ordering::Acquire))
    }

    /// Blocks accepted so far.
    pub fn blocks_verified(&self) -> u64 {
        self.verified.load(Ordering::Relaxed)
    }

    /// Blocks whose receipts were checked.
    pub fn receipts_checked(&self) -> u64 {
        self.receipts_checked.load(Ordering::Relaxed)
    }

    /// Accept one raw header.
    pub async fn append_block(&self, raw_header: &[u8]) -> Result<VerifiedBlock, RelayError> {
        let header = HeaderView::decode(raw_header)?;

        let receipts_checked = if self.threshold().selects(&header.hash) {
            self.check_receipts(&header).await?;
            self.receipts_checked.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        };

        let block = VerifiedBlock {
            number: header.number,
            hash: header.hash,
            receipts_checked,
        };
        self.verified.fetch_add(1, Ordering::Relaxed);
        self.sink.publish(block.clone());
        Ok(block)
    }

    async fn check_receipts(&self, header: &HeaderView) -> Result<(), RelayError> {
        let receipts = self.host.receipts_by_height(header.number).await?;
        let computed = self.roots.receipts_root(&receipts);
        if computed != header.receipts_root {
            warn!(
                "[verifier] Receipts root mismatch at #{}: header 0x{}, computed 0x{}",
                header.number,
                hex::encode(header.receipts_root),
                hex::encode(computed)
            );
            return Err(RelayError::VerificationMismatch {
                height: header.number,
                expected: header.receipts_root,
                computed,
            });
        }
        debug!(
            "[verifier] {} receipts verified for #{}",
            receipts.len(),
            header.number
        );
        Ok(())
    }

    /// Head height as reported by the host.
    pub async fn latest_height(&self) -> Result<BlockHeight, RelayError> {
        self.host.latest_height().await
    }

    /// Submit a transaction through the host.
    pub async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
        let hash = self.host.send_raw_transaction(raw_txn).await?;
        info!("[verifier] Transaction submitted: 0x{}", hex::encode(hash));
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::keccak256;
    use crate::trusted::header::sample_header_rlp;
    use crate::trusted::sink::BroadcastBlockSink;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// keccak256(rlp("")): root of an empty trie.
    const EMPTY_TRIE_ROOT: &str =
        "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";

    #[derive(Default)]
    struct FakeHost {
        receipts: Mutex<HashMap<BlockHeight, Vec<Vec<u8>>>>,
        requests: Mutex<Vec<BlockHeight>>,
    }

    #[async_trait]
    impl HostServices for FakeHost {
        async fn receipts_by_height(
            &self,
            height: BlockHeight,
        ) -> Result<Vec<Vec<u8>>, RelayError> {
            self.requests.lock().push(height);
            self.receipts
                .lock()
                .get(&height)
                .cloned()
                .ok_or_else(|| RelayError::Boundary(crate::domain::BoundaryStatus::Unexpected))
        }

        async fn latest_height(&self) -> Result<BlockHeight, RelayError> {
            Ok(42)
        }

        async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
            Ok(keccak256(raw_txn))
        }
    }

    fn receipts() -> Vec<Vec<u8>> {
        vec![vec![0xf8, 0x01, 0x02], vec![0x02, 0xc0], vec![0x33; 40]]
    }

    fn verifier(host: Arc<FakeHost>, rate: f64) -> (TrustedVerifier, Arc<BroadcastBlockSink>) {
        let sink = Arc::new(BroadcastBlockSink::new(32));
        let verifier =
            TrustedVerifier::new(host, Arc::new(OrderedTrieReceiptsRoot), sink.clone(), rate)
                .unwrap();
        (verifier, sink)
    }

    /// Header at the first height from `start` whose hash the rate-1.0
    /// threshold selects.
    fn sampled_header(start: u64, root: Hash) -> (u64, Vec<u8>) {
        (start..)
            .map(|n| (n, sample_header_rlp(n, root)))
            .find(|(_, raw)| SamplingThreshold::from_rate(1.0).selects(&keccak256(raw)))
            .unwrap()
    }

    #[test]
    fn test_empty_receipts_root() {
        let root = OrderedTrieReceiptsRoot.receipts_root(&[]);
        assert_eq!(hex::encode(root), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_receipts_root_depends_on_order() {
        let mut reversed = receipts();
        reversed.reverse();
        assert_ne!(
            OrderedTrieReceiptsRoot.receipts_root(&receipts()),
            OrderedTrieReceiptsRoot.receipts_root(&reversed)
        );
    }

    #[tokio::test]
    async fn test_rate_zero_never_pulls_receipts() {
        let host = Arc::new(FakeHost::default());
        let (verifier, sink) = verifier(host.clone(), 0.0);
        let mut events = sink.subscribe();

        for n in 0..20 {
            let block = verifier
                .append_block(&sample_header_rlp(n, [0u8; 32]))
                .await
                .unwrap();
            assert!(!block.receipts_checked);
        }
        assert!(host.requests.lock().is_empty());
        assert_eq!(verifier.blocks_verified(), 20);
        assert_eq!(sink.blocks_published(), 20);
        assert_eq!(events.recv().await.unwrap().number, 0);
    }

    #[tokio::test]
    async fn test_sampled_block_checks_receipts() {
        let host = Arc::new(FakeHost::default());
        let root = OrderedTrieReceiptsRoot.receipts_root(&receipts());
        let (height, raw) = sampled_header(100, root);
        host.receipts.lock().insert(height, receipts());

        let (verifier, _sink) = verifier(host.clone(), 1.0);
        let block = verifier.append_block(&raw).await.unwrap();

        assert!(block.receipts_checked);
        assert_eq!(block.number, height);
        assert_eq!(*host.requests.lock(), vec![height]);
        assert_eq!(verifier.receipts_checked(), 1);
    }

    #[tokio::test]
    async fn test_root_mismatch_rejected() {
        let host = Arc::new(FakeHost::default());
        let (height, raw) = sampled_header(200, [0x11u8; 32]);
        host.receipts.lock().insert(height, receipts());

        let (verifier, sink) = verifier(host, 1.0);
        let result = verifier.append_block(&raw).await;

        assert!(matches!(
            result,
            Err(RelayError::VerificationMismatch { height: h, .. }) if h == height
        ));
        assert_eq!(verifier.blocks_verified(), 0);
        assert_eq!(sink.blocks_published(), 0);
    }

    #[tokio::test]
    async fn test_set_receipt_rate() {
        let host = Arc::new(FakeHost::default());
        let (verifier, _sink) = verifier(host, 0.0);
        assert_eq!(verifier.threshold(), SamplingThreshold::NEVER);

        verifier.set_receipt_rate(0.5).unwrap();
        assert_eq!(verifier.threshold().raw(), 127);
        assert!(verifier.set_receipt_rate(f64::NAN).is_err());
        assert_eq!(verifier.threshold().raw(), 127);
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        let host = Arc::new(FakeHost::default());
        let (verifier, _sink) = verifier(host, 1.0);
        assert!(matches!(
            verifier.append_block(b"not a header").await,
            Err(RelayError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_host_passthrough_calls() {
        let host = Arc::new(FakeHost::default());
        let (verifier, _sink) = verifier(host, 0.0);
        assert_eq!(verifier.latest_height().await.unwrap(), 42);
        assert_eq!(
            verifier.send_raw_transaction(&[0xaa]).await.unwrap(),
            keccak256(&[0xaa])
        );
    }
}
