//! # Throughput Evaluation
//!
//! Pushes a fixed block range through the verifier once per receipt rate and
//! reports blocks per second for each pass.

use block_relay::algorithms::blocks_per_second;
use block_relay::{BlockHeight, BlockRelay, EnclaveVerifier, RelayError};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Result of one pass over the block range.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ThroughputSample {
    /// Receipt rate used for the pass.
    pub receipt_rate: f64,
    /// Blocks pushed.
    pub blocks: u64,
    /// Pushes that failed.
    pub failed: u64,
    /// Wall time of the pass.
    pub elapsed: Duration,
    /// Blocks per second.
    pub blocks_per_second: f64,
}

/// Push `start..end` once per rate in `rates`. The rate is reset to zero
/// afterwards.
pub async fn evaluate(
    relay: &BlockRelay,
    verifier: &EnclaveVerifier,
    start: BlockHeight,
    end: BlockHeight,
    rates: &[f64],
) -> Result<Vec<ThroughputSample>, RelayError> {
    let blocks = end.saturating_sub(start);
    let mut samples = Vec::with_capacity(rates.len());

    for &rate in rates {
        verifier.set_receipt_rate(rate).await?;

        let started = Instant::now();
        let mut failed = 0;
        for height in start..end {
            if let Err(e) = relay.push_block(height).await {
                warn!("[throughput] Block #{} failed: {}", height, e);
                failed += 1;
            }
        }
        let elapsed = started.elapsed();

        let sample = ThroughputSample {
            receipt_rate: rate,
            blocks,
            failed,
            elapsed,
            blocks_per_second: blocks_per_second(blocks, elapsed),
        };
        info!(
            "[throughput] Receipt {:.0}%: pushed {} blocks ({} failed) in {:.3}s, {:.2} blocks/sec",
            rate * 100.0,
            sample.blocks,
            sample.failed,
            elapsed.as_secs_f64(),
            sample.blocks_per_second
        );
        samples.push(sample);
    }

    verifier.set_receipt_rate(0.0).await?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_relay::{
        sample_header_rlp, BroadcastBlockSink, MockChainSource, OrderedTrieReceiptsRoot,
        ReceiptsRootCalculator, RelayApi, RelayConfig, RelayContext, VerifiedBlockSink,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_evaluate_pushes_range_per_rate() {
        let source = Arc::new(MockChainSource::new());
        let root = OrderedTrieReceiptsRoot.receipts_root(&[]);
        for n in 100..110 {
            source.insert_header(n, sample_header_rlp(n, root));
            source.insert_receipts(n, Vec::new());
        }
        let context = RelayContext::new(RelayConfig::for_testing(), source.clone()).unwrap();
        let sink = Arc::new(BroadcastBlockSink::default());
        let verifier = context
            .attach_verifier(Arc::new(OrderedTrieReceiptsRoot), sink.clone())
            .unwrap();

        let samples = evaluate(context.relay(), &verifier, 100, 110, &[0.0, 1.0])
            .await
            .unwrap();

        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.blocks == 10 && s.failed == 0));
        assert_eq!(samples[1].receipt_rate, 1.0);
        assert_eq!(sink.blocks_published(), 20);
        assert!(source.receipt_requests() > 0);
        assert_eq!(context.relay().current_height(), 0);
    }

    #[tokio::test]
    async fn test_missing_blocks_are_counted() {
        let source = Arc::new(MockChainSource::new());
        source.insert_header(0, sample_header_rlp(0, [0u8; 32]));
        let context = RelayContext::new(RelayConfig::for_testing(), source).unwrap();
        let verifier = context
            .attach_verifier(
                Arc::new(OrderedTrieReceiptsRoot),
                Arc::new(BroadcastBlockSink::default()),
            )
            .unwrap();

        let samples = evaluate(context.relay(), &verifier, 0, 3, &[0.0]).await.unwrap();
        assert_eq!(samples[0].failed, 2);
    }
}
