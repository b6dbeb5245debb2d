//! # Verified Block Sink
//!
//! Where the trusted verifier reports blocks it has accepted.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{BlockHeight, Hash};

/// Default channel capacity for [`BroadcastBlockSink`].
pub const DEFAULT_SINK_CAPACITY: usize = 1024;

/// A block accepted by the trusted verifier.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifiedBlock {
    /// Block number.
    pub number: BlockHeight,
    /// Header hash.
    pub hash: Hash,
    /// Whether the receipts root was checked for this block.
    pub receipts_checked: bool,
}

/// Consumer of verified blocks.
pub trait VerifiedBlockSink: Send + Sync {
    /// Deliver one block. Returns the number of consumers reached.
    fn publish(&self, block: VerifiedBlock) -> usize;

    /// Total blocks delivered.
    fn blocks_published(&self) -> u64;
}

/// Fan-out sink over `tokio::sync::broadcast`.
///
/// Publishing with no subscribers is not an error; the block is counted and
/// dropped.
pub struct BroadcastBlockSink {
    sender: broadcast::Sender<VerifiedBlock>,
    published: AtomicU64,
}

impl Default for BroadcastBlockSink {
    fn default() -> Self {
        Self::new(DEFAULT_SINK_CAPACITY)
    }
}

impl BroadcastBlockSink {
    /// Sink buffering up to `capacity` blocks per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// New receiver of blocks published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<VerifiedBlock> {
        self.sender.subscribe()
    }

    /// Active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl VerifiedBlockSink for BroadcastBlockSink {
    fn publish(&self, block: VerifiedBlock) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let number = block.number;
        let reached = self.sender.send(block).unwrap_or(0);
        trace!("[verifier] Block #{} delivered to {} subscribers", number, reached);
        reached
    }

    fn blocks_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64) -> VerifiedBlock {
        VerifiedBlock {
            number,
            hash: [number as u8; 32],
            receipts_checked: false,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let sink = BroadcastBlockSink::new(8);
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        assert_eq!(sink.publish(block(1)), 2);
        assert_eq!(first.recv().await.unwrap(), block(1));
        assert_eq!(second.recv().await.unwrap(), block(1));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let sink = BroadcastBlockSink::default();
        assert_eq!(sink.publish(block(1)), 0);
        assert_eq!(sink.blocks_published(), 1);
        assert_eq!(sink.subscriber_count(), 0);
    }
}
