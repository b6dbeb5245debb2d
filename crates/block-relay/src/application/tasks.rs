//! # Periodic Tasks
//!
//! Tasks the scheduler drives: the sync task pushing blocks and the status
//! task reporting throughput. Both hold only a weak reference to the relay
//! and stop for good once it is gone.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

use super::relay::BlockRelay;
use crate::algorithms::{rate_per_second, AdaptiveInterval, IntervalMode};
use crate::domain::{BlockHeight, RelayError};
use crate::ports::RelayApi;

/// A task run repeatedly by the scheduler.
#[async_trait]
pub trait TickingTask: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run once. An error ends the task.
    async fn tick(&mut self) -> Result<(), RelayError>;

    /// Delay before the next tick; zero means re-tick right away.
    fn next_delay(&self) -> Duration;
}

/// Pushes the next block on every tick; full speed while blocks come,
/// fixed backoff once they stop.
pub struct SyncTask {
    relay: Weak<BlockRelay>,
    interval: AdaptiveInterval,
}

impl SyncTask {
    /// Sync task for `relay`. A relay accepts one sync task at a time.
    pub fn new(relay: &Arc<BlockRelay>, backoff: Duration) -> Result<Self, RelayError> {
        relay.claim_sync()?;
        Ok(Self {
            relay: Arc::downgrade(relay),
            interval: AdaptiveInterval::new(backoff),
        })
    }

    /// Current polling mode.
    pub fn mode(&self) -> IntervalMode {
        self.interval.mode()
    }
}

#[async_trait]
impl TickingTask for SyncTask {
    fn name(&self) -> &'static str {
        "sync"
    }

    async fn tick(&mut self) -> Result<(), RelayError> {
        let relay = self.relay.upgrade().ok_or(RelayError::RelayDropped)?;
        let pushed = relay.advance().await;

        let previous = self.interval.mode();
        let mode = self.interval.record(pushed);
        if mode != previous {
            match mode {
                IntervalMode::Fast => {
                    debug!("[sync] Blocks available again at #{}", relay.current_height())
                }
                IntervalMode::Backoff => debug!(
                    "[sync] No block at #{}, retrying every {:?}",
                    relay.current_height(),
                    self.interval.delay()
                ),
            }
        }
        Ok(())
    }

    fn next_delay(&self) -> Duration {
        self.interval.delay()
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        if let Some(relay) = self.relay.upgrade() {
            relay.release_sync();
        }
    }
}

/// One throughput sample.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    /// Cursor at sampling time.
    pub height: BlockHeight,
    /// Blocks per second since the previous sample.
    pub rate: f64,
}

/// Logs the cursor and the blocks-per-second rate at a fixed interval.
pub struct StatusTask {
    relay: Weak<BlockRelay>,
    interval: Duration,
    previous: BlockHeight,
    last_report: Option<StatusReport>,
}

impl StatusTask {
    /// Status task for `relay`; the first rate is measured from the cursor
    /// as it is now.
    pub fn new(relay: &Arc<BlockRelay>, interval: Duration) -> Self {
        Self {
            relay: Arc::downgrade(relay),
            interval,
            previous: relay.current_height(),
            last_report: None,
        }
    }

    /// Most recent sample.
    pub fn last_report(&self) -> Option<StatusReport> {
        self.last_report
    }
}

#[async_trait]
impl TickingTask for StatusTask {
    fn name(&self) -> &'static str {
        "status"
    }

    async fn tick(&mut self) -> Result<(), RelayError> {
        let relay = self.relay.upgrade().ok_or(RelayError::RelayDropped)?;
        let height = relay.current_height();
        let rate = rate_per_second(self.previous, height, self.interval);
        info!("[status] BlockNum: {}, Rate: {:.2} blocks/sec", height, rate);

        self.previous = height;
        self.last_report = Some(StatusReport { height, rate });
        Ok(())
    }

    fn next_delay(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{BlockVerifier, MockChainSource, RecordingVerifier};

    fn relay_with_chain(
        heights: std::ops::Range<u64>,
    ) -> (Arc<MockChainSource>, Arc<BlockRelay>, Arc<dyn BlockVerifier>) {
        let source = Arc::new(MockChainSource::with_headers(heights));
        let relay = Arc::new(BlockRelay::new(source.clone()));
        let verifier: Arc<dyn BlockVerifier> = Arc::new(RecordingVerifier::new());
        relay.bind(&verifier);
        (source, relay, verifier)
    }

    #[tokio::test]
    async fn test_sync_mode_follows_outcomes() {
        let (source, relay, _verifier) = relay_with_chain(0..2);
        let mut task = SyncTask::new(&relay, Duration::from_millis(1000)).unwrap();
        assert_eq!(task.mode(), IntervalMode::Fast);

        let mut modes = Vec::new();
        // Two blocks, then nothing, then one more appears.
        for step in 0..4 {
            if step == 3 {
                source.insert_header(2, MockChainSource::header_for(2));
            }
            task.tick().await.unwrap();
            modes.push((task.mode(), task.next_delay()));
        }

        assert_eq!(
            modes,
            vec![
                (IntervalMode::Fast, Duration::ZERO),
                (IntervalMode::Fast, Duration::ZERO),
                (IntervalMode::Backoff, Duration::from_millis(1000)),
                (IntervalMode::Fast, Duration::ZERO),
            ]
        );
        assert_eq!(relay.current_height(), 3);
    }

    #[tokio::test]
    async fn test_sync_task_stops_without_relay() {
        let (_source, relay, _verifier) = relay_with_chain(0..2);
        let mut task = SyncTask::new(&relay, Duration::from_millis(10)).unwrap();
        drop(relay);
        assert!(matches!(task.tick().await, Err(RelayError::RelayDropped)));
    }

    #[test]
    fn test_one_sync_task_per_relay() {
        let (_source, relay, _verifier) = relay_with_chain(0..1);
        let first = SyncTask::new(&relay, Duration::from_millis(10)).unwrap();
        assert!(matches!(
            SyncTask::new(&relay, Duration::from_millis(10)),
            Err(RelayError::SyncAlreadyOwned)
        ));
        drop(first);
        assert!(!relay.is_sync_owned());
        assert!(SyncTask::new(&relay, Duration::from_millis(10)).is_ok());
    }

    #[tokio::test]
    async fn test_status_rate() {
        let (_source, relay, _verifier) = relay_with_chain(100..200);
        relay.configure_start(100).unwrap();
        let mut status = StatusTask::new(&relay, Duration::from_secs(10));

        status.tick().await.unwrap();
        assert_eq!(
            status.last_report(),
            Some(StatusReport {
                height: 100,
                rate: 0.0
            })
        );

        for _ in 0..50 {
            assert!(relay.advance().await);
        }
        status.tick().await.unwrap();
        assert_eq!(
            status.last_report(),
            Some(StatusReport {
                height: 150,
                rate: 5.0
            })
        );
        assert_eq!(status.next_delay(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_status_task_stops_without_relay() {
        let (_source, relay, _verifier) = relay_with_chain(0..1);
        let mut status = StatusTask::new(&relay, Duration::from_secs(10));
        drop(relay);
        assert!(matches!(status.tick().await, Err(RelayError::RelayDropped)));
    }
}
