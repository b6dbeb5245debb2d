//! # Relay Context
//!
//! Wires a relay to its chain source, the trust boundary and the scheduler.

use std::sync::Arc;
use tracing::info;

use super::relay::BlockRelay;
use super::scheduler::TaskPool;
use super::tasks::{StatusTask, SyncTask};
use crate::boundary::{EnclaveEndpoint, EnclaveVerifier, HostEndpoint};
use crate::config::RelayConfig;
use crate::domain::RelayError;
use crate::ports::{BlockVerifier, ChainSource, RelayApi};
use crate::trusted::{ReceiptsRootCalculator, VerifiedBlockSink};

/// A configured relay plus the boundary endpoints serving it.
pub struct RelayContext {
    config: RelayConfig,
    relay: Arc<BlockRelay>,
    host: Arc<HostEndpoint>,
    enclave: Arc<EnclaveEndpoint>,
}

impl RelayContext {
    /// Validate `config` and build a relay over `source`.
    pub fn new(config: RelayConfig, source: Arc<dyn ChainSource>) -> Result<Self, RelayError> {
        config.validate()?;
        let relay =
            BlockRelay::new(source).with_receipt_poll_interval(config.receipt_poll_interval());
        Ok(Self {
            config,
            relay: Arc::new(relay),
            host: Arc::new(HostEndpoint::new()),
            enclave: Arc::new(EnclaveEndpoint::new()),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The relay.
    pub fn relay(&self) -> &Arc<BlockRelay> {
        &self.relay
    }

    /// Host endpoint serving the trusted side.
    pub fn host(&self) -> &Arc<HostEndpoint> {
        &self.host
    }

    /// Enclave endpoint holding verifier instances.
    pub fn enclave(&self) -> &Arc<EnclaveEndpoint> {
        &self.enclave
    }

    /// Create a trusted verifier at the configured receipt rate and bind the
    /// relay to it.
    ///
    /// The relay holds the binding weakly: the caller keeps the returned
    /// verifier alive for as long as blocks should flow.
    pub fn attach_verifier(
        &self,
        roots: Arc<dyn ReceiptsRootCalculator>,
        sink: Arc<dyn VerifiedBlockSink>,
    ) -> Result<Arc<EnclaveVerifier>, RelayError> {
        let relay: Arc<dyn RelayApi> = self.relay.clone();
        let relay_handle = self.host.register(&relay);
        let handle = self.enclave.init(
            self.host.clone(),
            relay_handle,
            roots,
            sink,
            self.config.receipt_rate,
        )?;

        let verifier = Arc::new(EnclaveVerifier::new(self.enclave.clone(), handle));
        let binding: Arc<dyn BlockVerifier> = verifier.clone();
        self.relay.bind(&binding);
        Ok(verifier)
    }

    /// Set the start height, then schedule the sync and status tasks.
    pub fn start(&self, pool: &mut TaskPool) -> Result<(), RelayError> {
        self.relay.configure_start(self.config.start_height)?;
        let sync = SyncTask::new(&self.relay, self.config.backoff_interval())?;
        let status = StatusTask::new(&self.relay, self.config.status_interval());

        pool.spawn(status);
        pool.spawn(sync);
        info!(
            "[block-relay] Sending blocks from #{} (backoff {:?}, status every {:?})",
            self.config.start_height,
            self.config.backoff_interval(),
            self.config.status_interval()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockChainSource;
    use crate::trusted::{sample_header_rlp, BroadcastBlockSink, OrderedTrieReceiptsRoot};
    use std::time::Duration;

    #[test]
    fn test_invalid_config_rejected() {
        let config = RelayConfig {
            worker_threads: 0,
            ..RelayConfig::for_testing()
        };
        let result = RelayContext::new(config, Arc::new(MockChainSource::new()));
        assert!(matches!(result, Err(RelayError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let context =
            RelayContext::new(RelayConfig::for_testing(), Arc::new(MockChainSource::new()))
                .unwrap();
        let mut pool = TaskPool::new();
        context.start(&mut pool).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(matches!(
            context.start(&mut pool),
            Err(RelayError::AlreadyStarted { .. })
        ));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_blocks_flow_to_sink() {
        let source = Arc::new(MockChainSource::new());
        for n in 10..15 {
            source.insert_header(n, sample_header_rlp(n, [0u8; 32]));
        }
        let config = RelayConfig {
            start_height: 10,
            ..RelayConfig::for_testing()
        };
        let context = RelayContext::new(config, source).unwrap();
        let sink = Arc::new(BroadcastBlockSink::new(16));
        let mut blocks = sink.subscribe();
        let _verifier = context
            .attach_verifier(Arc::new(OrderedTrieReceiptsRoot), sink)
            .unwrap();

        let mut pool = TaskPool::new();
        context.start(&mut pool).unwrap();

        for expected in 10..15 {
            let block = tokio::time::timeout(Duration::from_secs(5), blocks.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(block.number, expected);
            assert!(!block.receipts_checked);
        }
        pool.shutdown().await;
        assert_eq!(context.relay().current_height(), 15);
    }
}
