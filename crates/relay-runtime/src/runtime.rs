//! # Relay Runtime
//!
//! Owns a relay context, the verifier it is bound to and the task pool, and
//! runs them between `start` and `shutdown`.

use std::sync::Arc;

use anyhow::{Context, Result};
use block_relay::{
    BroadcastBlockSink, ChainSource, EnclaveVerifier, GethRpcSource, OrderedTrieReceiptsRoot,
    RelayApi, RelayConfig, RelayContext, TaskPool, VerifiedBlock,
};
use tokio::sync::broadcast;
use tracing::info;

use crate::throughput::{self, ThroughputSample};

/// The relay runtime.
pub struct RelayRuntime {
    /// Relay, boundary endpoints and configuration.
    context: RelayContext,
    /// Verified-block events.
    sink: Arc<BroadcastBlockSink>,
    /// Verifier the relay is bound to; the binding is weak, so it lives here.
    verifier: Arc<EnclaveVerifier>,
    /// Sync and status tasks.
    pool: TaskPool,
}

impl RelayRuntime {
    /// Runtime reading from the Geth endpoint in `config`.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let source = GethRpcSource::new(config.source_url.clone(), config.request_timeout())
            .context("Failed to create chain source client")?;
        Self::with_source(config, Arc::new(source))
    }

    /// Runtime over an arbitrary chain source.
    pub fn with_source(config: RelayConfig, source: Arc<dyn ChainSource>) -> Result<Self> {
        let context = RelayContext::new(config, source).context("Invalid relay configuration")?;
        let sink = Arc::new(BroadcastBlockSink::default());
        let verifier = context
            .attach_verifier(Arc::new(OrderedTrieReceiptsRoot), sink.clone())
            .context("Failed to initialize verifier")?;

        Ok(Self {
            context,
            sink,
            verifier,
            pool: TaskPool::new(),
        })
    }

    /// Start the sync and status tasks. Must run inside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let config = self.context.config();
        info!("===========================================");
        info!("  Block Relay Runtime v{}", block_relay::VERSION);
        info!("  Source:       {}", config.source_url);
        info!("  Start height: {}", config.start_height);
        info!("  Receipt rate: {:.2}", config.receipt_rate);
        info!("===========================================");

        self.context
            .start(&mut self.pool)
            .context("Failed to start sending blocks")?;
        Ok(())
    }

    /// Receive blocks as the verifier accepts them.
    pub fn subscribe(&self) -> broadcast::Receiver<VerifiedBlock> {
        self.sink.subscribe()
    }

    /// Relay context.
    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    /// Run the throughput evaluation over `start..end`.
    pub async fn throughput(
        &self,
        start: u64,
        end: u64,
        rates: &[f64],
    ) -> Result<Vec<ThroughputSample>> {
        info!(
            "[throughput] Pushing blocks {}..{} at {} receipt rates",
            start,
            end,
            rates.len()
        );
        throughput::evaluate(self.context.relay(), &self.verifier, start, end, rates)
            .await
            .context("Throughput evaluation failed")
    }

    /// Signal the tasks to stop and wait for in-flight ticks.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        self.pool.shutdown().await;
        info!(
            "Shutdown complete at block #{}",
            self.context.relay().current_height()
        );
    }
}

/// Resolve on SIGINT or SIGTERM; returns the signal name.
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                Ok("SIGINT")
            }
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl-C")
    }
}
