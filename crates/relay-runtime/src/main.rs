//! # Block Relay Runtime
//!
//! Entry point of the block relay.
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line
//! 2. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 3. Load configuration (defaults → file → env → flags)
//! 4. Build a tokio runtime with `worker_threads` workers
//! 5. Wire chain source → relay → boundary → trusted verifier
//! 6. `run`: start the sync and status tasks and wait for SIGINT/SIGTERM;
//!    `throughput`: push the block range once per receipt rate

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use block_relay::{build_runtime, RelayConfig};
use relay_runtime::{load_config, shutdown_signal, Cli, Command, ConfigOverrides, RelayRuntime};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let overrides = ConfigOverrides::from(&cli.overrides);
    let config = load_config(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    let runtime = build_runtime(config.worker_threads).context("Failed to build tokio runtime")?;
    runtime.block_on(async move {
        match cli.subcommand() {
            Command::Run => run(config).await,
            Command::Throughput(args) => {
                let relay = RelayRuntime::new(config)?;
                relay.throughput(args.start, args.end, &args.rates).await?;
                Ok(())
            }
        }
    })
}

async fn run(config: RelayConfig) -> Result<()> {
    let mut relay = RelayRuntime::new(config)?;
    relay.start()?;

    info!("Relay is running. Press Ctrl+C to stop.");
    let signal = shutdown_signal()
        .await
        .context("Failed to listen for shutdown signals")?;
    info!("Signal received: {}", signal);

    relay.shutdown().await;
    Ok(())
}
