//! # Relay Runtime Library
//!
//! Pieces of the `relay-runtime` binary, exposed for testing: configuration
//! loading, the command line, the runtime itself and the throughput
//! evaluation. The entry point is `main.rs`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod runtime;
pub mod throughput;

pub use cli::{Cli, Command, OverrideArgs, ThroughputArgs};
pub use config::{load_config, ConfigError, ConfigOverrides};
pub use runtime::{shutdown_signal, RelayRuntime};
pub use throughput::ThroughputSample;
