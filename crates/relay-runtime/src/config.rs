//! # Runtime Configuration
//!
//! Builds the `RelayConfig` the runtime runs with. Layers, later wins:
//!
//! 1. `RelayConfig::default()`
//! 2. JSON file (`--config`)
//! 3. `RELAY_*` environment variables
//! 4. Command-line flags
//!
//! The merged result is validated before it is returned.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use block_relay::{RelayConfig, RelayError};
use thiserror::Error;
use tracing::info;

/// Environment variable for `source_url`.
pub const ENV_SOURCE_URL: &str = "RELAY_SOURCE_URL";
/// Environment variable for `start_height`.
pub const ENV_START_HEIGHT: &str = "RELAY_START_HEIGHT";
/// Environment variable for `receipt_rate`.
pub const ENV_RECEIPT_RATE: &str = "RELAY_RECEIPT_RATE";
/// Environment variable for `backoff_interval_ms`.
pub const ENV_BACKOFF_MS: &str = "RELAY_BACKOFF_MS";
/// Environment variable for `status_interval_ms`.
pub const ENV_STATUS_MS: &str = "RELAY_STATUS_MS";
/// Environment variable for `worker_threads`.
pub const ENV_WORKERS: &str = "RELAY_WORKERS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The config file is not valid JSON for `RelayConfig`.
    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// An environment variable holds a value of the wrong type.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// The merged configuration failed validation.
    #[error(transparent)]
    Invalid(#[from] RelayError),
}

/// Values given on the command line; `None` keeps the lower layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    /// JSON-RPC endpoint.
    pub source_url: Option<String>,
    /// Start height.
    pub start_height: Option<u64>,
    /// Receipt sampling rate.
    pub receipt_rate: Option<f64>,
    /// Backoff interval in milliseconds.
    pub backoff_interval_ms: Option<u64>,
    /// Status interval in milliseconds.
    pub status_interval_ms: Option<u64>,
    /// Worker threads.
    pub worker_threads: Option<usize>,
}

impl ConfigOverrides {
    /// Write every set value into `config`.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(url) = &self.source_url {
            config.source_url = url.clone();
        }
        if let Some(height) = self.start_height {
            config.start_height = height;
        }
        if let Some(rate) = self.receipt_rate {
            config.receipt_rate = rate;
        }
        if let Some(ms) = self.backoff_interval_ms {
            config.backoff_interval_ms = ms;
        }
        if let Some(ms) = self.status_interval_ms {
            config.status_interval_ms = ms;
        }
        if let Some(workers) = self.worker_threads {
            config.worker_threads = workers;
        }
    }
}

/// Read a JSON config file. Missing fields keep their defaults.
pub fn from_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_env<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

/// Apply `RELAY_*` variables found through `lookup`.
pub fn apply_env<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_SOURCE_URL) {
        config.source_url = url;
    }
    if let Some(value) = lookup(ENV_START_HEIGHT) {
        config.start_height = parse_env(ENV_START_HEIGHT, value)?;
    }
    if let Some(value) = lookup(ENV_RECEIPT_RATE) {
        config.receipt_rate = parse_env(ENV_RECEIPT_RATE, value)?;
    }
    if let Some(value) = lookup(ENV_BACKOFF_MS) {
        config.backoff_interval_ms = parse_env(ENV_BACKOFF_MS, value)?;
    }
    if let Some(value) = lookup(ENV_STATUS_MS) {
        config.status_interval_ms = parse_env(ENV_STATUS_MS, value)?;
    }
    if let Some(value) = lookup(ENV_WORKERS) {
        config.worker_threads = parse_env(ENV_WORKERS, value)?;
    }
    Ok(())
}

/// Merge all layers using `lookup` for the environment.
pub fn load_config_with<F>(
    file: Option<&Path>,
    lookup: F,
    overrides: &ConfigOverrides,
) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match file {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            from_file(path)?
        }
        None => RelayConfig::default(),
    };
    apply_env(&mut config, lookup)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Merge all layers using the process environment.
pub fn load_config(
    file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<RelayConfig, ConfigError> {
    load_config_with(file, |var| std::env::var(var).ok(), overrides)
}
