//! # Command Line
//!
//! `clap` definitions for the runtime binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

/// First block of the default throughput range.
pub const DEFAULT_EVAL_START: u64 = 8_875_000;
/// End (exclusive) of the default throughput range.
pub const DEFAULT_EVAL_END: u64 = 8_880_000;

/// Block relay: header sync into a trusted verifier.
#[derive(Parser, Debug)]
#[command(name = "relay-runtime")]
#[command(about = "Relays block headers from a chain source into a trusted verifier")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings that take precedence over file and environment
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// What to do; `run` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Subcommand to run; `run` when none is given.
    pub fn subcommand(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

/// Runtime subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Follow the chain until interrupted
    Run,
    /// Push a fixed block range at several receipt rates and report blocks/second
    Throughput(ThroughputArgs),
}

/// Configuration values settable from the command line.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct OverrideArgs {
    /// JSON-RPC endpoint of the chain source
    #[arg(long, global = true)]
    pub source_url: Option<String>,

    /// Height to start syncing from
    #[arg(long, global = true)]
    pub start_height: Option<u64>,

    /// Fraction of blocks whose receipts are verified (0.0 to 1.0)
    #[arg(long, global = true)]
    pub receipt_rate: Option<f64>,

    /// Retry interval in milliseconds once the source has no new block
    #[arg(long, global = true)]
    pub backoff_ms: Option<u64>,

    /// Status report interval in milliseconds
    #[arg(long, global = true)]
    pub status_ms: Option<u64>,

    /// Worker threads
    #[arg(long, global = true)]
    pub workers: Option<usize>,
}

impl From<&OverrideArgs> for ConfigOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            source_url: args.source_url.clone(),
            start_height: args.start_height,
            receipt_rate: args.receipt_rate,
            backoff_interval_ms: args.backoff_ms,
            status_interval_ms: args.status_ms,
            worker_threads: args.workers,
        }
    }
}

/// Throughput evaluation parameters.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ThroughputArgs {
    /// First block pushed
    #[arg(long, default_value_t = DEFAULT_EVAL_START)]
    pub start: u64,

    /// End of the range (exclusive)
    #[arg(long, default_value_t = DEFAULT_EVAL_END)]
    pub end: u64,

    /// Receipt rates to evaluate, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
    )]
    pub rates: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::try_parse_from(["relay-runtime"]).unwrap();
        assert_eq!(cli.subcommand(), Command::Run);
        assert_eq!(ConfigOverrides::from(&cli.overrides), ConfigOverrides::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "relay-runtime",
            "run",
            "--source-url",
            "http://geth:8545",
            "--start-height",
            "100",
            "--receipt-rate",
            "0.25",
        ])
        .unwrap();
        let overrides = ConfigOverrides::from(&cli.overrides);
        assert_eq!(overrides.source_url.as_deref(), Some("http://geth:8545"));
        assert_eq!(overrides.start_height, Some(100));
        assert_eq!(overrides.receipt_rate, Some(0.25));
    }

    #[test]
    fn test_throughput_defaults() {
        let cli = Cli::try_parse_from(["relay-runtime", "throughput"]).unwrap();
        let Command::Throughput(args) = cli.subcommand() else {
            panic!("expected throughput command");
        };
        assert_eq!(args.start, DEFAULT_EVAL_START);
        assert_eq!(args.end, DEFAULT_EVAL_END);
        assert_eq!(args.rates.len(), 11);
    }

    #[test]
    fn test_throughput_rates_list() {
        let cli = Cli::try_parse_from([
            "relay-runtime",
            "throughput",
            "--start",
            "10",
            "--end",
            "20",
            "--rates",
            "0,0.5,1",
        ])
        .unwrap();
        assert_eq!(
            cli.subcommand(),
            Command::Throughput(ThroughputArgs {
                start: 10,
                end: 20,
                rates: vec![0.0, 0.5, 1.0],
            })
        );
    }
}
