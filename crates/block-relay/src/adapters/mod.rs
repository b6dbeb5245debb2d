//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits against real infrastructure.

mod geth_rpc;

pub use geth_rpc::GethRpcSource;
