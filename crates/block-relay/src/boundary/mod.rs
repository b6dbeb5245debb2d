//! # Trust Boundary
//!
//! Call discipline between the untrusted host and the trusted verifier.
//!
//! - Every call returns a [`BoundaryStatus`]; callee errors and panics never
//!   propagate as such.
//! - Variable-length results are allocated by the callee and released by
//!   the caller after copying. Inputs are copied by the callee.
//! - Targets are named by opaque [`BoundaryHandle`]s.
//! - Calls on one direction are serialized.

pub mod buffer;
pub mod channel;
pub mod enclave;
pub mod handle;
pub mod host;

pub use crate::domain::BoundaryStatus;
pub use buffer::{BufferArena, CrossBoundaryBuffer, Domain};
pub use channel::{status_for, BoundaryChannel};
pub use enclave::{EnclaveEndpoint, EnclaveVerifier, HostProxy};
pub use handle::{BoundaryHandle, HandleTable};
pub use host::{decode_receipts_list, encode_receipts_list, HostEndpoint};
