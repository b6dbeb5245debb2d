//! # Domain Module
//!
//! Core domain types for the block relay.

pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
