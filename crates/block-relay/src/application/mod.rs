//! # Application Module
//!
//! The relay service, the tasks driving it and the scheduler running them.

pub mod context;
pub mod relay;
pub mod scheduler;
pub mod tasks;

pub use context::RelayContext;
pub use relay::{BlockRelay, RelayPhase};
pub use scheduler::{build_runtime, TaskPool};
pub use tasks::{StatusReport, StatusTask, SyncTask, TickingTask};
