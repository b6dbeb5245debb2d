//! # Boundary Channel
//!
//! One channel per call direction. A channel admits a single in-flight call
//! and shields its caller: whatever the callee returns or panics with comes
//! back as a `BoundaryStatus`, never as an unwinding panic.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::domain::{BoundaryStatus, RelayError};

/// Serializing, panic-shielding call channel.
pub struct BoundaryChannel {
    name: &'static str,
    in_flight: Mutex<()>,
}

impl BoundaryChannel {
    /// Channel labelled `name` in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            in_flight: Mutex::new(()),
        }
    }

    /// Run `call` once the channel is free.
    pub async fn call<T, F>(&self, call: &'static str, fut: F) -> Result<T, BoundaryStatus>
    where
        F: Future<Output = Result<T, RelayError>>,
    {
        let _guard = self.in_flight.lock().await;
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                debug!("[{}] {} failed: {}", self.name, call, err);
                Err(status_for(&err))
            }
            Err(_) => {
                error!("[{}] {} panicked", self.name, call);
                Err(BoundaryStatus::Unexpected)
            }
        }
    }
}

/// Status reported for a callee error.
///
/// A status from a nested boundary call passes through unchanged; every
/// other error is `Unexpected`.
pub fn status_for(err: &RelayError) -> BoundaryStatus {
    match err {
        RelayError::Boundary(status) => *status,
        _ => BoundaryStatus::Unexpected,
    }
}
