//! # Adaptive Interval
//!
//! Two-state polling controller used by the sync task.
//!
//! Fast while blocks keep coming, a fixed backoff once they stop. No growth,
//! no jitter.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling mode of an adaptive task.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntervalMode {
    /// Re-tick immediately.
    Fast,
    /// Wait the configured backoff before the next tick.
    Backoff,
}

impl IntervalMode {
    /// Mode to use after a tick with the given outcome.
    pub const fn after(succeeded: bool) -> Self {
        if succeeded {
            IntervalMode::Fast
        } else {
            IntervalMode::Backoff
        }
    }
}

/// Interval mode together with the durations it maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveInterval {
    mode: IntervalMode,
    backoff: Duration,
}

impl AdaptiveInterval {
    /// Start in `Fast` mode with the given backoff.
    pub const fn new(backoff: Duration) -> Self {
        Self {
            mode: IntervalMode::Fast,
            backoff,
        }
    }

    /// Current mode.
    pub const fn mode(&self) -> IntervalMode {
        self.mode
    }

    /// Delay before the next tick in the current mode.
    pub const fn delay(&self) -> Duration {
        match self.mode {
            IntervalMode::Fast => Duration::ZERO,
            IntervalMode::Backoff => self.backoff,
        }
    }

    /// Record a tick outcome; returns the resulting mode.
    pub fn record(&mut self, succeeded: bool) -> IntervalMode {
        self.mode = IntervalMode::after(succeeded);
        self.mode
    }
}
