//! Time sources for the recorder

use crate::events::TimestampMs;
use std::fmt::Debug;
use tokio::time::Instant;

/// Source of epoch-millisecond timestamps
pub trait Clock: Send + Sync + Debug {
    /// Current time in epoch milliseconds
    fn now_ms(&self) -> TimestampMs;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> TimestampMs {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Monotonic clock anchored to a wall-clock origin
///
/// Elapsed time is read from `tokio::time::Instant`, so it never jumps
/// backwards and follows paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
    base_ms: TimestampMs,
}

impl TokioClock {
    /// Anchor at the current wall-clock time
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(SystemClock.now_ms())
    }

    /// Anchor at a fixed timestamp
    #[must_use]
    pub fn starting_at(base_ms: TimestampMs) -> Self {
        Self {
            origin: Instant::now(),
            base_ms,
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> TimestampMs {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.base_ms.saturating_add(elapsed)
    }
}
