//! Telemetry event records
//!
//! These are the wire shapes embedded in a submission payload. Timestamps are
//! epoch milliseconds.

use serde::{Deserialize, Serialize};

/// Epoch milliseconds
pub type TimestampMs = i64;

/// A single key-down while composing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystrokeEvent {
    /// Logical key value (`"a"`, `"Enter"`, ...)
    pub key: String,
    /// Physical key code (`"KeyA"`, `"Enter"`, ...)
    pub code: String,
    /// When the key went down
    pub timestamp_ms: TimestampMs,
}

impl KeystrokeEvent {
    /// Create new keystroke event
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, code: impl Into<String>, timestamp_ms: TimestampMs) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            timestamp_ms,
        }
    }
}

/// A closed interval of declared inactivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseEvent {
    /// When inactivity was declared
    pub start_timestamp_ms: TimestampMs,
    /// Always > 0
    pub duration_ms: u64,
}

/// Point-in-time copy of the composed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSnapshot {
    /// Tick time
    pub timestamp_ms: TimestampMs,
    /// Text at tick time
    pub text: String,
}
