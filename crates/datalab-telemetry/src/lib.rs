//! DataLab Prompt Telemetry
//!
//! Captures how a prompt was composed, not just what was sent.
//!
//! # Core Concepts
//!
//! - [`RecorderSession`]: synchronous state machine over keystrokes, pauses and
//!   edit snapshots
//! - [`PromptRecorder`]: tokio driver adding the inactivity timer and the
//!   snapshot loop
//! - [`ChatSubmissionPayload`]: the immutable record sent to the chat backend
//! - [`estimate_tokens`]: length-based token heuristic
//! - [`replay()`]: deterministic offline replay of a typing script
//!
//! # Example
//!
//! ```rust,ignore
//! use datalab_telemetry::{PayloadEnvelope, PromptRecorder, RecorderConfig};
//!
//! let recorder = PromptRecorder::new(RecorderConfig::default());
//! recorder.key_down("h", "KeyH");
//! recorder.set_prompt("h");
//! let payload = recorder.build_payload(PayloadEnvelope::new("session-1"));
//! ```
//!
//! Recorded pauses start when inactivity is *declared* (threshold after the
//! last key-down), so they undercount true idle time by up to the threshold.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod clock;
pub mod events;
pub mod payload;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod tokens;

pub use clock::{Clock, SystemClock, TokioClock};
pub use events::{EditSnapshot, KeystrokeEvent, PauseEvent, TimestampMs};
pub use payload::{ChatSubmissionPayload, PayloadEnvelope, DEFAULT_UI_VERSION};
pub use recorder::{PromptRecorder, RecorderConfig, INACTIVITY_THRESHOLD_MS, SNAPSHOT_INTERVAL_MS};
pub use replay::{replay, ReplayEvent, ReplayScript};
pub use session::{RecorderSession, SessionPhase};
pub use tokens::estimate_tokens;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
