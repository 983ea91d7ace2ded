//! Recorder session state machine
//!
//! [`RecorderSession`] owns one in-progress composition. It is purely
//! synchronous: every operation takes the current time explicitly, which keeps
//! the timing rules testable without a runtime. Timers live in
//! [`PromptRecorder`](crate::PromptRecorder).
//!
//! # States
//!
//! - **Idle**: nothing typed, `started_at` unset
//! - **Composing**: at least one keystroke recorded
//! - **Paused**: composing, and the inactivity timer has armed a pause start
//!
//! The expected key-down sequence is finalize → record → reschedule, so a
//! pause bridging two keystrokes is closed at the moment typing resumes.

use crate::events::{EditSnapshot, KeystrokeEvent, PauseEvent, TimestampMs};
use crate::payload::{ChatSubmissionPayload, PayloadEnvelope};
use crate::tokens::estimate_tokens;

/// Coarse state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No keystrokes yet
    Idle,
    /// Typing
    Composing,
    /// Inactivity declared, waiting for the next keystroke or submission
    Paused,
}

/// One composition in progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderSession {
    prompt: String,
    started_at: Option<TimestampMs>,
    keystrokes: Vec<KeystrokeEvent>,
    pauses: Vec<PauseEvent>,
    edits: Vec<EditSnapshot>,
    pause_start: Option<TimestampMs>,
    last_snapshot: String,
    // bumped by every keystroke and reset; survives reset
    timer_generation: u64,
}

impl RecorderSession {
    /// Create empty session
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create session pre-filled with text
    ///
    /// The initial text counts as already snapshotted.
    #[must_use]
    pub fn with_initial_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            last_snapshot: text.clone(),
            prompt: text,
            ..Self::default()
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (self.started_at, self.pause_start) {
            (None, _) => SessionPhase::Idle,
            (Some(_), None) => SessionPhase::Composing,
            (Some(_), Some(_)) => SessionPhase::Paused,
        }
    }

    /// Append a keystroke
    ///
    /// The first keystroke of the session sets `started_at`. Pauses are not
    /// finalized here.
    pub fn record_keystroke(&mut self, key: impl Into<String>, code: impl Into<String>, now: TimestampMs) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
            tracing::debug!(started_at = now, "composition started");
        }
        self.keystrokes.push(KeystrokeEvent::new(key, code, now));
        self.timer_generation = self.timer_generation.wrapping_add(1);
    }

    /// Close an armed pause at `now`
    ///
    /// Non-positive durations are dropped. The marker is always cleared.
    pub fn finalize_pause(&mut self, now: TimestampMs) {
        let Some(start) = self.pause_start.take() else {
            return;
        };
        let duration = now - start;
        match u64::try_from(duration) {
            Ok(duration_ms) if duration_ms > 0 => {
                tracing::debug!(start, duration_ms, "pause recorded");
                self.pauses.push(PauseEvent {
                    start_timestamp_ms: start,
                    duration_ms,
                });
            }
            _ => tracing::debug!(start, now, "dropping non-positive pause"),
        }
    }

    /// Arm the pause-start marker
    ///
    /// Called when the inactivity timer fires; `now` is the fire time, not the
    /// time of the last keystroke.
    pub fn mark_pause_start(&mut self, now: TimestampMs) {
        self.pause_start = Some(now);
    }

    /// Arm the pause-start marker only if no keystroke or reset happened since
    /// `generation` was read
    ///
    /// An inactivity timer captures [`Self::timer_generation`] when it is
    /// scheduled; a timer that wakes after being superseded is ignored here
    /// even if its task could no longer be aborted. Returns `true` when armed.
    pub fn mark_pause_start_if_current(&mut self, generation: u64, now: TimestampMs) -> bool {
        if generation != self.timer_generation {
            tracing::trace!(generation, current = self.timer_generation, "stale inactivity timer ignored");
            return false;
        }
        self.mark_pause_start(now);
        true
    }

    /// Token identifying the latest keystroke or reset
    #[inline]
    #[must_use]
    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    /// Snapshot-loop tick
    ///
    /// Returns `true` when a snapshot was appended.
    pub fn snapshot_tick(&mut self, now: TimestampMs) -> bool {
        if self.prompt.is_empty() || self.prompt == self.last_snapshot {
            return false;
        }
        self.edits.push(EditSnapshot {
            timestamp_ms: now,
            text: self.prompt.clone(),
        });
        self.last_snapshot.clone_from(&self.prompt);
        true
    }

    /// Finalize any trailing pause and build the submission payload
    ///
    /// Closing the trailing pause is the only change made to the session.
    pub fn build_payload(&mut self, now: TimestampMs, envelope: PayloadEnvelope) -> ChatSubmissionPayload {
        self.finalize_pause(now);
        let total_duration_ms = self
            .started_at
            .map_or(0, |started| u64::try_from(now - started).unwrap_or(0));

        ChatSubmissionPayload {
            final_prompt_text: self.prompt.clone(),
            total_duration_ms,
            token_estimate: estimate_tokens(&self.prompt),
            keystroke_events: self.keystrokes.clone(),
            pause_events: self.pauses.clone(),
            edit_history: self.edits.clone(),
            session_id: envelope.session_id,
            ui_version: envelope.ui_version,
            model_hint: envelope.model_hint,
        }
    }

    /// Clear everything back to Idle
    pub fn reset(&mut self) {
        self.prompt.clear();
        self.started_at = None;
        self.keystrokes.clear();
        self.pauses.clear();
        self.edits.clear();
        self.pause_start = None;
        self.last_snapshot.clear();
        self.timer_generation = self.timer_generation.wrapping_add(1);
    }

    /// Replace the composed text
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
    }

    /// Append an artifact body, separated by a blank line from existing text
    pub fn insert_artifact(&mut self, body: &str) {
        if !self.prompt.is_empty() {
            self.prompt.push_str("\n\n");
        }
        self.prompt.push_str(body);
    }

    /// Composed text
    #[inline]
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// First keystroke time
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> Option<TimestampMs> {
        self.started_at
    }

    /// Armed pause start, if any
    #[inline]
    #[must_use]
    pub fn pause_start(&self) -> Option<TimestampMs> {
        self.pause_start
    }

    /// Recorded keystrokes
    #[inline]
    #[must_use]
    pub fn keystrokes(&self) -> &[KeystrokeEvent] {
        &self.keystrokes
    }

    /// Closed pauses
    #[inline]
    #[must_use]
    pub fn pauses(&self) -> &[PauseEvent] {
        &self.pauses
    }

    /// Edit snapshots
    #[inline]
    #[must_use]
    pub fn edits(&self) -> &[EditSnapshot] {
        &self.edits
    }

    /// Live token estimate
    #[inline]
    #[must_use]
    pub fn token_estimate(&self) -> usize {
        estimate_tokens(&self.prompt)
    }
}
