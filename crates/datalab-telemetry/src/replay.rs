//! Offline replay of a recorded typing script
//!
//! Feeds timestamped input events through a [`RecorderSession`] while
//! simulating the two timers of [`crate::PromptRecorder`] as discrete events,
//! so a payload can be derived without a runtime or wall-clock waits.
//! Timers due at the same instant as an input event fire first.
//!
//! Between two inputs the prompt cannot change, so only the first snapshot
//! tick of each gap can record anything; the rest are skipped arithmetically
//! and replay cost depends on the number of events, not the time they span.

use crate::events::TimestampMs;
use crate::payload::{ChatSubmissionPayload, PayloadEnvelope};
use crate::recorder::RecorderConfig;
use crate::session::RecorderSession;
use serde::{Deserialize, Serialize};

/// One scripted input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Key-down
    Key {
        /// Event time
        at_ms: TimestampMs,
        /// Logical key
        key: String,
        /// Physical key code
        code: String,
    },
    /// Text change
    Text {
        /// Event time
        at_ms: TimestampMs,
        /// Full text after the change
        text: String,
    },
    /// Artifact body appended to the prompt
    Artifact {
        /// Event time
        at_ms: TimestampMs,
        /// Inserted body
        body: String,
    },
}

impl ReplayEvent {
    /// Event time
    #[inline]
    #[must_use]
    pub fn at_ms(&self) -> TimestampMs {
        match self {
            Self::Key { at_ms, .. } | Self::Text { at_ms, .. } | Self::Artifact { at_ms, .. } => *at_ms,
        }
    }
}

/// A typing session to replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Clock reading when the recorder was created; the snapshot cadence starts here
    pub start_ms: TimestampMs,
    /// Inputs; replayed in time order, ties in listed order
    pub events: Vec<ReplayEvent>,
    /// Submission time
    pub submit_at_ms: TimestampMs,
}

struct TimerState {
    pause_due: Option<TimestampMs>,
    next_snapshot: TimestampMs,
    threshold: TimestampMs,
    interval: TimestampMs,
}

impl TimerState {
    /// Fire every timer due at or before `until`
    ///
    /// The pause marker and the snapshot buffer are independent, so their
    /// relative order within a gap does not matter.
    fn run_until(&mut self, session: &mut RecorderSession, until: TimestampMs) {
        if let Some(due) = self.pause_due.filter(|due| *due <= until) {
            session.mark_pause_start(due);
            self.pause_due = None;
        }
        if self.next_snapshot <= until {
            session.snapshot_tick(self.next_snapshot);
            self.next_snapshot = first_tick_after(self.next_snapshot, self.interval, until);
        }
    }
}

/// First tick of the cadence `first + k * interval` strictly after `until`; requires `first <= until`
fn first_tick_after(first: TimestampMs, interval: TimestampMs, until: TimestampMs) -> TimestampMs {
    let interval = i128::from(interval);
    let elapsed = i128::from(until) - i128::from(first);
    let next = i128::from(first) + (elapsed / interval + 1) * interval;
    TimestampMs::try_from(next).unwrap_or(TimestampMs::MAX)
}

/// Replay `script` and build the payload at `submit_at_ms`
#[must_use]
pub fn replay(script: &ReplayScript, config: RecorderConfig, envelope: PayloadEnvelope) -> ChatSubmissionPayload {
    let threshold = TimestampMs::try_from(config.inactivity_threshold_ms).unwrap_or(TimestampMs::MAX);
    let interval = TimestampMs::try_from(config.snapshot_interval_ms.max(1)).unwrap_or(TimestampMs::MAX);
    let mut timers = TimerState {
        pause_due: None,
        next_snapshot: script.start_ms.saturating_add(interval),
        threshold,
        interval,
    };

    let mut events: Vec<&ReplayEvent> = script.events.iter().collect();
    events.sort_by_key(|e| e.at_ms());

    let mut session = RecorderSession::new();
    for event in events {
        timers.run_until(&mut session, event.at_ms());
        match event {
            ReplayEvent::Key { at_ms, key, code } => {
                session.finalize_pause(*at_ms);
                session.record_keystroke(key.as_str(), code.as_str(), *at_ms);
                timers.pause_due = Some(at_ms.saturating_add(timers.threshold));
            }
            ReplayEvent::Text { text, .. } => session.set_prompt(text.as_str()),
            ReplayEvent::Artifact { body, .. } => session.insert_artifact(body),
        }
    }
    timers.run_until(&mut session, script.submit_at_ms);

    tracing::debug!(submit_at = script.submit_at_ms, "replay finished");
    session.build_payload(script.submit_at_ms, envelope)
}
