//! Timer-driven prompt recorder
//!
//! [`PromptRecorder`] wraps a [`RecorderSession`] with the two timers the
//! session needs:
//!
//! - a one-shot inactivity timer, cancelled and respawned on every key-down,
//!   which arms the pause-start marker when it fires
//! - a fixed-period snapshot loop that runs for the lifetime of the recorder,
//!   independent of whether anyone is typing
//!
//! Both timers run as tokio tasks and are aborted when the recorder is
//! dropped. The session lock is never held across an `.await`.

use crate::clock::{Clock, TokioClock};
use crate::payload::{ChatSubmissionPayload, PayloadEnvelope};
use crate::session::RecorderSession;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default inactivity threshold before a pause is declared
pub const INACTIVITY_THRESHOLD_MS: u64 = 700;

/// Default snapshot cadence
pub const SNAPSHOT_INTERVAL_MS: u64 = 1500;

/// Recorder timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Idle time after the last key-down before a pause is armed
    pub inactivity_threshold_ms: u64,
    /// Period of the edit-snapshot loop
    pub snapshot_interval_ms: u64,
}

impl RecorderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With inactivity threshold
    #[inline]
    #[must_use]
    pub fn with_inactivity_threshold_ms(mut self, ms: u64) -> Self {
        self.inactivity_threshold_ms = ms;
        self
    }

    /// With snapshot interval
    #[inline]
    #[must_use]
    pub fn with_snapshot_interval_ms(mut self, ms: u64) -> Self {
        self.snapshot_interval_ms = ms;
        self
    }

    fn inactivity_threshold(&self) -> Duration {
        Duration::from_millis(self.inactivity_threshold_ms)
    }

    fn snapshot_interval(&self) -> Duration {
        // tokio::time::interval panics on a zero period
        Duration::from_millis(self.snapshot_interval_ms.max(1))
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_ms: INACTIVITY_THRESHOLD_MS,
            snapshot_interval_ms: SNAPSHOT_INTERVAL_MS,
        }
    }
}

/// Live recorder bound to a tokio runtime
///
/// Must be created from within a runtime, since construction spawns the
/// snapshot loop.
#[derive(Debug)]
pub struct PromptRecorder {
    session: Arc<Mutex<RecorderSession>>,
    clock: Arc<dyn Clock>,
    config: RecorderConfig,
    pause_timer: Mutex<Option<JoinHandle<()>>>,
    snapshot_task: JoinHandle<()>,
}

impl PromptRecorder {
    /// Create recorder using a [`TokioClock`]
    #[must_use]
    pub fn new(config: RecorderConfig) -> Self {
        Self::with_clock(config, Arc::new(TokioClock::new()))
    }

    /// Create recorder with an explicit clock
    #[must_use]
    pub fn with_clock(config: RecorderConfig, clock: Arc<dyn Clock>) -> Self {
        let session = Arc::new(Mutex::new(RecorderSession::new()));
        let snapshot_task = spawn_snapshot_loop(
            Arc::downgrade(&session),
            Arc::clone(&clock),
            config.snapshot_interval(),
        );
        Self {
            session,
            clock,
            config,
            pause_timer: Mutex::new(None),
            snapshot_task,
        }
    }

    /// Handle a key-down: finalize any open pause, record, reschedule
    pub fn key_down(&self, key: &str, code: &str) {
        let now = self.clock.now_ms();
        let generation = {
            let mut session = self.session.lock();
            session.finalize_pause(now);
            session.record_keystroke(key, code, now);
            session.timer_generation()
        };
        self.schedule_pause_detection(generation);
    }

    /// Handle a text change
    pub fn set_prompt(&self, text: impl Into<String>) {
        self.session.lock().set_prompt(text);
    }

    /// Append an artifact body to the prompt
    pub fn insert_artifact(&self, body: &str) {
        self.session.lock().insert_artifact(body);
    }

    /// Finalize the trailing pause and build a payload at the current time
    pub fn build_payload(&self, envelope: PayloadEnvelope) -> ChatSubmissionPayload {
        let now = self.clock.now_ms();
        self.session.lock().build_payload(now, envelope)
    }

    /// Cancel the pending pause timer and clear the session
    pub fn reset(&self) {
        self.cancel_pause_timer();
        self.session.lock().reset();
        tracing::debug!("recorder reset");
    }

    /// Read the session under the lock
    pub fn with_session<R>(&self, f: impl FnOnce(&RecorderSession) -> R) -> R {
        f(&self.session.lock())
    }

    /// Owned copy of the session
    #[must_use]
    pub fn session_snapshot(&self) -> RecorderSession {
        self.session.lock().clone()
    }

    /// Current prompt text
    #[must_use]
    pub fn prompt(&self) -> String {
        self.session.lock().prompt().to_string()
    }

    /// Live token estimate
    #[must_use]
    pub fn token_estimate(&self) -> usize {
        self.session.lock().token_estimate()
    }

    /// Timing configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Clock in use
    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // abort() cannot stop a timer already waiting on the lock, so the task
    // also checks the generation it was scheduled for
    fn schedule_pause_detection(&self, generation: u64) {
        let session = Arc::downgrade(&self.session);
        let clock = Arc::clone(&self.clock);
        let threshold = self.config.inactivity_threshold();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(threshold).await;
            if let Some(session) = session.upgrade() {
                let now = clock.now_ms();
                if session.lock().mark_pause_start_if_current(generation, now) {
                    tracing::trace!(pause_start = now, "inactivity declared");
                }
            }
        });

        if let Some(previous) = self.pause_timer.lock().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_pause_timer(&self) {
        if let Some(handle) = self.pause_timer.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for PromptRecorder {
    fn drop(&mut self) {
        self.cancel_pause_timer();
        self.snapshot_task.abort();
    }
}

fn spawn_snapshot_loop(
    session: Weak<Mutex<RecorderSession>>,
    clock: Arc<dyn Clock>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(session) = session.upgrade() else {
                break;
            };
            let now = clock.now_ms();
            if session.lock().snapshot_tick(now) {
                tracing::trace!(timestamp_ms = now, "edit snapshot");
            }
        }
    })
}
