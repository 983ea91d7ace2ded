//! Prompt composer: recorder plus chat submission
//!
//! The composer owns the submission rules around a [`PromptRecorder`]:
//!
//! - empty (after trimming) prompts are refused before anything is built
//! - at most one submission is in flight
//! - each attempt gets a fresh session id
//! - only a successful reply resets the recorder; a failed call leaves the
//!   composition in place so the operator can retry

use crate::config::DataLabConfig;
use crate::error::SubmitError;
use datalab_client::{ChatApi, ChatResponse};
use datalab_telemetry::{ChatSubmissionPayload, PayloadEnvelope, PromptRecorder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Reply text shown when the backend returns none
pub const FALLBACK_RESPONSE_TEXT: &str = "No response returned.";

/// Result of a successful submission, handed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOutcome {
    /// Exactly what was sent
    pub payload: ChatSubmissionPayload,
    /// Assistant reply, or [`FALLBACK_RESPONSE_TEXT`]
    pub response_text: String,
    /// Backend id, or a fresh UUID when the backend sent none
    pub interaction_id: String,
    /// Model that answered, if reported
    pub model_name: Option<String>,
}

impl InteractionOutcome {
    fn from_response(payload: ChatSubmissionPayload, response: ChatResponse) -> Self {
        Self {
            payload,
            response_text: response
                .ai_response_text
                .unwrap_or_else(|| FALLBACK_RESPONSE_TEXT.to_string()),
            interaction_id: response
                .interaction_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            model_name: response.model_name,
        }
    }
}

/// Clears the in-flight flag when the submission future completes or is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Prompt composition bound to a chat backend
pub struct PromptComposer {
    recorder: Arc<PromptRecorder>,
    chat: Arc<dyn ChatApi>,
    ui_version: String,
    model_hint: Option<String>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for PromptComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptComposer")
            .field("recorder", &self.recorder)
            .field("ui_version", &self.ui_version)
            .field("model_hint", &self.model_hint)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl PromptComposer {
    /// Composer with default envelope fields
    #[must_use]
    pub fn new(recorder: Arc<PromptRecorder>, chat: Arc<dyn ChatApi>) -> Self {
        Self {
            recorder,
            chat,
            ui_version: datalab_telemetry::DEFAULT_UI_VERSION.to_string(),
            model_hint: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Composer with a fresh recorder and envelope fields from `config`
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn from_config(config: &DataLabConfig, chat: Arc<dyn ChatApi>) -> Self {
        let recorder = Arc::new(PromptRecorder::new(config.recorder));
        Self::new(recorder, chat)
            .with_ui_version(config.ui_version.clone())
            .with_model_hint(config.model_hint.clone())
    }

    /// With UI version
    #[inline]
    #[must_use]
    pub fn with_ui_version(mut self, ui_version: impl Into<String>) -> Self {
        self.ui_version = ui_version.into();
        self
    }

    /// With model hint
    #[inline]
    #[must_use]
    pub fn with_model_hint(mut self, model_hint: Option<String>) -> Self {
        self.model_hint = model_hint;
        self
    }

    /// Underlying recorder; feed key-downs and text changes here
    #[inline]
    #[must_use]
    pub fn recorder(&self) -> &Arc<PromptRecorder> {
        &self.recorder
    }

    /// Whether a submission is awaiting the backend
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Build the payload, send it and reset on success
    ///
    /// # Errors
    /// - [`SubmitError::EmptyPrompt`] if the prompt is blank
    /// - [`SubmitError::InFlight`] if another submission is pending
    /// - [`SubmitError::Api`] if the backend call fails; the composition is kept
    pub async fn submit(&self) -> Result<InteractionOutcome, SubmitError> {
        if self.recorder.prompt().trim().is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(SubmitError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let envelope = PayloadEnvelope::new(Uuid::new_v4().to_string())
            .with_ui_version(self.ui_version.clone())
            .with_model_hint(self.model_hint.clone());
        let payload = self.recorder.build_payload(envelope);

        tracing::info!(
            session_id = %payload.session_id,
            tokens = payload.token_estimate,
            keystrokes = payload.keystroke_events.len(),
            pauses = payload.pause_events.len(),
            edits = payload.edit_history.len(),
            duration_ms = payload.total_duration_ms,
            "submitting prompt"
        );

        match self.chat.post_chat(&payload).await {
            Ok(response) => {
                self.recorder.reset();
                let outcome = InteractionOutcome::from_response(payload, response);
                tracing::info!(interaction_id = %outcome.interaction_id, "submission accepted");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, session_id = %payload.session_id, "submission failed, composition kept");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_defaults_when_reply_is_empty() {
        let payload = ChatSubmissionPayload {
            final_prompt_text: "q".into(),
            total_duration_ms: 0,
            token_estimate: 1,
            keystroke_events: vec![],
            pause_events: vec![],
            edit_history: vec![],
            session_id: "s".into(),
            ui_version: "web-0.1".into(),
            model_hint: None,
        };
        let outcome = InteractionOutcome::from_response(payload, ChatResponse::default());
        assert_eq!(outcome.response_text, FALLBACK_RESPONSE_TEXT);
        assert!(Uuid::parse_str(&outcome.interaction_id).is_ok());
        assert_eq!(outcome.model_name, None);
    }

    #[test]
    fn outcome_keeps_backend_fields() {
        let payload = ChatSubmissionPayload {
            final_prompt_text: "q".into(),
            total_duration_ms: 0,
            token_estimate: 1,
            keystroke_events: vec![],
            pause_events: vec![],
            edit_history: vec![],
            session_id: "s".into(),
            ui_version: "web-0.1".into(),
            model_hint: None,
        };
        let response = ChatResponse {
            interaction_id: Some("i-9".into()),
            ai_response_text: Some("answer".into()),
            model_name: Some("gpt-4o-mini".into()),
        };
        let outcome = InteractionOutcome::from_response(payload, response);
        assert_eq!(outcome.interaction_id, "i-9");
        assert_eq!(outcome.response_text, "answer");
        assert_eq!(outcome.model_name.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn in_flight_guard_clears_flag() {
        let flag = AtomicBool::new(true);
        drop(InFlightGuard(&flag));
        assert!(!flag.load(Ordering::Acquire));
    }
}
