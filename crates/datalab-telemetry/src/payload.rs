//! Submission payload handed to `POST /api/chat`

use crate::events::{EditSnapshot, KeystrokeEvent, PauseEvent};
use serde::{Deserialize, Serialize};

/// Default UI version tag sent with every payload
pub const DEFAULT_UI_VERSION: &str = "web-0.1";

/// Immutable snapshot of one composition, built once per submission attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSubmissionPayload {
    /// Prompt text at submission time
    pub final_prompt_text: String,
    /// `now - started_at`, or 0 when nothing was typed
    pub total_duration_ms: u64,
    /// Estimate over `final_prompt_text`
    pub token_estimate: usize,
    /// All key-downs in order
    pub keystroke_events: Vec<KeystrokeEvent>,
    /// Closed pauses in order
    pub pause_events: Vec<PauseEvent>,
    /// Distinct text snapshots in order
    pub edit_history: Vec<EditSnapshot>,
    /// Fresh per attempt
    pub session_id: String,
    /// Client build tag
    pub ui_version: String,
    /// Optional model preference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_hint: Option<String>,
}

/// Caller-supplied fields that the session itself does not own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEnvelope {
    /// Submission attempt id
    pub session_id: String,
    /// Client build tag
    pub ui_version: String,
    /// Optional model preference
    pub model_hint: Option<String>,
}

impl PayloadEnvelope {
    /// Envelope with the default UI version and no model hint
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ui_version: DEFAULT_UI_VERSION.to_string(),
            model_hint: None,
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(model_hint: Option<String>) -> ChatSubmissionPayload {
        ChatSubmissionPayload {
            final_prompt_text: "hi".to_string(),
            total_duration_ms: 10,
            token_estimate: 1,
            keystroke_events: vec![KeystrokeEvent::new("h", "KeyH", 1)],
            pause_events: vec![],
            edit_history: vec![],
            session_id: "s".to_string(),
            ui_version: DEFAULT_UI_VERSION.to_string(),
            model_hint,
        }
    }

    #[test]
    fn model_hint_omitted_when_absent() {
        let json = serde_json::to_value(payload(None)).unwrap();
        assert!(json.get("model_hint").is_none());
        assert_eq!(json["keystroke_events"][0]["code"], "KeyH");
    }

    #[test]
    fn model_hint_present_when_set() {
        let json = serde_json::to_value(payload(Some("gpt-4o".into()))).unwrap();
        assert_eq!(json["model_hint"], "gpt-4o");
    }

    #[test]
    fn envelope_builder() {
        let env = PayloadEnvelope::new("abc")
            .with_ui_version("cli-0.1")
            .with_model_hint(Some("llm".into()));
        assert_eq!(env.ui_version, "cli-0.1");
        assert_eq!(env.model_hint.as_deref(), Some("llm"));
    }
}
