//! Testing utilities for the DataLab workspace
//!
//! Shared fixtures for graphs, recorders and a scripted chat backend.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use datalab_client::{ApiError, ApiResult, ChatApi, ChatResponse};
use datalab_elements::{
    ConnectionRequest, ElementRegistry, GraphDefinition, GraphStore, NodeId,
};
use datalab_telemetry::{
    ChatSubmissionPayload, PromptRecorder, RecorderConfig, TimestampMs, TokioClock,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub fn builtin_registry() -> Arc<ElementRegistry> {
    Arc::new(ElementRegistry::with_builtins())
}

/// Empty graph with deterministic placement
pub fn seeded_store(seed: u64) -> GraphStore {
    GraphStore::new(builtin_registry(), GraphDefinition::empty("graph_test", "Test")).with_seed(seed)
}

/// Store holding the demo graph with deterministic placement
pub fn default_store() -> GraphStore {
    GraphStore::with_default_graph(builtin_registry()).with_seed(7)
}

/// Add one node per type and connect consecutive nodes through their default ports
pub fn chain_store(types: &[&str]) -> (GraphStore, Vec<NodeId>) {
    let mut store = seeded_store(1);
    let ids: Vec<NodeId> = types.iter().map(|t| store.add_node(t).unwrap()).collect();
    for pair in ids.windows(2) {
        store
            .connect_with_defaults(&ConnectionRequest::between(pair[0].clone(), pair[1].clone()))
            .unwrap();
    }
    (store, ids)
}

/// Recorder with default timers whose clock reads `base_ms` at creation
///
/// Call from a `start_paused` tokio test to drive it with virtual time.
pub fn recorder_at(base_ms: TimestampMs) -> PromptRecorder {
    PromptRecorder::with_clock(RecorderConfig::default(), Arc::new(TokioClock::starting_at(base_ms)))
}

/// DOM-style `code` for a typed character
pub fn key_code(ch: char) -> String {
    match ch {
        ' ' => "Space".to_string(),
        '\n' => "Enter".to_string(),
        c if c.is_ascii_alphabetic() => format!("Key{}", c.to_ascii_uppercase()),
        c if c.is_ascii_digit() => format!("Digit{c}"),
        _ => "Unidentified".to_string(),
    }
}

/// Type `text` one character at a time, sleeping `gap` after each key
pub async fn type_text(recorder: &PromptRecorder, text: &str, gap: Duration) {
    let mut typed = recorder.prompt();
    for ch in text.chars() {
        recorder.key_down(&ch.to_string(), &key_code(ch));
        typed.push(ch);
        recorder.set_prompt(typed.clone());
        tokio::time::sleep(gap).await;
    }
}

enum Reply {
    Ok(ChatResponse),
    Http { status: u16, detail: String },
}

/// Scripted [`ChatApi`] that records every payload it receives
///
/// Replies are consumed in order; the last one repeats once the script runs out.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    calls: Mutex<Vec<ChatSubmissionPayload>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedChat {
    fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Always answer with `text`
    pub fn replying(text: &str) -> Self {
        Self::with_replies(vec![Reply::Ok(ChatResponse {
            interaction_id: Some("interaction-1".to_string()),
            ai_response_text: Some(text.to_string()),
            model_name: Some("test-model".to_string()),
        })])
    }

    /// Always fail with an HTTP error
    pub fn failing(status: u16, detail: &str) -> Self {
        Self::with_replies(vec![Reply::Http {
            status,
            detail: detail.to_string(),
        }])
    }

    /// Fail once with an HTTP error, then answer with `text`
    pub fn failing_then_replying(status: u16, detail: &str, text: &str) -> Self {
        Self::with_replies(vec![
            Reply::Http {
                status,
                detail: detail.to_string(),
            },
            Reply::Ok(ChatResponse {
                interaction_id: None,
                ai_response_text: Some(text.to_string()),
                model_name: None,
            }),
        ])
    }

    /// Hold every call until the returned [`Notify`] is signalled
    pub fn gated(self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                gate: Some(Arc::clone(&gate)),
                ..self
            },
            gate,
        )
    }

    /// Payloads received so far
    pub fn calls(&self) -> Vec<ChatSubmissionPayload> {
        self.calls.lock().clone()
    }

    fn next_reply(&self) -> ApiResult<ChatResponse> {
        let mut last = self.last.lock();
        if let Some(reply) = self.replies.lock().pop_front() {
            *last = Some(reply);
        }
        match last.as_ref() {
            Some(Reply::Ok(response)) => Ok(response.clone()),
            Some(Reply::Http { status, detail }) => Err(ApiError::Http {
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(ChatResponse::default()),
        }
    }
}

#[async_trait]
impl ChatApi for ScriptedChat {
    async fn post_chat(&self, payload: &ChatSubmissionPayload) -> ApiResult<ChatResponse> {
        self.calls.lock().push(payload.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.next_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes() {
        assert_eq!(key_code('a'), "KeyA");
        assert_eq!(key_code('7'), "Digit7");
        assert_eq!(key_code(' '), "Space");
        assert_eq!(key_code('?'), "Unidentified");
    }

    #[test]
    fn chain_store_connects_in_order() {
        let (store, ids) = chain_store(&["prompt", "llm", "notebook"]);
        assert_eq!(store.graph().edges.len(), 2);
        assert_eq!(store.validate_for_publish().unwrap(), ids);
    }

    #[tokio::test]
    async fn scripted_chat_replays_then_repeats_last() {
        let chat = ScriptedChat::failing_then_replying(500, "down", "ok");
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

        assert!(chat.post_chat(&payload).await.is_err());
        assert!(chat.post_chat(&payload).await.is_ok());
        assert!(chat.post_chat(&payload).await.is_ok());
        assert_eq!(chat.calls().len(), 3);
    }
}
