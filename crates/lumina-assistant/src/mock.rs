//! Scripted assistant for tests and offline demos.

use crate::{AssistantPort, GraphContext, SERVICE_ERROR_FALLBACK};
use async_trait::async_trait;
use std::sync::Mutex;

/// Canned-response port. Records the queries and contexts it was given so
/// tests can assert on what would have been sent over the wire.
#[derive(Debug, Default)]
pub struct ScriptedAssistant {
    reply: Option<String>,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedAssistant {
    /// Always answer with `reply`.
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Simulate a service failure on every call.
    pub fn failing() -> Self {
        Self::default()
    }

    /// `(query, selected_id)` pairs observed so far.
    pub fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl AssistantPort for ScriptedAssistant {
    async fn analyze(&self, query: &str, context: &GraphContext) -> String {
        self.seen
            .lock()
            .expect("seen lock")
            .push((query.to_string(), context.selected_id.clone()));
        match &self.reply {
            Some(reply) => reply.clone(),
            None => SERVICE_ERROR_FALLBACK.to_string(),
        }
    }
}
