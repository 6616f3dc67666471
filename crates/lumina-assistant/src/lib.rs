//! Assistant bridge: forward an operator question plus a reduced view of the
//! lineage graph to an external text-generation service.
//!
//! The bridge is deliberately thin. It serializes only what the analysis
//! needs (id/label/kind/status/quality/owner per node, the full edge list,
//! the current selection), makes a single request with no streaming and no
//! retry, and degrades to fixed fallback strings on missing credentials or
//! service failure — the caller never sees an error and never blocks beyond
//! the request timeout.
//!
//! The service sits behind [`AssistantPort`] so everything above it can be
//! tested against [`mock::ScriptedAssistant`].

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use lumina_graph::{AssetKind, HealthStatus, LineageEdge, LineageGraph};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::{GeminiClient, GeminiConfig};
pub use mock::ScriptedAssistant;

/// Returned when no API key is configured.
pub const MISSING_KEY_FALLBACK: &str = "API Key is missing. Please check your configuration.";
/// Returned on any transport or service failure.
pub const SERVICE_ERROR_FALLBACK: &str =
    "Sorry, I encountered an error communicating with the AI service.";
/// Returned when the service answers with an empty completion.
pub const EMPTY_COMPLETION_FALLBACK: &str = "I could not generate an analysis at this time.";

/// Opening assistant message for a fresh chat session.
pub const GREETING: &str = "Hello! I am Lumina AI. I can help you diagnose errors, analyze \
     impact, or explain the data flow. Ask me anything about the current graph.";

// ============================================================================
// Graph Context
// ============================================================================

/// Per-node slice of the graph shared with the service. Everything else
/// (schemas, tags, positions) stays local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub status: HealthStatus,
    pub quality: u8,
    pub owner: String,
}

/// The reduced graph view plus the current selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphContext {
    pub nodes: Vec<ContextNode>,
    pub edges: Vec<LineageEdge>,
    pub selected_id: Option<String>,
}

impl GraphContext {
    pub fn from_graph(graph: &LineageGraph, selected_id: Option<&str>) -> Self {
        Self {
            nodes: graph
                .nodes()
                .iter()
                .map(|n| ContextNode {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    kind: n.kind,
                    status: n.status,
                    quality: n.quality_score,
                    owner: n.owner.clone(),
                })
                .collect(),
            edges: graph.edges().to_vec(),
            selected_id: selected_id.map(str::to_string),
        }
    }

    /// The fixed, analysis-oriented system instruction with the serialized
    /// context embedded.
    pub fn system_instruction(&self) -> String {
        let nodes = serde_json::to_string(&self.nodes).unwrap_or_else(|_| "[]".to_string());
        let edges = serde_json::to_string(&self.edges).unwrap_or_else(|_| "[]".to_string());
        format!(
            "You are an expert Data Observability Assistant for a platform called \"Lumina\".\n\
             Your role is to help Data Engineers and Auditors understand the data lineage graph.\n\
             \n\
             Context:\n\
             - You are provided with a JSON representation of a Directed Acyclic Graph (DAG) of data assets.\n\
             - Nodes represent tables, streams, models, or dashboards.\n\
             - Edges represent data flow.\n\
             - Status can be HEALTHY, WARNING, or ERROR.\n\
             \n\
             Tasks:\n\
             1. If the user asks about errors, trace the lineage to find the root cause (upstream errors).\n\
             2. If the user asks about impact, trace downstream dependencies.\n\
             3. Be concise and professional.\n\
             \n\
             Current Graph Data:\n\
             Nodes: {nodes}\n\
             Edges: {edges}\n\
             Currently Selected Node: {selected}",
            selected = self.selected_id.as_deref().unwrap_or("None"),
        )
    }
}

// ============================================================================
// Assistant Port
// ============================================================================

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no API key configured")]
    MissingKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AssistantError {
    /// The user-facing string each failure degrades to.
    pub fn fallback(&self) -> &'static str {
        match self {
            AssistantError::MissingKey => MISSING_KEY_FALLBACK,
            _ => SERVICE_ERROR_FALLBACK,
        }
    }
}

/// Injected capability: the external text-generation service.
///
/// `analyze` is infallible by contract — implementations map every failure
/// to one of the fixed fallback strings.
#[async_trait]
pub trait AssistantPort: Send + Sync {
    async fn analyze(&self, query: &str, context: &GraphContext) -> String;
}

// ============================================================================
// Chat Session
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Transcript of one assistant panel session, seeded with the greeting.
/// Process-lifetime only.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: ChatRole::Assistant,
                content: GREETING.to_string(),
            }],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send one query through the port and record both sides of the
    /// exchange. Returns the assistant's reply (possibly a fallback string).
    pub async fn ask(
        &mut self,
        port: &dyn AssistantPort,
        query: &str,
        context: &GraphContext,
    ) -> String {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: query.to_string(),
        });
        let reply = port.analyze(query, context).await;
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: reply.clone(),
        });
        reply
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_graph::seed::seed_graph;

    #[test]
    fn context_reduces_node_fields() {
        let graph = seed_graph();
        let ctx = GraphContext::from_graph(&graph, Some("dash_mkt"));
        assert_eq!(ctx.nodes.len(), 9);
        assert_eq!(ctx.edges.len(), 9);
        assert_eq!(ctx.selected_id.as_deref(), Some("dash_mkt"));

        let node = serde_json::to_value(&ctx.nodes[0]).unwrap();
        let keys: Vec<&str> = node.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 6);
        for key in ["id", "label", "type", "status", "quality", "owner"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn system_instruction_embeds_context() {
        let graph = seed_graph();
        let ctx = GraphContext::from_graph(&graph, None);
        let prompt = ctx.system_instruction();
        assert!(prompt.contains("\"dash_mkt\""));
        assert!(prompt.contains("Currently Selected Node: None"));
        assert!(prompt.contains("ERROR"));
    }

    #[tokio::test]
    async fn session_records_both_sides() {
        let graph = seed_graph();
        let ctx = GraphContext::from_graph(&graph, None);
        let port = ScriptedAssistant::replying("The root cause is stg_events.");
        let mut session = ChatSession::new();

        let reply = session.ask(&port, "Why is the marketing dashboard broken?", &ctx).await;
        assert_eq!(reply, "The root cause is stg_events.");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[0].content, GREETING);
        assert_eq!(session.messages()[1].role, ChatRole::User);
    }

    #[tokio::test]
    async fn failing_port_degrades_to_fallback() {
        let graph = seed_graph();
        let ctx = GraphContext::from_graph(&graph, None);
        let port = ScriptedAssistant::failing();
        let mut session = ChatSession::new();

        let reply = session.ask(&port, "anything", &ctx).await;
        assert_eq!(reply, SERVICE_ERROR_FALLBACK);
    }
}
