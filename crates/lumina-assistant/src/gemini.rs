//! Gemini client for graph analysis.
//!
//! One `generateContent` call per question, low temperature, request
//! timeout, no retry. Configuration comes from the environment; a missing
//! key is not a startup error — `analyze` degrades to the missing-key
//! fallback instead, so the UI stays usable without credentials.

use crate::{
    AssistantError, AssistantPort, GraphContext, EMPTY_COMPLETION_FALLBACK,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";
pub const GEMINI_BASE_URL_ENV: &str = "GEMINI_BASE_URL";
pub const ASSISTANT_TIMEOUT_SECS_ENV: &str = "LUMINA_ASSISTANT_TIMEOUT_SECS";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Low temperature for factual analysis.
const ANALYSIS_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// May be empty; `analyze` then returns the missing-key fallback.
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Resolve from environment variables, with defaults for everything but
    /// the key. Never fails: an absent key produces an empty-key config.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var(ASSISTANT_TIMEOUT_SECS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            api_key: std::env::var(GEMINI_API_KEY_ENV).unwrap_or_default(),
            model: std::env::var(GEMINI_MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var(GEMINI_BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout_secs,
        }
    }

    pub fn with_key(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, AssistantError> {
        Self::new(GeminiConfig::from_env())
    }

    async fn complete(&self, query: &str, context: &GraphContext) -> Result<String, AssistantError> {
        if self.config.api_key.is_empty() {
            return Err(AssistantError::MissingKey);
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = serde_json::json!({
            "system_instruction": {
                "parts": [{ "text": context.system_instruction() }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": query }]
            }],
            "generationConfig": { "temperature": ANALYSIS_TEMPERATURE }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Service(format!("{status}: {error_text}")));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }
}

#[async_trait]
impl AssistantPort for GeminiClient {
    async fn analyze(&self, query: &str, context: &GraphContext) -> String {
        match self.complete(query, context).await {
            Ok(text) if text.is_empty() => EMPTY_COMPLETION_FALLBACK.to_string(),
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "assistant call failed");
                err.fallback().to_string()
            }
        }
    }
}
