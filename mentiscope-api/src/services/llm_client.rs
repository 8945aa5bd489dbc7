//! LLM chat-completions client
//!
//! Talks to an OpenRouter-compatible `/chat/completions` endpoint and asks for
//! a JSON object reply. The dispatcher only sees the [`AnalysisProvider`]
//! trait, so tests can substitute a canned provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmSettings;

const USER_AGENT: &str = concat!("mentiscope-api/", env!("CARGO_PKG_VERSION"));

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Reply is not a JSON object")]
    NotJsonObject,
}

/// Anything that can turn a prompt into a JSON object
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Model identifier, for logging
    fn model(&self) -> &str;

    /// Send one system + user message pair and return the parsed JSON object
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenRouter (or any OpenAI-compatible) chat-completions client
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(settings: &LlmSettings, api_key: String) -> Result<Self, LlmError> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in [("http-referer", &settings.referer), ("x-title", &settings.title)] {
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| LlmError::NetworkError(format!("Invalid {} header: {}", name, e)))?;
            headers.insert(name, value);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl AnalysisProvider for OpenRouterClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Sending analysis request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::InvalidApiKey);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        parse_json_object(&content)
    }
}

/// Parse a reply into a JSON object
///
/// Tolerates a surrounding Markdown code fence, which some models emit even
/// in JSON mode.
pub fn parse_json_object(content: &str) -> Result<Value, LlmError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: Value =
        serde_json::from_str(unfenced).map_err(|e| LlmError::ParseError(e.to_string()))?;

    if !value.is_object() {
        return Err(LlmError::NotJsonObject);
    }

    Ok(value)
}
