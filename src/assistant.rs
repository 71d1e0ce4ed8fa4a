//! Prompt-to-text assistant.
//!
//! The session engine never calls this; a host UI offers it next to the
//! editor. [`HttpAssistant`] talks to a `generateContent`-style endpoint.
//! Parsing is a pure function for testability.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_ASSISTANT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ASSISTANT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ASSISTANT_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const API_KEY_HEADER: &str = "x-goog-api-key";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The variable naming the key, or the key itself, is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    #[error("API response parse failed: {0}")]
    Parse(String),
}

// =============================================================================
// TRAIT
// =============================================================================

/// Opaque prompt in, text out.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl AssistantConfig {
    /// Build config from environment variables.
    ///
    /// Required:
    /// - `ASSISTANT_API_KEY_ENV` (names the env var containing the key)
    ///
    /// Optional:
    /// - `ASSISTANT_MODEL`: default `gemini-1.5-flash`
    /// - `ASSISTANT_BASE_URL`: default public endpoint
    /// - `ASSISTANT_TIMEOUT_SECS`: default 60
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AssistantError> {
        let key_var = lookup("ASSISTANT_API_KEY_ENV")
            .ok_or_else(|| AssistantError::MissingApiKey { var: "ASSISTANT_API_KEY_ENV".into() })?;
        let api_key = lookup(&key_var).ok_or(AssistantError::MissingApiKey { var: key_var })?;

        let model = lookup("ASSISTANT_MODEL").unwrap_or_else(|| DEFAULT_ASSISTANT_MODEL.to_owned());
        let base_url = lookup("ASSISTANT_BASE_URL")
            .unwrap_or_else(|| DEFAULT_ASSISTANT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let timeout_secs = lookup("ASSISTANT_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ASSISTANT_TIMEOUT_SECS);

        Ok(Self { api_key, model, base_url, timeout_secs })
    }

    /// Full `generateContent` URL for the configured model.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAssistant {
    http: reqwest::Client,
    config: AssistantConfig,
}

impl HttpAssistant {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AssistantError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "assistant request");

        let response = self
            .http
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|e| AssistantError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AssistantError::ApiRequest(e.to_string()))?;

        if status != 200 {
            return Err(AssistantError::ApiResponse { status, body: text });
        }

        parse_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ApiRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn request_body(prompt: &str) -> ApiRequest<'_> {
    ApiRequest { contents: [Content { parts: [RequestPart { text: prompt }] }] }
}

// =============================================================================
// PARSING
// =============================================================================

/// Concatenate the text parts of the first candidate.
fn parse_response(json: &str) -> Result<String, AssistantError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| AssistantError::Parse(e.to_string()))?;

    let content = api
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| AssistantError::Parse("response has no candidates".into()))?;

    Ok(content.parts.into_iter().filter_map(|p| p.text).collect())
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
