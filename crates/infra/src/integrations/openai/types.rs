//! Wire types for the Chat Completions endpoint and the draft it returns.

use chrono::{DateTime, Utc};
use daybook_domain::{DaybookError, ParsedEventDraft};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure talking to the completion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    /// Transport failure after retries.
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Seconds from `Retry-After`.
    #[error("Rate limit exceeded (retry after {0}s)")]
    RateLimit(u64),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The body or the model's JSON did not match the draft shape.
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),
}

impl From<OpenAIError> for DaybookError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Authentication(_) => DaybookError::Auth(err.to_string()),
            OpenAIError::Network(_) | OpenAIError::RateLimit(_) => DaybookError::Network(err.to_string()),
            OpenAIError::Api { status, .. } if status >= 500 => DaybookError::Network(err.to_string()),
            OpenAIError::Api { .. } | OpenAIError::InvalidSchema(_) => {
                DaybookError::Internal(err.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchema>,
}

/// JSON schema wrapper used by OpenAI when `response_format = "json_schema"`.
#[derive(Debug, Serialize)]
pub(crate) struct JsonSchema {
    pub name: String,
    pub schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: i32,
}

/// Shape the model is constrained to by the strict schema.
#[derive(Debug, Deserialize)]
pub(crate) struct LlmEventDraft {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_all_day: bool,
    pub recurrence: Option<String>,
}

impl From<LlmEventDraft> for ParsedEventDraft {
    fn from(draft: LlmEventDraft) -> Self {
        ParsedEventDraft {
            title: draft.title,
            description: draft.description,
            location: draft.location,
            start_time: draft.start_time,
            end_time: draft.end_time,
            is_all_day: draft.is_all_day,
            recurrence: draft.recurrence,
        }
    }
}
