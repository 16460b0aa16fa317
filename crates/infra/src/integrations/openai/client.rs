//! Chat Completions client that turns free text into event drafts.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use daybook_core::EventTextParser;
use daybook_domain::config::{OpenAiConfig, DEFAULT_OPENAI_MODEL, OPENAI_CHAT_COMPLETIONS_URL};
use daybook_domain::{DaybookError, ParsedEventDraft};
use reqwest::header::RETRY_AFTER;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use crate::http::HttpClient;

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, JsonSchema, LlmEventDraft,
    OpenAIError, ResponseFormat,
};

const DEFAULT_MAX_TOKENS: u32 = 1_000;
const DEFAULT_TEMPERATURE: f32 = 0.0;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You turn short free-text descriptions of calendar events into structured \
data. Resolve relative dates and times against the reference time given by the user. Return times as \
RFC 3339 timestamps with an explicit offset. Use null for fields the text does not mention. \
Recurrence is one of none, daily, weekly, monthly or yearly.";

/// OpenAI API client that extracts event drafts from free text
pub struct OpenAIClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAIClient {
    /// Client for the public endpoint with the default model.
    pub fn new(api_key: String, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_url: OPENAI_CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    /// Client configured from the `openai` config section.
    pub fn from_config(config: &OpenAiConfig, http_client: HttpClient) -> Self {
        Self::new(config.api_key.clone(), http_client)
            .with_model(config.model.clone())
            .with_api_url(config.api_url.clone())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a compatible endpoint, such as a proxy or a local mock.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Extract an event draft from `text`
    ///
    /// # Errors
    /// Returns `OpenAIError` for network failures, API errors, or responses
    /// that do not match the draft schema
    pub async fn parse_event_text(
        &self,
        text: &str,
        reference: DateTime<Utc>,
    ) -> Result<ParsedEventDraft, OpenAIError> {
        info!(chars = text.len(), model = %self.model, "parsing event text");

        let prompt = format!(
            "Reference time: {}\n\nEvent description:\n{}",
            reference.to_rfc3339_opts(SecondsFormat::Secs, true),
            text.trim()
        );

        let draft = self.call_api(prompt).await?;
        Ok(draft.into())
    }

    async fn call_api(&self, prompt: String) -> Result<LlmEventDraft, OpenAIError> {
        let request_payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user".to_string(), content: prompt },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: Some(JsonSchema {
                    name: "calendar_event".to_string(),
                    schema: event_schema(),
                    strict: Some(true),
                }),
            },
        };

        let request = self
            .http_client
            .request(Method::POST, &self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_payload);

        let response = self.http_client.send(request).await.map_err(|err| match err {
            DaybookError::Network(msg) | DaybookError::Internal(msg) => OpenAIError::Network(msg),
            other => OpenAIError::Network(other.to_string()),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), model = %self.model, "chat completion returned");

        if !status.is_success() {
            return Err(handle_error_status(status.as_u16(), response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| OpenAIError::InvalidSchema(format!("unexpected completion body: {err}")))?;

        if let Some(usage) = &completion.usage {
            debug!(tokens = usage.total_tokens, "completion token usage");
        }

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OpenAIError::InvalidSchema("completion carried no message content".into()))?;

        serde_json::from_str(&content)
            .map_err(|err| OpenAIError::InvalidSchema(format!("draft does not match schema: {err}")))
    }
}

/// Strict schema: every key is required, optional values are nullable.
fn event_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "description": { "type": ["string", "null"] },
            "location": { "type": ["string", "null"] },
            "start_time": { "type": "string", "description": "RFC 3339 timestamp" },
            "end_time": { "type": ["string", "null"], "description": "RFC 3339 timestamp" },
            "is_all_day": { "type": "boolean" },
            "recurrence": {
                "type": ["string", "null"],
                "enum": ["none", "daily", "weekly", "monthly", "yearly", null]
            }
        },
        "required": [
            "title", "description", "location", "start_time", "end_time", "is_all_day", "recurrence"
        ],
        "additionalProperties": false
    })
}

/// 401/403 mean a bad key; 429 carries the advertised back-off.
async fn handle_error_status(status: u16, response: reqwest::Response) -> OpenAIError {
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    let message = response.text().await.unwrap_or_default();

    match status {
        401 | 403 => OpenAIError::Authentication(format!("API key rejected with status {status}")),
        429 => OpenAIError::RateLimit(retry_after),
        _ => OpenAIError::Api { status, message },
    }
}

#[async_trait]
impl EventTextParser for OpenAIClient {
    async fn parse(
        &self,
        text: &str,
        reference: DateTime<Utc>,
    ) -> daybook_domain::Result<ParsedEventDraft> {
        self.parse_event_text(text, reference).await.map_err(DaybookError::from)
    }
}
