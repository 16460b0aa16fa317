//! Google OAuth and Calendar v3 wire types

use daybook_domain::{ExternalCalendar, ExternalCalendarEvent};
use reqwest::Response;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Token endpoint response for both the code exchange and the refresh grant.
///
/// Google omits `refresh_token` on refresh unless it rotated the token.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl TokenResponse {
    /// Access token, if present and not blank.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().map(str::trim).filter(|token| !token.is_empty())
    }
}

/// `events.list` page. Items stay raw so one malformed entry does not fail
/// the whole page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

impl EventsResponse {
    pub fn into_events(self) -> Vec<ExternalCalendarEvent> {
        self.items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ExternalCalendarEvent>(item) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable provider event");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<ExternalCalendar>,
}

/// Best-effort extraction of the provider's own error message.
///
/// Calendar API errors look like `{"error": {"message": ".."}}`; the token
/// endpoint answers `{"error": "invalid_grant", "error_description": ".."}`.
pub(crate) fn provider_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| value.get("error_description").and_then(Value::as_str))
            .or_else(|| value.get("error").and_then(Value::as_str))
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "empty error response".to_string(),
        None => body.trim().to_string(),
    }
}

/// Provider message of a failed response.
///
/// A body that cannot be read is logged and reported as such instead of
/// passing for an empty error.
pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => provider_message(&body),
        Err(err) => {
            warn!(%status, error = %err, "could not read Google error response body");
            format!("error response body could not be read: {err}")
        }
    }
}
