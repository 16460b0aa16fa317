//! Google Calendar v3 client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use daybook_core::ExternalCalendarProvider;
use daybook_domain::{
    DaybookError, ExternalCalendar, ExternalCalendarEvent, ExternalEventPayload, ListEventsOptions,
    ProviderSession, Result,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::oauth::GoogleCredentialManager;
use super::types::{error_message, CalendarListResponse, EventsResponse};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Thin wrapper over the Calendar REST API. Every call first obtains a
/// session from the credential manager.
pub struct GoogleCalendarClient {
    credentials: Arc<GoogleCredentialManager>,
    http: HttpClient,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(credentials: Arc<GoogleCredentialManager>, http: HttpClient) -> Self {
        let api_base = credentials.config().api_base_url.trim_end_matches('/').to_string();
        Self { credentials, http, api_base }
    }

    async fn session(&self, user_id: i64) -> Result<ProviderSession> {
        self.credentials.get_authenticated_session(user_id).await.ok_or_else(|| {
            DaybookError::ProviderUnavailable(format!("no authenticated Google session for user {user_id}"))
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.api_base, urlencoding::encode(calendar_id))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!("{}/{}", self.events_url(calendar_id), urlencoding::encode(event_id))
    }

    async fn execute(&self, session: &ProviderSession, builder: RequestBuilder) -> Result<Response> {
        let response = self.http.send(builder.bearer_auth(&session.access_token)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        debug!(user_id = session.user_id, %status, %message, "Google Calendar request rejected");
        Err(DaybookError::ProviderApiError(message))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        session: &ProviderSession,
        builder: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(session, builder).await?;
        response.json::<T>().await.map_err(|err| InfraError::from(err).into())
    }
}

#[async_trait]
impl ExternalCalendarProvider for GoogleCalendarClient {
    #[instrument(skip(self, options), fields(calendar_id = %options.calendar_id))]
    async fn list_events(
        &self,
        user_id: i64,
        options: &ListEventsOptions,
    ) -> Result<Vec<ExternalCalendarEvent>> {
        let session = self.session(user_id).await?;

        let time_min = options.time_min.unwrap_or_else(Utc::now);
        let mut query = vec![
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", options.max_results.to_string()),
            ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ];
        if let Some(time_max) = options.time_max {
            query.push(("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }

        let request = self.http.request(Method::GET, self.events_url(&options.calendar_id)).query(&query);
        let page: EventsResponse = self.execute_json(&session, request).await?;
        let events = page.into_events();

        debug!(user_id, count = events.len(), "listed Google events");
        Ok(events)
    }

    #[instrument(skip(self, payload))]
    async fn create_event(
        &self,
        user_id: i64,
        payload: &ExternalEventPayload,
        calendar_id: &str,
    ) -> Result<ExternalCalendarEvent> {
        let session = self.session(user_id).await?;
        let request = self.http.request(Method::POST, self.events_url(calendar_id)).json(payload);
        self.execute_json(&session, request).await
    }

    #[instrument(skip(self, payload))]
    async fn update_event(
        &self,
        user_id: i64,
        external_id: &str,
        payload: &ExternalEventPayload,
        calendar_id: &str,
    ) -> Result<ExternalCalendarEvent> {
        let session = self.session(user_id).await?;
        let request =
            self.http.request(Method::PATCH, self.event_url(calendar_id, external_id)).json(payload);
        self.execute_json(&session, request).await
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, user_id: i64, external_id: &str, calendar_id: &str) -> Result<()> {
        let session = self.session(user_id).await?;
        let request = self.http.request(Method::DELETE, self.event_url(calendar_id, external_id));
        self.execute(&session, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_calendars(&self, user_id: i64) -> Result<Vec<ExternalCalendar>> {
        let session = self.session(user_id).await?;
        let request = self.http.request(Method::GET, format!("{}/users/me/calendarList", self.api_base));
        let list: CalendarListResponse = self.execute_json(&session, request).await?;
        Ok(list.items)
    }
}
