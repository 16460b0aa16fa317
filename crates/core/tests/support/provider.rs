//! Mock external calendar provider and credential manager.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use daybook_core::{ExternalCalendarProvider, ProviderCredentials};
use daybook_domain::{
    CalendarProvider, Credential, DaybookError, ExternalCalendar, ExternalCalendarEvent,
    ExternalEventPayload, ListEventsOptions, Result as DomainResult,
};

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    List,
    Create { calendar_id: String, payload: ExternalEventPayload },
    Update { external_id: String, calendar_id: String, payload: ExternalEventPayload },
    Delete { external_id: String, calendar_id: String },
    ListCalendars,
}

/// In-memory provider that records every call.
///
/// `fail_with` makes every call return the given error; `delay` makes
/// every call sleep first (for timeout tests).
#[derive(Default, Clone)]
pub struct MockCalendarProvider {
    events: Arc<Mutex<Vec<ExternalCalendarEvent>>>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    failure: Arc<Mutex<Option<DaybookError>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockCalendarProvider {
    pub fn new(events: Vec<ExternalCalendarEvent>) -> Self {
        Self { events: Arc::new(Mutex::new(events)), ..Self::default() }
    }

    pub fn fail_with(&self, error: DaybookError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: ProviderCall) -> DomainResult<()> {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn event_from_payload(id: String, payload: &ExternalEventPayload) -> ExternalCalendarEvent {
    ExternalCalendarEvent {
        id,
        summary: payload.summary.clone(),
        description: payload.description.clone(),
        location: payload.location.clone(),
        start: payload.start.clone(),
        end: payload.end.clone(),
        recurrence: payload.recurrence.clone().unwrap_or_default(),
        status: Some("confirmed".into()),
        ..ExternalCalendarEvent::default()
    }
}

#[async_trait]
impl ExternalCalendarProvider for MockCalendarProvider {
    async fn list_events(
        &self,
        _user_id: i64,
        _options: &ListEventsOptions,
    ) -> DomainResult<Vec<ExternalCalendarEvent>> {
        self.enter(ProviderCall::List).await?;
        Ok(self.events.lock().unwrap().clone())
    }

    async fn create_event(
        &self,
        _user_id: i64,
        payload: &ExternalEventPayload,
        calendar_id: &str,
    ) -> DomainResult<ExternalCalendarEvent> {
        self.enter(ProviderCall::Create {
            calendar_id: calendar_id.to_string(),
            payload: payload.clone(),
        })
        .await?;

        let mut events = self.events.lock().unwrap();
        let event = event_from_payload(format!("created{}", events.len() + 1), payload);
        events.push(event.clone());
        Ok(event)
    }

    async fn update_event(
        &self,
        _user_id: i64,
        external_id: &str,
        payload: &ExternalEventPayload,
        calendar_id: &str,
    ) -> DomainResult<ExternalCalendarEvent> {
        self.enter(ProviderCall::Update {
            external_id: external_id.to_string(),
            calendar_id: calendar_id.to_string(),
            payload: payload.clone(),
        })
        .await?;

        let mut events = self.events.lock().unwrap();
        let existing = events
            .iter_mut()
            .find(|e| e.id == external_id)
            .ok_or_else(|| DaybookError::ProviderApiError("Not Found".into()))?;

        if let Some(summary) = &payload.summary {
            existing.summary = Some(summary.clone());
        }
        if let Some(description) = &payload.description {
            existing.description = Some(description.clone());
        }
        if let Some(location) = &payload.location {
            existing.location = Some(location.clone());
        }
        if let Some(start) = &payload.start {
            existing.start = Some(start.clone());
        }
        if let Some(end) = &payload.end {
            existing.end = Some(end.clone());
        }
        if let Some(recurrence) = &payload.recurrence {
            existing.recurrence = recurrence.clone();
        }
        Ok(existing.clone())
    }

    async fn delete_event(&self, _user_id: i64, external_id: &str, calendar_id: &str) -> DomainResult<()> {
        self.enter(ProviderCall::Delete {
            external_id: external_id.to_string(),
            calendar_id: calendar_id.to_string(),
        })
        .await?;
        self.events.lock().unwrap().retain(|e| e.id != external_id);
        Ok(())
    }

    async fn list_calendars(&self, _user_id: i64) -> DomainResult<Vec<ExternalCalendar>> {
        self.enter(ProviderCall::ListCalendars).await?;
        Ok(vec![ExternalCalendar {
            id: "primary".into(),
            summary: Some("Personal".into()),
            primary: true,
            time_zone: Some("UTC".into()),
            access_role: Some("owner".into()),
        }])
    }
}

/// Credential manager mock with a settable session state.
#[derive(Default, Clone)]
pub struct MockCredentials {
    connected: Arc<Mutex<bool>>,
    credential: Arc<Mutex<Option<Credential>>>,
}

impl MockCredentials {
    pub fn connected() -> Self {
        let credentials = Self::default();
        credentials.set_connected(true);
        *credentials.credential.lock().unwrap() = Some(Credential {
            id: 1,
            user_id: 1,
            provider: CalendarProvider::Google,
            access_token: "ya29.token".into(),
            refresh_token: Some("1//refresh".into()),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            scope: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        credentials
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        *self.connected.lock().unwrap() = connected;
    }
}

#[async_trait]
impl ProviderCredentials for MockCredentials {
    async fn get_credential(&self, _user_id: i64) -> DomainResult<Option<Credential>> {
        Ok(self.credential.lock().unwrap().clone())
    }

    async fn has_valid_session(&self, _user_id: i64) -> bool {
        *self.connected.lock().unwrap()
    }
}
