//! External calendar provider port interfaces
//!
//! The provider client and the credential manager live in infra; the
//! unified service only sees these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_domain::{
    CalendarProvider, Credential, ExternalCalendar, ExternalCalendarEvent, ExternalEventPayload,
    ListEventsOptions, NewCredential, Result,
};

/// Event CRUD and calendar listing against the external provider.
///
/// Every method fails with `ProviderUnavailable` when no authenticated
/// session can be obtained for `user_id`.
#[async_trait]
pub trait ExternalCalendarProvider: Send + Sync {
    /// Single events (recurring instances expanded), ordered by start time.
    async fn list_events(
        &self,
        user_id: i64,
        options: &ListEventsOptions,
    ) -> Result<Vec<ExternalCalendarEvent>>;

    async fn create_event(
        &self,
        user_id: i64,
        payload: &ExternalEventPayload,
        calendar_id: &str,
    ) -> Result<ExternalCalendarEvent>;

    /// Partial update; provider rejections surface as `ProviderApiError`.
    async fn update_event(
        &self,
        user_id: i64,
        external_id: &str,
        payload: &ExternalEventPayload,
        calendar_id: &str,
    ) -> Result<ExternalCalendarEvent>;

    async fn delete_event(&self, user_id: i64, external_id: &str, calendar_id: &str) -> Result<()>;

    async fn list_calendars(&self, user_id: i64) -> Result<Vec<ExternalCalendar>>;
}

/// Read side of the credential manager used for integration state.
#[async_trait]
pub trait ProviderCredentials: Send + Sync {
    async fn get_credential(&self, user_id: i64) -> Result<Option<Credential>>;

    /// Whether an authenticated session exists and answers a lightweight calendar call.
    /// Never fails; any error means `false`.
    async fn has_valid_session(&self, user_id: i64) -> bool;
}

/// Persistence for provider credentials, one row per (user, provider).
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get(&self, user_id: i64, provider: CalendarProvider) -> Result<Option<Credential>>;

    /// Insert or update in place. A missing refresh token keeps the stored
    /// one.
    async fn upsert(&self, credential: NewCredential) -> Result<Credential>;

    /// Replace the token pair after a refresh in one statement.
    async fn update_tokens(
        &self,
        user_id: i64,
        provider: CalendarProvider,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Credential>;

    /// Returns the number of rows removed.
    async fn delete(&self, user_id: i64, provider: CalendarProvider) -> Result<usize>;
}
