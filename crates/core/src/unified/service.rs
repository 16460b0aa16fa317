//! Unified event service
//!
//! Coordinates the local event store and the external calendar provider.
//! Reads merge both origins into one list sorted by start time; writes are
//! routed by the namespace of the event id. The service owns no storage.
//!
//! Provider failures never break local functionality: during reads they
//! are logged and count as zero external events, and session checks that
//! fail or time out count as "not connected". Only operations that target
//! the provider explicitly (external create, update, delete) propagate
//! provider errors.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_domain::constants::DEFAULT_CALENDAR_ID;
use daybook_domain::{
    CalendarProvider, DaybookError, EventInput, EventRef, EventStatistics, ExternalCalendar,
    IntegrationStatus, ListEventsOptions, LocalEventFilters, Origin, ProviderConfig, Result,
    SaveOptions, UnifiedEvent, UnifiedEventFilters,
};
use tracing::{debug, info, instrument, warn};

use super::format::{
    from_external, from_local, new_local_from_input, patch_from_input, payload_for_new, to_payload,
};
use crate::calendar_ports::{ExternalCalendarProvider, ProviderCredentials};
use crate::events::LocalEventStore;
use crate::utils::time::{bucket_for, saturating_add_days, today_window, DayBucket};

/// External provider client plus the credential manager it authenticates
/// through.
#[derive(Clone)]
pub struct ExternalIntegration {
    pub provider: Arc<dyn ExternalCalendarProvider>,
    pub credentials: Arc<dyn ProviderCredentials>,
}

/// Unified event service
pub struct UnifiedEventService {
    store: Arc<LocalEventStore>,
    external: Option<ExternalIntegration>,
    settings: ProviderConfig,
}

impl UnifiedEventService {
    /// Local-only service; every user reads as "not connected".
    pub fn new(store: Arc<LocalEventStore>) -> Self {
        Self { store, external: None, settings: ProviderConfig::default() }
    }

    pub fn with_external(
        mut self,
        provider: Arc<dyn ExternalCalendarProvider>,
        credentials: Arc<dyn ProviderCredentials>,
    ) -> Self {
        self.external = Some(ExternalIntegration { provider, credentials });
        self
    }

    pub fn with_settings(mut self, settings: ProviderConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Merge local and external events into one list sorted by start time.
    ///
    /// Both reads are issued concurrently. Local errors propagate; external
    /// errors are logged and yield no external events.
    #[instrument(skip(self, filters))]
    pub async fn get_all_events(
        &self,
        user_id: i64,
        filters: UnifiedEventFilters,
    ) -> Result<Vec<UnifiedEvent>> {
        let (local, external) =
            tokio::join!(self.fetch_local(user_id, &filters), self.fetch_external(user_id, &filters));

        let mut events = local?;
        let local_count = events.len();
        events.extend(external);
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        debug!(
            local = local_count,
            external = events.len() - local_count,
            "merged events"
        );

        Ok(paginate(events, filters.offset, filters.limit))
    }

    pub async fn get_all_today_events(&self, user_id: i64) -> Result<Vec<UnifiedEvent>> {
        let (start, end) = today_window(Utc::now());
        self.get_all_events(user_id, UnifiedEventFilters::between(start, end)).await
    }

    /// Events from now through `days` days ahead, paginated after merging.
    ///
    /// The window is `[now, now + days)`, anchored on the current instant,
    /// and `days` is clamped so an oversized value reaches the end of the
    /// calendar range. The statistics "upcoming" bucket is instead anchored
    /// on the next UTC midnight (see [`crate::utils::time::upcoming_window`]), so
    /// an event later today is listed here but counted as "today".
    pub async fn get_all_upcoming_events(
        &self,
        user_id: i64,
        days: i64,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<UnifiedEvent>> {
        let now = Utc::now();
        let filters = UnifiedEventFilters::between(now, saturating_add_days(now, days))
            .paginate(limit, offset);
        self.get_all_events(user_id, filters).await
    }

    pub async fn get_events_in_range(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UnifiedEvent>> {
        self.get_all_events(user_id, UnifiedEventFilters::between(start, end)).await
    }

    pub async fn get_events_by_origin(
        &self,
        user_id: i64,
        origin: Origin,
    ) -> Result<Vec<UnifiedEvent>> {
        self.get_all_events(user_id, UnifiedEventFilters::only(origin)).await
    }

    /// Case-insensitive substring search over title, description and
    /// location of the merged set.
    pub async fn search_all_events(&self, user_id: i64, term: &str) -> Result<Vec<UnifiedEvent>> {
        let needle = term.trim().to_lowercase();
        let events = self.get_all_events(user_id, UnifiedEventFilters::default()).await?;
        Ok(events.into_iter().filter(|event| event.matches_term(&needle)).collect())
    }

    pub async fn get_event_statistics(&self, user_id: i64) -> Result<EventStatistics> {
        self.get_event_statistics_at(user_id, Utc::now()).await
    }

    /// Statistics relative to an explicit `now`.
    pub async fn get_event_statistics_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<EventStatistics> {
        let events = self.get_all_events(user_id, UnifiedEventFilters::default()).await?;
        Ok(tally(&events, now, self.settings.upcoming_window_days))
    }

    /// Create or update an event and return it in unified form.
    ///
    /// With `options.event_id` the call updates whichever backend the id
    /// names. Without it, the event is created externally only when
    /// `preferred_origin` is external and the user has a valid session;
    /// otherwise it is created locally, unless strict mode is on.
    ///
    /// # Errors
    /// `InvalidEventId` for a malformed id (no backend is called),
    /// `NotFound`/`UserNotFound`/`InvalidInput` from the local store, and
    /// provider errors for provider-targeted writes.
    #[instrument(skip(self, input, options), fields(event_id = ?options.event_id))]
    pub async fn save_event(
        &self,
        user_id: i64,
        input: EventInput,
        options: SaveOptions,
    ) -> Result<UnifiedEvent> {
        let calendar_id = options.calendar_id.as_deref().unwrap_or(DEFAULT_CALENDAR_ID);

        match options.event_id.as_deref() {
            Some(raw_id) => match EventRef::parse(raw_id)? {
                EventRef::Local(id) => {
                    let updated = self.store.update(id, user_id, patch_from_input(&input)).await?;
                    Ok(from_local(updated))
                }
                EventRef::External(external_id) => {
                    let provider = self.require_provider()?;
                    let payload = to_payload(&input);
                    let updated = self
                        .bounded(
                            "update_event",
                            provider.update_event(user_id, &external_id, &payload, calendar_id),
                        )
                        .await?;
                    from_external(updated)
                }
            },
            None => self.create_event(user_id, &input, &options, calendar_id).await,
        }
    }

    async fn create_event(
        &self,
        user_id: i64,
        input: &EventInput,
        options: &SaveOptions,
        calendar_id: &str,
    ) -> Result<UnifiedEvent> {
        let new_event = new_local_from_input(input)?;

        if options.preferred_origin == Origin::External {
            if self.session_is_valid(user_id).await {
                let provider = self.require_provider()?;
                let payload = payload_for_new(&new_event);
                let created = self
                    .bounded("create_event", provider.create_event(user_id, &payload, calendar_id))
                    .await?;
                info!(user_id, "event created in external calendar");
                return from_external(created);
            }

            if options.require_external || self.settings.strict_external_create {
                return Err(DaybookError::ProviderUnavailable(
                    "external calendar is not connected for this user".into(),
                ));
            }

            info!(user_id, "external calendar not connected, creating event locally");
        }

        let created = self.store.create(user_id, new_event).await?;
        Ok(from_local(created))
    }

    /// Delete by namespaced id.
    ///
    /// # Errors
    /// `InvalidEventId` without touching either backend; otherwise whatever
    /// the targeted backend reports.
    #[instrument(skip(self))]
    pub async fn delete_event(
        &self,
        user_id: i64,
        event_id: &str,
        calendar_id: Option<&str>,
    ) -> Result<()> {
        match EventRef::parse(event_id)? {
            EventRef::Local(id) => {
                self.store.delete(id, user_id).await?;
            }
            EventRef::External(external_id) => {
                let provider = self.require_provider()?;
                let calendar_id = calendar_id.unwrap_or(DEFAULT_CALENDAR_ID);
                self.bounded(
                    "delete_event",
                    provider.delete_event(user_id, &external_id, calendar_id),
                )
                .await?;
            }
        }
        info!(user_id, event_id, "event deleted");
        Ok(())
    }

    pub async fn has_google_integration(&self, user_id: i64) -> bool {
        self.session_is_valid(user_id).await
    }

    /// Integration state for the UI. Never fails; every lookup degrades.
    pub async fn get_integration_status(&self, user_id: i64) -> IntegrationStatus {
        let mut status = IntegrationStatus {
            provider: CalendarProvider::Google,
            connected: false,
            has_credential: false,
            expires_at: None,
            calendars: Vec::new(),
        };

        let Some(external) = &self.external else {
            return status;
        };

        match self.bounded("get_credential", external.credentials.get_credential(user_id)).await {
            Ok(Some(credential)) => {
                status.has_credential = true;
                status.expires_at = credential.expires_at;
            }
            Ok(None) => {}
            Err(err) => warn!(user_id, error = %err, "credential lookup failed"),
        }

        status.connected = self.session_is_valid(user_id).await;
        if status.connected {
            match self.bounded("list_calendars", external.provider.list_calendars(user_id)).await {
                Ok(calendars) => status.calendars = calendars,
                Err(err) => warn!(user_id, error = %err, "calendar list unavailable"),
            }
        }

        status
    }

    /// Calendars visible to the user at the provider.
    ///
    /// # Errors
    /// `ProviderUnavailable` when no integration or session exists.
    pub async fn list_external_calendars(&self, user_id: i64) -> Result<Vec<ExternalCalendar>> {
        let provider = self.require_provider()?;
        self.bounded("list_calendars", provider.list_calendars(user_id)).await
    }

    async fn fetch_local(
        &self,
        user_id: i64,
        filters: &UnifiedEventFilters,
    ) -> Result<Vec<UnifiedEvent>> {
        if !filters.include_local {
            return Ok(Vec::new());
        }

        let local_filters = LocalEventFilters {
            start_date: filters.start_date,
            end_date: filters.end_date,
            ..LocalEventFilters::default()
        };
        let events = self.store.list(user_id, local_filters).await?;
        Ok(events.into_iter().map(from_local).collect())
    }

    /// Always yields a list; failures are logged and produce an empty one.
    async fn fetch_external(&self, user_id: i64, filters: &UnifiedEventFilters) -> Vec<UnifiedEvent> {
        if !filters.include_external {
            return Vec::new();
        }
        let Some(external) = &self.external else {
            return Vec::new();
        };
        if !self.session_is_valid(user_id).await {
            debug!(user_id, "external calendar not connected, skipping");
            return Vec::new();
        }

        let options = ListEventsOptions {
            max_results: self.settings.max_results,
            time_min: filters.start_date,
            time_max: filters.end_date,
            ..ListEventsOptions::default()
        };

        let raw_events =
            match self.bounded("list_events", external.provider.list_events(user_id, &options)).await {
                Ok(events) => events,
                Err(err) => {
                    warn!(user_id, error = %err, "external event fetch failed, continuing with local events");
                    return Vec::new();
                }
            };

        raw_events
            .into_iter()
            .filter(|event| event.status.as_deref() != Some("cancelled"))
            .filter_map(|event| {
                let event_id = event.id.clone();
                match from_external(event) {
                    Ok(unified) => Some(unified),
                    Err(err) => {
                        warn!(user_id, event_id = %event_id, error = %err, "skipping malformed external event");
                        None
                    }
                }
            })
            .collect()
    }

    /// Session check bounded by the provider timeout; any failure is
    /// "not connected".
    async fn session_is_valid(&self, user_id: i64) -> bool {
        let Some(external) = &self.external else {
            return false;
        };
        match tokio::time::timeout(
            self.settings.timeout(),
            external.credentials.has_valid_session(user_id),
        )
        .await
        {
            Ok(valid) => valid,
            Err(_) => {
                warn!(user_id, timeout_secs = self.settings.timeout_secs, "session check timed out");
                false
            }
        }
    }

    fn require_provider(&self) -> Result<&Arc<dyn ExternalCalendarProvider>> {
        self.external.as_ref().map(|external| &external.provider).ok_or_else(|| {
            DaybookError::ProviderUnavailable("external calendar integration is not configured".into())
        })
    }

    /// Run a provider call under the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.settings.timeout(), call).await.unwrap_or_else(|_| {
            warn!(operation, timeout_secs = self.settings.timeout_secs, "provider call timed out");
            Err(DaybookError::ProviderUnavailable(format!(
                "{operation} timed out after {}s",
                self.settings.timeout().as_secs()
            )))
        })
    }
}

fn paginate(events: Vec<UnifiedEvent>, offset: Option<usize>, limit: Option<usize>) -> Vec<UnifiedEvent> {
    let skipped = events.into_iter().skip(offset.unwrap_or(0));
    match limit {
        Some(limit) => skipped.take(limit).collect(),
        None => skipped.collect(),
    }
}

fn tally(events: &[UnifiedEvent], now: DateTime<Utc>, upcoming_days: i64) -> EventStatistics {
    let mut stats = EventStatistics { total_events: events.len(), ..EventStatistics::default() };

    for event in events {
        match event.origin {
            Origin::Local => stats.local_events += 1,
            Origin::External => stats.google_events += 1,
        }
        match bucket_for(event.start_time, now, upcoming_days) {
            DayBucket::Today => stats.today_events += 1,
            DayBucket::Upcoming => stats.upcoming_events += 1,
            DayBucket::Other => {}
        }
        if event.is_all_day {
            stats.all_day_events += 1;
        }
        if event.is_recurring() {
            stats.recurring_events += 1;
        }
    }

    stats
}
