//! Local event store service
//!
//! Wraps a [`LocalEventRepository`] with ownership-aware error mapping,
//! input validation and the derived queries (today, upcoming, search,
//! statistics).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_domain::constants::DEFAULT_UPCOMING_DAYS;
use daybook_domain::{
    DaybookError, LocalEvent, LocalEventFilters, LocalEventPatch, LocalEventStatistics,
    NewLocalEvent, Result,
};
use tracing::{debug, instrument};

use super::ports::LocalEventRepository;
use crate::utils::time::{bucket_for, saturating_add_days, today_window, DayBucket};

/// Local event store service
pub struct LocalEventStore {
    repository: Arc<dyn LocalEventRepository>,
    upcoming_days: i64,
}

impl LocalEventStore {
    pub fn new(repository: Arc<dyn LocalEventRepository>) -> Self {
        Self { repository, upcoming_days: DEFAULT_UPCOMING_DAYS }
    }

    /// Window used by [`Self::statistics`] for the upcoming count.
    pub fn with_upcoming_days(mut self, days: i64) -> Self {
        self.upcoming_days = days.max(0);
        self
    }

    pub async fn list(&self, user_id: i64, filters: LocalEventFilters) -> Result<Vec<LocalEvent>> {
        self.repository.list(user_id, filters).await
    }

    /// # Errors
    /// `NotFound` when the event does not exist or belongs to another user.
    pub async fn get_by_id(&self, id: i64, user_id: i64) -> Result<LocalEvent> {
        self.repository.get_by_id(id, user_id).await?.ok_or_else(|| not_found(id))
    }

    /// # Errors
    /// `InvalidInput` for a blank title or an end before the start,
    /// `UserNotFound` when the owner does not exist.
    #[instrument(skip(self, event))]
    pub async fn create(&self, user_id: i64, event: NewLocalEvent) -> Result<LocalEvent> {
        let event = normalize_new_event(event)?;
        let created = self.repository.create(user_id, event).await?;
        debug!(event_id = created.id, "local event created");
        Ok(created)
    }

    /// # Errors
    /// `NotFound` when no row matches `(id, user_id)`, `InvalidInput` when
    /// the merged times would end before they start.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, user_id: i64, patch: LocalEventPatch) -> Result<LocalEvent> {
        let existing = self.get_by_id(id, user_id).await?;
        let patch = normalize_patch(patch)?;

        if patch.is_empty() {
            return Ok(existing);
        }

        let start = patch.start_time.unwrap_or(existing.start_time);
        let end = patch.end_time.unwrap_or(existing.end_time);
        ensure_ordered(start, end)?;

        self.repository.update(id, user_id, patch).await?.ok_or_else(|| not_found(id))
    }

    /// Delete and return the removed row.
    ///
    /// # Errors
    /// `NotFound` when no row matches `(id, user_id)`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<LocalEvent> {
        self.repository.delete(id, user_id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn in_range(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocalEvent>> {
        self.list(user_id, LocalEventFilters::between(start, end)).await
    }

    pub async fn today(&self, user_id: i64) -> Result<Vec<LocalEvent>> {
        let (start, end) = today_window(Utc::now());
        self.in_range(user_id, start, end).await
    }

    /// Events starting from now through `days` days ahead.
    ///
    /// Anchored on the current instant, unlike the statistics "upcoming"
    /// bucket which starts at the next UTC midnight.
    pub async fn upcoming(
        &self,
        user_id: i64,
        days: i64,
        limit: Option<u32>,
    ) -> Result<Vec<LocalEvent>> {
        let now = Utc::now();
        let filters = LocalEventFilters {
            start_date: Some(now),
            end_date: Some(saturating_add_days(now, days)),
            limit,
            offset: None,
        };
        self.list(user_id, filters).await
    }

    /// Case-insensitive substring match over title, description and
    /// location.
    pub async fn search(&self, user_id: i64, term: &str) -> Result<Vec<LocalEvent>> {
        let needle = term.trim().to_lowercase();
        let events = self.list(user_id, LocalEventFilters::default()).await?;
        Ok(events.into_iter().filter(|event| local_matches(event, &needle)).collect())
    }

    pub async fn statistics(&self, user_id: i64) -> Result<LocalEventStatistics> {
        self.statistics_at(user_id, Utc::now()).await
    }

    /// Statistics relative to an explicit `now`.
    pub async fn statistics_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<LocalEventStatistics> {
        let events = self.list(user_id, LocalEventFilters::default()).await?;

        let mut stats = LocalEventStatistics { total: events.len(), ..LocalEventStatistics::default() };
        for event in &events {
            match bucket_for(event.start_time, now, self.upcoming_days) {
                DayBucket::Today => stats.today += 1,
                DayBucket::Upcoming => stats.upcoming += 1,
                DayBucket::Other => {}
            }
            if event.is_all_day {
                stats.all_day += 1;
            }
            if event.recurrence.is_recurring() {
                stats.recurring += 1;
            }
        }
        Ok(stats)
    }

    pub async fn has_any(&self, user_id: i64) -> Result<bool> {
        Ok(self.count(user_id).await? > 0)
    }

    pub async fn count(&self, user_id: i64) -> Result<u64> {
        self.repository.count(user_id).await
    }
}

fn not_found(id: i64) -> DaybookError {
    DaybookError::NotFound(format!("local event {id}"))
}

fn local_matches(event: &LocalEvent, needle: &str) -> bool {
    let hit = |value: &str| value.to_lowercase().contains(needle);
    hit(&event.title)
        || event.description.as_deref().is_some_and(hit)
        || event.location.as_deref().is_some_and(hit)
}

fn ensure_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(DaybookError::InvalidInput("event end time is before its start time".into()));
    }
    Ok(())
}

/// Trim text fields and drop blank optionals.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_new_event(mut event: NewLocalEvent) -> Result<NewLocalEvent> {
    event.title = event.title.trim().to_string();
    if event.title.is_empty() {
        return Err(DaybookError::InvalidInput("event title is required".into()));
    }
    event.description = non_blank(event.description);
    event.location = non_blank(event.location);
    ensure_ordered(event.start_time, event.end_time)?;
    Ok(event)
}

fn normalize_patch(mut patch: LocalEventPatch) -> Result<LocalEventPatch> {
    if let Some(title) = patch.title.take() {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(DaybookError::InvalidInput("event title cannot be blank".into()));
        }
        patch.title = Some(title);
    }
    // Blank strings survive here so the repository can clear the column.
    patch.description = patch.description.map(|v| v.trim().to_string());
    patch.location = patch.location.map(|v| v.trim().to_string());
    Ok(patch)
}
