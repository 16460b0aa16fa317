//! Events owned by the local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::Recurrence;

/// Persisted local event row. Always owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEvent {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_all_day: bool,
    pub recurrence: Recurrence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a local event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocalEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
}

/// Partial update. `None` leaves a column untouched; a blank
/// `description`/`location` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalEventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_all_day: Option<bool>,
    pub recurrence: Option<Recurrence>,
}

impl LocalEventPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Query filters for listing local events.
///
/// `start_date` keeps events with `start_time >= start_date`; `end_date`
/// keeps events with `end_time <= end_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalEventFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LocalEventFilters {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start_date: Some(start), end_date: Some(end), ..Self::default() }
    }
}

/// Counts derived from a user's local events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEventStatistics {
    pub total: usize,
    pub today: usize,
    pub upcoming: usize,
    pub all_day: usize,
    pub recurring: usize,
}
