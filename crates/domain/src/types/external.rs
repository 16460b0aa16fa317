//! Provider-native event and calendar shapes (Google Calendar v3).
//!
//! These mirror the JSON the provider sends and accepts. They are never
//! persisted locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CALENDAR_ID, DEFAULT_MAX_RESULTS};

/// Start or end of a provider event.
///
/// Exactly one of `date_time` (timed) and `date` (all-day, `YYYY-MM-DD`)
/// is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ExternalEventDateTime {
    pub fn timed(at: DateTime<Utc>) -> Self {
        Self { date_time: Some(at.to_rfc3339()), ..Self::default() }
    }

    pub fn all_day(date: chrono::NaiveDate) -> Self {
        Self { date: Some(date.format("%Y-%m-%d").to_string()), ..Self::default() }
    }

    /// All-day marker: a `date` with no `dateTime`.
    pub fn is_all_day(&self) -> bool {
        self.date.is_some() && self.date_time.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAttendee {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub response_status: Option<String>,
}

/// Event as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<ExternalEventDateTime>,
    #[serde(default)]
    pub end: Option<ExternalEventDateTime>,
    #[serde(default)]
    pub recurrence: Vec<String>,
    #[serde(default)]
    pub attendees: Vec<ExternalAttendee>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub html_link: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

/// Insert/patch body sent to the provider. Absent fields are omitted so a
/// patch only touches what the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ExternalEventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ExternalEventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
}

/// Entry from the provider's calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCalendar {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub access_role: Option<String>,
}

/// Options for listing provider events.
///
/// `time_min` defaults to "now" at request time when left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventsOptions {
    pub max_results: u32,
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub calendar_id: String,
}

impl Default for ListEventsOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            time_min: None,
            time_max: None,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
        }
    }
}
