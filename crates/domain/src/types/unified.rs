//! Request and response shapes of the unified event service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::credential::CalendarProvider;
use super::event::{Origin, Recurrence};
use super::external::ExternalCalendar;

fn default_true() -> bool {
    true
}

/// Filters for the aggregate read.
///
/// Pagination applies after both origins are merged and sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedEventFilters {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub include_local: bool,
    #[serde(default = "default_true", alias = "includeGoogle")]
    pub include_external: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl Default for UnifiedEventFilters {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            include_local: true,
            include_external: true,
            limit: None,
            offset: None,
        }
    }
}

impl UnifiedEventFilters {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start_date: Some(start), end_date: Some(end), ..Self::default() }
    }

    pub fn only(origin: Origin) -> Self {
        Self {
            include_local: origin == Origin::Local,
            include_external: origin == Origin::External,
            ..Self::default()
        }
    }

    pub fn paginate(mut self, limit: Option<usize>, offset: Option<usize>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Caller-supplied event fields for create or update.
///
/// Creating requires `title` and `start_time`; updating sends only what is
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_all_day: Option<bool>,
    pub recurrence: Option<Recurrence>,
}

/// Routing options for `save_event`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveOptions {
    /// Namespaced id of the event to update; absent means create.
    pub event_id: Option<String>,
    pub preferred_origin: Origin,
    pub calendar_id: Option<String>,
    /// Fail with `ProviderUnavailable` instead of falling back to a local
    /// create when the external provider is not connected.
    pub require_external: bool,
}

impl SaveOptions {
    pub fn update(event_id: impl Into<String>) -> Self {
        Self { event_id: Some(event_id.into()), ..Self::default() }
    }

    pub fn create_in(origin: Origin) -> Self {
        Self { preferred_origin: origin, ..Self::default() }
    }
}

/// Cross-source counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EventStatistics {
    pub total_events: usize,
    pub local_events: usize,
    pub google_events: usize,
    pub today_events: usize,
    pub upcoming_events: usize,
    pub all_day_events: usize,
    pub recurring_events: usize,
}

/// Provider integration state shown by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    pub provider: CalendarProvider,
    pub connected: bool,
    pub has_credential: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub calendars: Vec<ExternalCalendar>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_default_to_both_origins() {
        let filters: UnifiedEventFilters = serde_json::from_str("{}").unwrap();
        assert!(filters.include_local);
        assert!(filters.include_external);
    }

    #[test]
    fn filters_accept_include_google_alias() {
        let filters: UnifiedEventFilters =
            serde_json::from_str(r#"{"includeGoogle": false}"#).unwrap();
        assert!(!filters.include_external);
        assert!(filters.include_local);
    }

    #[test]
    fn statistics_serialize_with_google_key() {
        let json = serde_json::to_value(EventStatistics::default()).unwrap();
        assert_eq!(json["googleEvents"], 0);
        assert_eq!(json["upcomingEvents"], 0);
    }

    #[test]
    fn save_options_default_to_local_create() {
        let options = SaveOptions::default();
        assert_eq!(options.preferred_origin, Origin::Local);
        assert!(options.event_id.is_none());
        assert!(!options.require_external);
    }
}
