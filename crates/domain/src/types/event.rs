//! Unified read model shared by every event origin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::event_ref::EventRef;
use crate::impl_str_enum_conversions;

/// Which backend an event instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Local,
    /// Google Calendar. Older callers send `"google"`.
    #[serde(alias = "google")]
    External,
}

impl_str_enum_conversions!(Origin {
    Local => "local",
    External => "external",
});

/// Repeat frequency of an event.
///
/// Local events store it directly; provider events are approximated from
/// their first `RRULE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl_str_enum_conversions!(Recurrence {
    None => "none",
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

impl Recurrence {
    pub fn is_recurring(self) -> bool {
        self != Self::None
    }

    /// Parse a stored or user-supplied value, treating anything unknown as
    /// non-recurring.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Provider rule line for this frequency, `None` when not recurring.
    pub fn to_rrule(self) -> Option<String> {
        if self.is_recurring() {
            Some(format!("RRULE:FREQ={}", self.as_str().to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Approximate a provider recurrence list by the `FREQ` of its first
    /// `RRULE` line. `EXDATE`/`RDATE` lines are ignored.
    pub fn from_rrules<S: AsRef<str>>(rules: &[S]) -> Self {
        rules
            .iter()
            .filter_map(|rule| rule.as_ref().trim().strip_prefix("RRULE:"))
            .flat_map(|body| body.split(';'))
            .find_map(|part| part.strip_prefix("FREQ="))
            .map(Self::parse_lenient)
            .unwrap_or_default()
    }
}

/// Attendee of a provider event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: Option<String>,
}

/// One event as presented to callers, regardless of where it lives.
///
/// `id` is the namespaced form of `original_id` (`local_42`,
/// `external_abc`) and is what callers pass back to mutate the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UnifiedEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_all_day: bool,
    pub recurrence: Recurrence,
    pub origin: Origin,
    pub original_id: EventRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UnifiedEvent {
    /// Case-insensitive substring match over title, description and location.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_term(&self, needle: &str) -> bool {
        let hit = |value: &str| value.to_lowercase().contains(needle);
        hit(&self.title)
            || self.description.as_deref().is_some_and(hit)
            || self.location.as_deref().is_some_and(hit)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }
}
