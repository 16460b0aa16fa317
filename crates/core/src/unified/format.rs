//! Conversions between source-native events and [`UnifiedEvent`].

use chrono::{DateTime, Duration, NaiveDate, Utc};
use daybook_domain::constants::{DEFAULT_TIMED_EVENT_MINUTES, UNTITLED_EVENT_TITLE};
use daybook_domain::{
    Attendee, DaybookError, EventInput, EventRef, ExternalCalendarEvent, ExternalEventDateTime,
    ExternalEventPayload, LocalEvent, LocalEventPatch, NewLocalEvent, Origin, Recurrence, Result,
    UnifiedEvent,
};

use crate::events::store::non_blank;
use crate::utils::time::{saturating_add, saturating_add_days};

pub fn from_local(event: LocalEvent) -> UnifiedEvent {
    let reference = EventRef::Local(event.id);
    UnifiedEvent {
        id: reference.to_string(),
        title: event.title,
        description: event.description,
        location: event.location,
        start_time: event.start_time,
        end_time: event.end_time,
        is_all_day: event.is_all_day,
        recurrence: event.recurrence,
        origin: Origin::Local,
        original_id: reference,
        attendees: None,
        created_at: Some(event.created_at),
        updated_at: Some(event.updated_at),
    }
}

/// Format a provider event.
///
/// # Errors
/// `Internal` when the event has no parseable start.
pub fn from_external(event: ExternalCalendarEvent) -> Result<UnifiedEvent> {
    let start = event.start.as_ref().ok_or_else(|| malformed(&event.id, "missing start"))?;
    let is_all_day = start.is_all_day();
    let start_time =
        parse_provider_time(start).ok_or_else(|| malformed(&event.id, "unparseable start"))?;

    let end_time = event
        .end
        .as_ref()
        .and_then(parse_provider_time)
        .unwrap_or_else(|| default_end(start_time, is_all_day));

    let attendees: Vec<Attendee> = event
        .attendees
        .into_iter()
        .filter_map(|attendee| {
            attendee.email.map(|email| Attendee {
                email,
                display_name: attendee.display_name,
                response_status: attendee.response_status,
            })
        })
        .collect();

    let reference = EventRef::External(event.id);
    Ok(UnifiedEvent {
        id: reference.to_string(),
        title: non_blank(event.summary).unwrap_or_else(|| UNTITLED_EVENT_TITLE.to_string()),
        description: non_blank(event.description),
        location: non_blank(event.location),
        start_time,
        end_time,
        is_all_day,
        recurrence: Recurrence::from_rrules(&event.recurrence),
        origin: Origin::External,
        original_id: reference,
        attendees: Some(attendees),
        created_at: None,
        updated_at: None,
    })
}

fn malformed(id: &str, reason: &str) -> DaybookError {
    DaybookError::Internal(format!("malformed provider event {id}: {reason}"))
}

/// `dateTime` wins over `date`; an all-day `date` maps to 00:00 UTC.
fn parse_provider_time(value: &ExternalEventDateTime) -> Option<DateTime<Utc>> {
    if let Some(date_time) = value.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(date_time).ok().map(|dt| dt.with_timezone(&Utc));
    }
    value
        .date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// +1 day for all-day events, +1 hour otherwise.
pub fn default_end(start: DateTime<Utc>, is_all_day: bool) -> DateTime<Utc> {
    if is_all_day {
        saturating_add_days(start, 1)
    } else {
        saturating_add(start, Duration::minutes(DEFAULT_TIMED_EVENT_MINUTES))
    }
}

/// Build a complete local event from create input.
///
/// # Errors
/// `InvalidInput` when `title` or `start_time` is missing.
pub fn new_local_from_input(input: &EventInput) -> Result<NewLocalEvent> {
    let title = non_blank(input.title.clone())
        .ok_or_else(|| DaybookError::InvalidInput("event title is required".into()))?;
    let start_time = input
        .start_time
        .ok_or_else(|| DaybookError::InvalidInput("event start time is required".into()))?;
    let is_all_day = input.is_all_day.unwrap_or(false);

    Ok(NewLocalEvent {
        title,
        description: non_blank(input.description.clone()),
        location: non_blank(input.location.clone()),
        start_time,
        end_time: input.end_time.unwrap_or_else(|| default_end(start_time, is_all_day)),
        is_all_day,
        recurrence: input.recurrence.unwrap_or_default(),
    })
}

pub fn patch_from_input(input: &EventInput) -> LocalEventPatch {
    LocalEventPatch {
        title: input.title.clone(),
        description: input.description.clone(),
        location: input.location.clone(),
        start_time: input.start_time,
        end_time: input.end_time,
        is_all_day: input.is_all_day,
        recurrence: input.recurrence,
    }
}

/// Provider body for create or patch.
///
/// Blank optional text is omitted rather than sent as an empty string.
/// Times use `date` when the input is all-day and `dateTime` otherwise.
pub fn to_payload(input: &EventInput) -> ExternalEventPayload {
    let is_all_day = input.is_all_day.unwrap_or(false);

    let start = input.start_time.map(|at| provider_time(at, is_all_day));
    let end = input.end_time.map(|at| {
        if !is_all_day {
            return ExternalEventDateTime::timed(at);
        }
        // All-day end dates are exclusive at the provider.
        let mut end_date = at.date_naive();
        if let Some(start_date) = input.start_time.map(|s| s.date_naive()) {
            if end_date <= start_date {
                end_date = start_date.succ_opt().unwrap_or(start_date);
            }
        }
        ExternalEventDateTime::all_day(end_date)
    });

    ExternalEventPayload {
        summary: non_blank(input.title.clone()),
        description: non_blank(input.description.clone()),
        location: non_blank(input.location.clone()),
        start,
        end,
        recurrence: input.recurrence.and_then(Recurrence::to_rrule).map(|rule| vec![rule]),
    }
}

/// Full provider body for an already-validated new event.
pub fn payload_for_new(event: &NewLocalEvent) -> ExternalEventPayload {
    to_payload(&EventInput {
        title: Some(event.title.clone()),
        description: event.description.clone(),
        location: event.location.clone(),
        start_time: Some(event.start_time),
        end_time: Some(event.end_time),
        is_all_day: Some(event.is_all_day),
        recurrence: Some(event.recurrence),
    })
}

fn provider_time(at: DateTime<Utc>, is_all_day: bool) -> ExternalEventDateTime {
    if is_all_day {
        ExternalEventDateTime::all_day(at.date_naive())
    } else {
        ExternalEventDateTime::timed(at)
    }
}
