//! Calendar-day windows used by the derived queries.
//!
//! Days are UTC days. "Today" is `[00:00, next 00:00)`; "upcoming" starts
//! at the next midnight and spans the requested number of days, so an
//! event is never counted as both. These windows drive the statistics; the
//! upcoming list queries start at the current instant instead.

use chrono::{DateTime, Duration, TimeDelta, Utc};

/// `at + delta`, clamped to the representable range instead of panicking.
pub fn saturating_add(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// `at + days` for caller-supplied day counts; negative counts are zero.
pub fn saturating_add_days(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    match TimeDelta::try_days(days.max(0)) {
        Some(delta) => saturating_add(at, delta),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Midnight (UTC) of the day containing `at`.
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_hms_opt(0, 0, 0).map_or(at, |midnight| midnight.and_utc())
}

/// `[today 00:00, tomorrow 00:00)`
pub fn today_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(now);
    (start, saturating_add_days(start, 1))
}

/// `[tomorrow 00:00, tomorrow 00:00 + days)`
pub fn upcoming_window(now: DateTime<Utc>, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let (_, tomorrow) = today_window(now);
    (tomorrow, saturating_add_days(tomorrow, days))
}

/// Where an event start falls relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    Today,
    Upcoming,
    Other,
}

pub fn bucket_for(start: DateTime<Utc>, now: DateTime<Utc>, upcoming_days: i64) -> DayBucket {
    let (today_start, today_end) = today_window(now);
    let (upcoming_start, upcoming_end) = upcoming_window(now, upcoming_days);

    if start >= today_start && start < today_end {
        DayBucket::Today
    } else if start >= upcoming_start && start < upcoming_end {
        DayBucket::Upcoming
    } else {
        DayBucket::Other
    }
}
