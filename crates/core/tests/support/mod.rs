//! Shared test helpers for `daybook-core` integration tests.
//!
//! Lightweight in-memory mocks for the storage and provider ports so the
//! service tests can focus on behaviour instead of boilerplate.
#![allow(dead_code)]

pub mod provider;
pub mod repositories;

use chrono::{DateTime, TimeZone, Utc};

/// Fixed instant used as "now" by the statistics tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}
