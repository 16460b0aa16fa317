//! Application constants
//!
//! Centralized location for domain-level constants shared by the services
//! and adapters.

// Namespaced event ids
pub const LOCAL_ID_PREFIX: &str = "local_";
pub const EXTERNAL_ID_PREFIX: &str = "external_";

// External provider defaults
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_MAX_RESULTS: u32 = 50;
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

// Derived query windows
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;
pub const DEFAULT_TIMED_EVENT_MINUTES: i64 = 60;

/// Title used for provider events that come back without a summary.
pub const UNTITLED_EVENT_TITLE: &str = "(No title)";
