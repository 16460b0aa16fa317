//! Shared helpers for callers of the application context

pub mod logging;

pub use logging::{error_label, init_tracing, log_operation, timed};
