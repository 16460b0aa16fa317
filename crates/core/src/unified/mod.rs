//! Unified view over local and external events.

pub mod format;
pub mod service;

pub use service::{ExternalIntegration, UnifiedEventService};
