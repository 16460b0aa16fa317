//! Google Calendar integration
//!
//! - [`GoogleCredentialManager`]: OAuth2 code exchange, token refresh and
//!   session probing, backed by the credential repository
//! - [`GoogleCalendarClient`]: event CRUD and calendar listing, implementing
//!   the core `ExternalCalendarProvider` port

pub mod client;
pub mod oauth;
mod types;

pub use client::GoogleCalendarClient;
pub use oauth::{GoogleCredentialManager, GOOGLE_CALENDAR_SCOPE};
