//! # Daybook Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, the external calendar
//!   provider, provider credentials and the event text parser
//! - The local event store service and its derived queries
//! - The unified event service that merges and routes across origins
//! - Natural-language event creation
//!
//! ## Architecture Principles
//! - Only depends on `daybook-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod calendar_ports;
pub mod events;
pub mod nlp;
pub mod unified;
pub mod user;
pub mod utils;

pub use calendar_ports::{CredentialRepository, ExternalCalendarProvider, ProviderCredentials};
pub use events::ports::LocalEventRepository;
pub use events::LocalEventStore;
pub use nlp::ports::EventTextParser;
pub use nlp::NaturalLanguageEventService;
pub use unified::UnifiedEventService;
pub use user::ports::UserRepository;
