//! Domain types and models

pub mod credential;
pub mod event;
pub mod event_ref;
pub mod external;
pub mod local_event;
pub mod nlp;
pub mod unified;
pub mod user;

pub use credential::{CalendarProvider, Credential, NewCredential, ProviderSession};
pub use event::{Attendee, Origin, Recurrence, UnifiedEvent};
pub use event_ref::EventRef;
pub use external::{
    ExternalAttendee, ExternalCalendar, ExternalCalendarEvent, ExternalEventDateTime,
    ExternalEventPayload, ListEventsOptions,
};
pub use local_event::{
    LocalEvent, LocalEventFilters, LocalEventPatch, LocalEventStatistics, NewLocalEvent,
};
pub use nlp::ParsedEventDraft;
pub use unified::{EventInput, EventStatistics, IntegrationStatus, SaveOptions, UnifiedEventFilters};
pub use user::User;
