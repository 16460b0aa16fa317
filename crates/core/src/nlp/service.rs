//! Natural-language event service
//!
//! Runs free text through an [`EventTextParser`], fills in the local
//! defaults the parser may leave out, and optionally persists the result
//! through the [`LocalEventStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_domain::{
    DaybookError, LocalEvent, NewLocalEvent, ParsedEventDraft, Recurrence, Result,
};
use tracing::{debug, info, instrument};

use super::ports::EventTextParser;
use crate::events::store::non_blank;
use crate::events::LocalEventStore;
use crate::unified::format::default_end;

pub struct NaturalLanguageEventService {
    parser: Arc<dyn EventTextParser>,
    store: Arc<LocalEventStore>,
}

impl NaturalLanguageEventService {
    pub fn new(parser: Arc<dyn EventTextParser>, store: Arc<LocalEventStore>) -> Self {
        Self { parser, store }
    }

    /// Parse without persisting.
    ///
    /// # Errors
    /// `InvalidInput` for blank text or a draft without a title; parser
    /// errors propagate unchanged.
    pub async fn parse_event(&self, text: &str) -> Result<NewLocalEvent> {
        self.parse_event_at(text, Utc::now()).await
    }

    pub async fn parse_event_at(&self, text: &str, reference: DateTime<Utc>) -> Result<NewLocalEvent> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DaybookError::InvalidInput("event text must not be empty".into()));
        }

        let draft = self.parser.parse(text, reference).await?;
        debug!(title = %draft.title, all_day = draft.is_all_day, "event text parsed");
        into_new_event(draft)
    }

    /// Parse and store as a local event owned by `user_id`.
    #[instrument(skip(self, text))]
    pub async fn create_from_text(&self, user_id: i64, text: &str) -> Result<LocalEvent> {
        let event = self.parse_event(text).await?;
        let created = self.store.create(user_id, event).await?;
        info!(event_id = created.id, "event created from text");
        Ok(created)
    }
}

fn into_new_event(draft: ParsedEventDraft) -> Result<NewLocalEvent> {
    let title = non_blank(Some(draft.title))
        .ok_or_else(|| DaybookError::InvalidInput("could not find an event title in the text".into()))?;

    let end_time = draft
        .end_time
        .filter(|end| *end >= draft.start_time)
        .unwrap_or_else(|| default_end(draft.start_time, draft.is_all_day));

    Ok(NewLocalEvent {
        title,
        description: non_blank(draft.description),
        location: non_blank(draft.location),
        start_time: draft.start_time,
        end_time,
        is_all_day: draft.is_all_day,
        recurrence: draft.recurrence.as_deref().map(Recurrence::parse_lenient).unwrap_or_default(),
    })
}
