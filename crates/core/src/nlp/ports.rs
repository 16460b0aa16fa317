//! Port for turning free text into a structured event draft.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_domain::{ParsedEventDraft, Result};

/// Extracts event fields from a sentence such as "lunch with Sam tomorrow
/// at noon".
///
/// `reference` is the instant relative expressions ("tomorrow", "next
/// Friday") are resolved against.
#[async_trait]
pub trait EventTextParser: Send + Sync {
    async fn parse(&self, text: &str, reference: DateTime<Utc>) -> Result<ParsedEventDraft>;
}
