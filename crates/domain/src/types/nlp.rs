//! Structured output of the natural-language event parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event fields extracted from free text, before local defaults are
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEventDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_all_day: bool,
    /// Frequency name as produced by the model (`"weekly"`, ...).
    #[serde(default)]
    pub recurrence: Option<String>,
}
