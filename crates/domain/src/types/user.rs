//! User records referenced by local events and credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application user. Authentication lives outside this workspace; the row
/// exists so events and credentials have an owner to reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}
