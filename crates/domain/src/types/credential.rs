//! OAuth credentials for the external calendar provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_str_enum_conversions;

/// External calendar provider a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarProvider {
    #[default]
    Google,
}

impl_str_enum_conversions!(CalendarProvider {
    Google => "google",
});

/// Stored credential, one per (user, provider).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    pub user_id: i64,
    pub provider: CalendarProvider,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Expired once `now >= expires_at`. Credentials without an expiry are
    /// treated as still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("access_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Values written on a successful code exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub user_id: i64,
    pub provider: CalendarProvider,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl std::fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCredential")
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Authenticated provider session: a non-expired access token bound to a
/// user.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub user_id: i64,
    pub provider: CalendarProvider,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
