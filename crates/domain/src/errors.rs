//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Daybook
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DaybookError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Local event creation referenced a user that does not exist.
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// A namespaced event id did not match `local_<int>` or `external_<id>`.
    #[error("Invalid event id: {0}")]
    InvalidEventId(String),

    /// The provider's token response carried no access token.
    #[error("Provider token response did not include an access token")]
    MissingAccessToken,

    /// The provider rejected a request; carries the provider's own message.
    #[error("ProviderApiError: {0}")]
    ProviderApiError(String),

    /// No authenticated provider session could be established.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl DaybookError {
    /// Whether the caller caused this failure (bad id, missing row, bad
    /// payload) as opposed to a backend or provider fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::UserNotFound(_) | Self::InvalidEventId(_) | Self::InvalidInput(_)
        )
    }

    /// Whether the failure originated on the external provider side.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::MissingAccessToken | Self::ProviderApiError(_) | Self::ProviderUnavailable(_)
        )
    }
}

/// Result type alias for Daybook operations
pub type Result<T> = std::result::Result<T, DaybookError>;
