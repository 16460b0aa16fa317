//! Application configuration structures
//!
//! Populated by the infra config loader from the environment or a JSON/TOML
//! file. Optional sections (`google`, `openai`) switch the corresponding
//! integration off when absent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_RESULTS, DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_UPCOMING_DAYS};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Encrypted SQLite database settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default)]
    pub encryption_key: Option<String>,
}

fn default_pool_size() -> u32 {
    4
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "daybook.db".to_string(), pool_size: default_pool_size(), encryption_key: None }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("path", &self.path)
            .field("pool_size", &self.pool_size)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Google OAuth client and API endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Fixed callback endpoint registered with the OAuth client.
    pub redirect_uri: String,
    #[serde(default = "default_google_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_api_base")]
    pub api_base_url: String,
}

fn default_google_auth_url() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_google_token_url() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

fn default_google_api_base() -> String {
    GOOGLE_CALENDAR_API_BASE.to_string()
}

impl GoogleConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: default_google_auth_url(),
            token_url: default_google_token_url(),
            api_base_url: default_google_api_base(),
        }
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// LLM settings for the natural-language event parser
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_url")]
    pub api_url: String,
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_openai_url() -> String {
    OPENAI_CHAT_COMPLETIONS_URL.to_string()
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Behaviour of the unified layer towards the external provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Upper bound for any single provider call.
    pub timeout_secs: u64,
    pub max_results: u32,
    pub upcoming_window_days: i64,
    /// Fail external-preferred creates instead of falling back to local.
    pub strict_external_create: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            max_results: DEFAULT_MAX_RESULTS,
            upcoming_window_days: DEFAULT_UPCOMING_DAYS,
            strict_external_create: false,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
