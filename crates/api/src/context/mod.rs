//! Application context - dependency injection container

use std::sync::Arc;

use daybook_core::{
    EventTextParser, LocalEventStore, NaturalLanguageEventService, UnifiedEventService,
    UserRepository,
};
use daybook_domain::{Config, DaybookError, LocalEvent, Result};
use daybook_infra::{
    DbManager, GoogleCalendarClient, GoogleCredentialManager, HttpClient, OpenAIClient,
    SqlCipherCredentialRepository, SqlCipherLocalEventRepository, SqlCipherUserRepository,
};

use crate::utils::logging::timed;

/// Type alias for user repository port trait object
type DynUserRepository = dyn UserRepository + Send + Sync + 'static;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub users: Arc<DynUserRepository>,
    pub local_events: Arc<LocalEventStore>,
    pub unified: Arc<UnifiedEventService>,

    // Optional integrations, present only when configured
    pub google: Option<Arc<GoogleCredentialManager>>,
    pub natural_language: Option<Arc<NaturalLanguageEventService>>,
}

impl AppContext {
    /// Build the context from loaded configuration.
    ///
    /// Opens the encrypted database, runs migrations and wires every
    /// adapter. Missing `google`/`openai` sections leave those integrations
    /// off.
    ///
    /// # Errors
    /// `Security` when no encryption key is configured, `Database` or
    /// `Config` when the database cannot be opened, `Network` when the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let users: Arc<DynUserRepository> = Arc::new(SqlCipherUserRepository::new(Arc::clone(&db)));
        let local_events = Arc::new(
            LocalEventStore::new(Arc::new(SqlCipherLocalEventRepository::new(Arc::clone(&db))))
                .with_upcoming_days(config.provider.upcoming_window_days),
        );

        let http = HttpClient::for_providers(&config.provider)?;

        let mut unified =
            UnifiedEventService::new(Arc::clone(&local_events)).with_settings(config.provider);

        let google = match &config.google {
            Some(google_config) => {
                let credentials = Arc::new(SqlCipherCredentialRepository::new(Arc::clone(&db)));
                let manager = Arc::new(GoogleCredentialManager::new(
                    google_config.clone(),
                    http.clone(),
                    credentials,
                ));
                let client = Arc::new(GoogleCalendarClient::new(Arc::clone(&manager), http.clone()));
                unified = unified.with_external(client, manager.clone());
                tracing::info!("Google Calendar integration enabled");
                Some(manager)
            }
            None => {
                tracing::info!("Google Calendar integration not configured; running local-only");
                None
            }
        };

        let natural_language = config.openai.as_ref().map(|openai_config| {
            let parser: Arc<dyn EventTextParser> =
                Arc::new(OpenAIClient::from_config(openai_config, http.clone()));
            Arc::new(NaturalLanguageEventService::new(parser, Arc::clone(&local_events)))
        });
        if natural_language.is_none() {
            tracing::info!("OpenAI not configured; natural-language event creation disabled");
        }

        Ok(Self { config, db, users, local_events, unified: Arc::new(unified), google, natural_language })
    }

    /// Load configuration from `.env`, the environment or a config file and
    /// build the context.
    pub fn from_env() -> Result<Self> {
        let config = daybook_infra::config::load()?;
        Self::new(config)
    }

    /// # Errors
    /// `Config` when the `google` section is absent.
    pub fn google(&self) -> Result<&GoogleCredentialManager> {
        self.google
            .as_deref()
            .ok_or_else(|| DaybookError::Config("Google Calendar integration is not configured".into()))
    }

    /// # Errors
    /// `Config` when the `openai` section is absent.
    pub fn natural_language(&self) -> Result<&NaturalLanguageEventService> {
        self.natural_language
            .as_deref()
            .ok_or_else(|| DaybookError::Config("natural-language parsing is not configured".into()))
    }

    /// Parse `text` with the LLM and store the result as a local event.
    pub async fn create_event_from_text(&self, user_id: i64, text: &str) -> Result<LocalEvent> {
        let service = self.natural_language()?;
        timed("nlp::create_from_text", user_id, service.create_from_text(user_id, text)).await
    }

    /// Complete the OAuth callback for `user_id`.
    pub async fn connect_google(&self, user_id: i64, code: &str) -> Result<()> {
        let manager = self.google()?;
        timed("google::exchange_code", user_id, manager.exchange_code_for_credential(user_id, code))
            .await
            .map(|_| ())
    }

    pub async fn disconnect_google(&self, user_id: i64) -> Result<()> {
        let manager = self.google()?;
        timed("google::disconnect", user_id, manager.disconnect(user_id)).await
    }

    /// Verify the database is reachable and the key is correct.
    pub fn health_check(&self) -> Result<()> {
        self.db.health_check()
    }
}
