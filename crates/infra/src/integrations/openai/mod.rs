/// OpenAI integration for natural-language event creation
///
/// Provides [`OpenAIClient`], which turns a sentence such as "dentist next
/// Tuesday at 3pm" into a `ParsedEventDraft` and implements the core
/// `EventTextParser` port.
///
/// # Usage
///
/// ```no_run
/// use chrono::Utc;
/// use daybook_infra::http::HttpClient;
/// use daybook_infra::integrations::openai::OpenAIClient;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let http_client = HttpClient::new()?;
/// let api_key = std::env::var("OPENAI_API_KEY")?;
/// let client = OpenAIClient::new(api_key, http_client);
///
/// let draft = client.parse_event_text("gym tomorrow 7am", Utc::now()).await?;
/// println!("{} at {}", draft.title, draft.start_time);
/// # Ok(())
/// # }
/// ```
///
/// # API Integration
///
/// Uses OpenAI's Chat Completions API with:
/// - Model: `gpt-4o-mini` (configurable via `with_model()`)
/// - Temperature: 0.0
/// - Response format: strict JSON schema
///
/// # Error Handling
///
/// - **Network errors / 5xx**: Retried by `HttpClient`, then `Network`
/// - **Rate limits (429)**: `Network`
/// - **Authentication (401/403)**: `Auth`
/// - **Schema mismatch**: `Internal`
pub mod client;
pub mod types;

pub use client::OpenAIClient;
pub use types::OpenAIError;
