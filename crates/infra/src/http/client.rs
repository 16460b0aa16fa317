use std::time::Duration;

use daybook_domain::{DaybookError, ProviderConfig};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_USER_AGENT: &str = concat!("daybook/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How transient provider failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Initial try included.
    pub max_attempts: usize,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_backoff: Duration::from_millis(200) }
    }
}

impl RetryPolicy {
    /// Doubling delay before retry `n` (1-based), capped at 256x the base.
    fn delay_before(&self, retry: usize) -> Duration {
        let exponent = u32::try_from(retry.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1 << exponent)
    }

    fn allows_another(&self, attempts_made: usize) -> bool {
        attempts_made < self.max_attempts.max(1)
    }
}

/// Shared outbound client for the OAuth, calendar and LLM endpoints.
///
/// 5xx and 429 responses, timeouts and refused connections are retried per
/// [`RetryPolicy`]. Every other response is returned untouched so callers
/// can read the provider's error body.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, DaybookError> {
        Self::builder().build()
    }

    /// Client whose per-request timeout matches the provider call bound.
    pub fn for_providers(settings: &ProviderConfig) -> Result<Self, DaybookError> {
        Self::builder().timeout(settings.timeout()).build()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying transient failures.
    ///
    /// # Errors
    /// `Network` for transport failures that outlast every retry and
    /// `Internal` when the body cannot be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, DaybookError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    DaybookError::Internal("streaming request bodies cannot be retried".into())
                })?
                .build()
                .map_err(|err| DaybookError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            // Query strings can carry tokens; log the path only.
            let path = request.url().path().to_owned();
            debug!(attempt, %method, %path, "sending provider request");

            let reason = match self.client.execute(request).await {
                Ok(response)
                    if is_transient_status(response.status())
                        && self.retry.allows_another(attempt) =>
                {
                    format!("status {}", response.status())
                }
                Ok(response) => {
                    debug!(attempt, %method, %path, status = %response.status(), "provider responded");
                    return Ok(response);
                }
                Err(err) if is_transient_error(&err) && self.retry.allows_another(attempt) => {
                    err.to_string()
                }
                Err(err) => return Err(InfraError::from(err).into()),
            };

            let delay = self.retry.delay_before(attempt);
            warn!(
                attempt,
                %method,
                %path,
                %reason,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying provider request"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts, initial try included. Zero is treated as one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, DaybookError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|err| DaybookError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, retry: self.retry })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
