use std::future::Future;
use std::time::{Duration, Instant};

use daybook_domain::config::LoggingConfig;
use daybook_domain::{DaybookError, Result};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `config.level`. Output is JSON lines when
/// `config.json` is set, human-readable otherwise.
///
/// # Errors
/// `Config` when the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| {
            DaybookError::Config(format!("invalid log level '{}': {err}", config.level))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|err| DaybookError::Config(format!("tracing already initialised: {err}")))
}

/// Log the outcome of one user-facing operation with structured fields.
///
/// `operation` should be a stable identifier such as
/// `"unified::save_event"`; it must not carry user data.
#[inline]
pub fn log_operation<T>(operation: &str, user_id: i64, elapsed: Duration, result: &Result<T>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(_) => info!(operation, user_id, duration_ms, "operation_success"),
        Err(err) => warn!(
            operation,
            user_id,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "operation_failure"
        ),
    }
}

/// Run `future`, then log its outcome and duration via [`log_operation`].
pub async fn timed<T, F>(operation: &str, user_id: i64, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = future.await;
    log_operation(operation, user_id, started.elapsed(), &result);
    result
}

/// Convert a `DaybookError` into a stable label suitable for metrics/logging.
#[inline]
pub fn error_label(error: &DaybookError) -> &'static str {
    match error {
        DaybookError::Database(_) => "database",
        DaybookError::Config(_) => "config",
        DaybookError::Network(_) => "network",
        DaybookError::Auth(_) => "auth",
        DaybookError::Security(_) => "security",
        DaybookError::NotFound(_) => "not_found",
        DaybookError::InvalidInput(_) => "invalid_input",
        DaybookError::Internal(_) => "internal",
        DaybookError::UserNotFound(_) => "user_not_found",
        DaybookError::InvalidEventId(_) => "invalid_event_id",
        DaybookError::MissingAccessToken => "missing_access_token",
        DaybookError::ProviderApiError(_) => "provider_api_error",
        DaybookError::ProviderUnavailable(_) => "provider_unavailable",
    }
}
