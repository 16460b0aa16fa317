//! Conversions from external infrastructure errors into domain errors.

use daybook_common::storage::StorageError;
use daybook_domain::DaybookError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DaybookError);

impl From<InfraError> for DaybookError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DaybookError> for InfraError {
    fn from(value: DaybookError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDaybookError {
    fn into_daybook(self) -> DaybookError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → DaybookError */
/* -------------------------------------------------------------------------- */

impl IntoDaybookError for SqlError {
    fn into_daybook(self) -> DaybookError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => DaybookError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        DaybookError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        DaybookError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        DaybookError::Database("foreign key constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => DaybookError::Security(
                        "SQLCipher key rejected or database not encrypted".into(),
                    ),
                    _ => DaybookError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => DaybookError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                DaybookError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                DaybookError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidQuery => DaybookError::Database("invalid SQL query".into()),
            other => DaybookError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_daybook())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → DaybookError */
/* -------------------------------------------------------------------------- */

impl IntoDaybookError for StorageError {
    fn into_daybook(self) -> DaybookError {
        match self {
            StorageError::Rusqlite(err) => err.into_daybook(),
            StorageError::WrongKeyOrNotEncrypted => {
                DaybookError::Security("database key rejected or database not encrypted".into())
            }
            StorageError::Encryption(msg) => DaybookError::Security(format!("encryption error: {msg}")),
            StorageError::InvalidConfig(msg) => DaybookError::Config(msg),
            StorageError::Timeout(secs) => {
                DaybookError::Database(format!("timed out after {secs}s waiting for a connection"))
            }
            other => DaybookError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_daybook())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DaybookError */
/* -------------------------------------------------------------------------- */

impl IntoDaybookError for HttpError {
    fn into_daybook(self) -> DaybookError {
        if self.is_timeout() {
            return DaybookError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DaybookError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => DaybookError::Auth(message),
                404 => DaybookError::NotFound(message),
                429 => DaybookError::Network(message),
                400..=499 => DaybookError::InvalidInput(message),
                _ => DaybookError::Network(message),
            };
        }

        if self.is_decode() {
            return DaybookError::Internal(format!("unexpected response body: {self}"));
        }

        DaybookError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_daybook())
    }
}

/* -------------------------------------------------------------------------- */
/* JoinError → DaybookError */
/* -------------------------------------------------------------------------- */

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(DaybookError::Internal(format!("blocking task failed: {value}")))
    }
}

/// Shorthand for `map_err` on storage calls inside repositories.
pub(crate) fn storage_error(err: StorageError) -> DaybookError {
    InfraError::from(err).into()
}

pub(crate) fn join_error(err: JoinError) -> DaybookError {
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
