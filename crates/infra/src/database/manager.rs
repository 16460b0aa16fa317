//! Database connection manager backed by the shared SQLCipher pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_common::storage::{SqlCipherConnection, SqlCipherPool, SqlCipherPoolConfig};
use daybook_domain::{DaybookError, DatabaseConfig, Result};
use rusqlite::params;
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlCipherPool`].
pub struct DbManager {
    pool: Arc<SqlCipherPool>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size and SQLCipher key.
    ///
    /// # Errors
    /// `Security` when no key is given or the key does not open an
    /// existing file.
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        pool_size: u32,
        encryption_key: Option<&str>,
    ) -> Result<Self> {
        let key = encryption_key.map(str::to_owned).ok_or_else(|| {
            DaybookError::Security("database encryption key not provided".into())
        })?;

        let path = db_path.as_ref().to_path_buf();
        let config = SqlCipherPoolConfig::default().with_max_size(pool_size.max(1));
        let pool = SqlCipherPool::new(&path, key, config).map_err(InfraError::from)?;

        info!(db_path = %path.display(), max_connections = pool.max_size(), "sqlcipher pool initialised");

        Ok(Self { pool: Arc::new(pool), path })
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.pool_size, config.encryption_key.as_deref())
    }

    pub fn get_connection(&self) -> Result<SqlCipherConnection> {
        Ok(self.pool.get_sqlcipher_connection().map_err(InfraError::from)?)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(InfraError::from)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, Utc::now().timestamp()],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire a connection and run a trivial query.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0)).map_err(InfraError::from)?;
        Ok(())
    }
}

/// Stored unix seconds back to a timestamp.
pub(crate) fn from_unix(column: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {secs}").into(),
        )
    })
}

/// Stored unix milliseconds back to a timestamp.
pub(crate) fn from_unix_millis(column: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {millis}ms").into(),
        )
    })
}

/// Parse a TEXT column through `FromStr`.
pub(crate) fn parse_text<T>(column: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse().map_err(|err: String| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, err.into())
    })
}
