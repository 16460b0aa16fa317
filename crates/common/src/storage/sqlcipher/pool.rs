//! SQLCipher connection pool
//!
//! r2d2 pool whose connections are keyed and configured on creation.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::cipher::{configure_sqlcipher, verify_encryption, SqlCipherConfig};
use super::config::SqlCipherPoolConfig;
use super::connection::SqlCipherConnection;
use crate::storage::error::{looks_like_wrong_key, StorageError, StorageResult};

/// Pool of encrypted SQLite connections.
#[derive(Debug)]
pub struct SqlCipherPool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlCipherPoolConfig,
}

impl SqlCipherPool {
    /// Open (or create) the database at `path` and build the pool.
    ///
    /// A connection is checked out immediately so a wrong key surfaces here.
    ///
    /// # Errors
    /// Returns [`StorageError::WrongKeyOrNotEncrypted`] if the key does not
    /// match an existing file, [`StorageError::Connection`] for any other
    /// pool failure.
    #[instrument(skip(encryption_key), fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(
        path: &Path,
        encryption_key: String,
        config: SqlCipherPoolConfig,
    ) -> StorageResult<Self> {
        let cipher_config = SqlCipherConfig::new(encryption_key);
        let pragma_config = config.clone();

        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            configure_sqlcipher(conn, &cipher_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            pragma_config.apply_pragmas(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| classify_pool_error("Failed to create pool", &e))?;

        {
            let conn = pool.get().map_err(|e| classify_pool_error("Failed to get test connection", &e))?;
            verify_encryption(&conn)?;
            debug!("Encryption verified");
        }

        info!(max_connections = config.max_size, "SQLCipher pool created");

        Ok(Self { pool, config })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns [`StorageError::Timeout`] when no connection frees up within
    /// the configured timeout.
    pub fn get_sqlcipher_connection(&self) -> StorageResult<SqlCipherConnection> {
        self.pool.get().map(SqlCipherConnection::new).map_err(|e| {
            if e.to_string().to_lowercase().contains("timed out") {
                warn!(timeout = ?self.config.connection_timeout, "Connection timeout");
                StorageError::Timeout(self.config.connection_timeout.as_secs())
            } else {
                warn!(error = %e, "Connection error");
                StorageError::Connection(format!("Failed to get connection: {e}"))
            }
        })
    }

    pub fn max_size(&self) -> u32 {
        self.config.max_size
    }

    /// Current (open, idle) connection counts.
    pub fn state(&self) -> (u32, u32) {
        let state = self.pool.state();
        (state.connections, state.idle_connections)
    }
}

fn classify_pool_error(context: &str, err: &r2d2::Error) -> StorageError {
    warn!(error = %err, "{context}");
    if looks_like_wrong_key(&err.to_string()) {
        StorageError::WrongKeyOrNotEncrypted
    } else {
        StorageError::Connection(format!("{context}: {err}"))
    }
}
