//! Pool sizing and per-connection tuning

use std::time::Duration;

use rusqlite::Connection;

use crate::storage::error::{StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct SqlCipherPoolConfig {
    pub max_size: u32,
    /// Wait for a free pooled connection before giving up.
    pub connection_timeout: Duration,
    /// SQLite busy handler timeout for locked writes.
    pub busy_timeout: Duration,
    pub enable_wal: bool,
    pub enable_foreign_keys: bool,
}

impl Default for SqlCipherPoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqlCipherPoolConfig {
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    fn pragma_batch(&self) -> String {
        let mut statements = vec!["PRAGMA synchronous=NORMAL;"];
        if self.enable_wal {
            statements.insert(0, "PRAGMA journal_mode=WAL;");
        }
        if self.enable_foreign_keys {
            statements.push("PRAGMA foreign_keys=ON;");
        }
        statements.join("\n")
    }

    /// Tune a freshly keyed connection.
    ///
    /// # Errors
    /// [`StorageError::Query`] when a pragma or the busy timeout is rejected.
    pub fn apply_pragmas(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(&self.pragma_batch())
            .map_err(|err| StorageError::Query(format!("connection pragmas rejected: {err}")))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|err| StorageError::Query(format!("busy timeout rejected: {err}")))
    }
}
