//! SQLCipher connection wrapper

use std::ops::{Deref, DerefMut};

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Params, Row};

use crate::storage::error::{StorageError, StorageResult};

/// Pooled, already-keyed connection. Returned to the pool on drop.
///
/// Derefs to [`rusqlite::Connection`] for statements and transactions.
pub struct SqlCipherConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqlCipherConnection {
    pub fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    /// Run a single-row query, mapping "no rows" to `None`.
    pub fn query_optional<T, P, F>(&self, sql: &str, params: P, f: F) -> StorageResult<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.inner.query_row(sql, params, f).optional().map_err(StorageError::from)
    }

    /// Run a query and collect every mapped row.
    pub fn query_all<T, P, F>(&self, sql: &str, params: P, f: F) -> StorageResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.inner.prepare(sql)?;
        let rows = stmt.query_map(params, f)?.collect::<Result<Vec<_>, _>>();
        rows.map_err(StorageError::from)
    }
}

impl Deref for SqlCipherConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SqlCipherConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
