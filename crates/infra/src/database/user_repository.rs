//! SQLCipher-backed implementation of the `UserRepository` port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use daybook_core::UserRepository;
use daybook_domain::{DaybookError, Result, User};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{from_unix, DbManager};
use crate::errors::conversions::{join_error, storage_error};
use crate::errors::InfraError;

const SELECT_USER: &str = "SELECT id, email, name, created_at FROM users";

pub struct SqlCipherUserRepository {
    db: Arc<DbManager>,
}

impl SqlCipherUserRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqlCipherUserRepository {
    async fn create(&self, email: &str, name: Option<&str>) -> Result<User> {
        let db = Arc::clone(&self.db);
        let email = email.trim().to_string();
        let name = name.map(str::to_string);

        if email.is_empty() {
            return Err(DaybookError::InvalidInput("user email is required".into()));
        }

        task::spawn_blocking(move || -> Result<User> {
            let conn = db.get_connection()?;
            let created_at = Utc::now().timestamp();
            conn.execute(
                "INSERT INTO users (email, name, created_at) VALUES (?1, ?2, ?3)",
                params![email, name, created_at],
            )
            .map_err(InfraError::from)?;
            let id = conn.last_insert_rowid();

            conn.query_optional(&format!("{SELECT_USER} WHERE id = ?1"), params![id], map_user_row)
                .map_err(storage_error)?
                .ok_or_else(|| DaybookError::Internal(format!("user {id} vanished after insert")))
        })
        .await
        .map_err(join_error)?
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<User>> {
            let conn = db.get_connection()?;
            conn.query_optional(&format!("{SELECT_USER} WHERE id = ?1"), params![id], map_user_row)
                .map_err(storage_error)
        })
        .await
        .map_err(join_error)?
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = Arc::clone(&self.db);
        let email = email.trim().to_string();

        task::spawn_blocking(move || -> Result<Option<User>> {
            let conn = db.get_connection()?;
            conn.query_optional(
                &format!("{SELECT_USER} WHERE email = ?1 COLLATE NOCASE"),
                params![email],
                map_user_row,
            )
            .map_err(storage_error)
        })
        .await
        .map_err(join_error)?
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let found = conn
                .query_optional("SELECT 1 FROM users WHERE id = ?1", params![id], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(storage_error)?;
            Ok(found.is_some())
        })
        .await
        .map_err(join_error)?
    }
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: from_unix(3, row.get(3)?)?,
    })
}
