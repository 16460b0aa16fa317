//! SQLCipher-backed implementation of the `CredentialRepository` port.
//!
//! One row per (user, provider), enforced by a UNIQUE constraint. Tokens are
//! protected by the database encryption.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_core::CredentialRepository;
use daybook_domain::{CalendarProvider, Credential, DaybookError, NewCredential, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{from_unix, parse_text, DbManager};
use crate::errors::conversions::join_error;
use crate::errors::InfraError;

const SELECT_CREDENTIAL: &str = "SELECT id, user_id, provider, access_token, refresh_token,
        expires_at, scope, created_at, updated_at
 FROM provider_credentials";

pub struct SqlCipherCredentialRepository {
    db: Arc<DbManager>,
}

impl SqlCipherCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialRepository for SqlCipherCredentialRepository {
    async fn get(&self, user_id: i64, provider: CalendarProvider) -> Result<Option<Credential>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<Credential>> {
            let conn = db.get_connection()?;
            fetch_credential(&conn, user_id, provider)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self, credential), fields(user_id = credential.user_id))]
    async fn upsert(&self, credential: NewCredential) -> Result<Credential> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Credential> {
            let conn = db.get_connection()?;
            let now = Utc::now().timestamp();

            conn.execute(
                "INSERT INTO provider_credentials (
                    user_id, provider, access_token, refresh_token, expires_at, scope,
                    created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(user_id, provider) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = COALESCE(excluded.refresh_token, provider_credentials.refresh_token),
                    expires_at = excluded.expires_at,
                    scope = COALESCE(excluded.scope, provider_credentials.scope),
                    updated_at = excluded.updated_at",
                params![
                    credential.user_id,
                    credential.provider.as_str(),
                    credential.access_token,
                    credential.refresh_token,
                    credential.expires_at.map(|at| at.timestamp()),
                    credential.scope,
                    now,
                ],
            )
            .map_err(InfraError::from)?;

            debug!("provider credential stored");
            fetch_credential(&conn, credential.user_id, credential.provider)?.ok_or_else(|| {
                DaybookError::Internal("credential vanished after upsert".into())
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn update_tokens(
        &self,
        user_id: i64,
        provider: CalendarProvider,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Credential> {
        let db = Arc::clone(&self.db);
        let access_token = access_token.to_string();
        let refresh_token = refresh_token.map(str::to_string);

        task::spawn_blocking(move || -> Result<Credential> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE provider_credentials
                     SET access_token = ?1,
                         refresh_token = COALESCE(?2, refresh_token),
                         expires_at = ?3,
                         updated_at = ?4
                     WHERE user_id = ?5 AND provider = ?6",
                    params![
                        access_token,
                        refresh_token,
                        expires_at.map(|at| at.timestamp()),
                        Utc::now().timestamp(),
                        user_id,
                        provider.as_str(),
                    ],
                )
                .map_err(InfraError::from)?;

            if updated == 0 {
                return Err(DaybookError::NotFound(format!("{provider} credential for user {user_id}")));
            }
            fetch_credential(&conn, user_id, provider)?.ok_or_else(|| {
                DaybookError::NotFound(format!("{provider} credential for user {user_id}"))
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn delete(&self, user_id: i64, provider: CalendarProvider) -> Result<usize> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute(
                    "DELETE FROM provider_credentials WHERE user_id = ?1 AND provider = ?2",
                    params![user_id, provider.as_str()],
                )
                .map_err(InfraError::from)?;
            Ok(removed)
        })
        .await
        .map_err(join_error)?
    }
}

fn fetch_credential(
    conn: &Connection,
    user_id: i64,
    provider: CalendarProvider,
) -> Result<Option<Credential>> {
    let credential = conn
        .query_row(
            &format!("{SELECT_CREDENTIAL} WHERE user_id = ?1 AND provider = ?2"),
            params![user_id, provider.as_str()],
            map_credential_row,
        )
        .optional()
        .map_err(InfraError::from)?;
    Ok(credential)
}

fn map_credential_row(row: &Row<'_>) -> rusqlite::Result<Credential> {
    let provider: String = row.get(2)?;
    let expires_at: Option<i64> = row.get(5)?;
    Ok(Credential {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: parse_text(2, &provider)?,
        access_token: row.get(3)?,
        refresh_token: row.get(4)?,
        expires_at: expires_at.map(|secs| from_unix(5, secs)).transpose()?,
        scope: row.get(6)?,
        created_at: from_unix(7, row.get(7)?)?,
        updated_at: from_unix(8, row.get(8)?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use daybook_core::UserRepository;

    use super::*;
    use crate::database::manager::test_support::setup_test_db;
    use crate::database::user_repository::SqlCipherUserRepository;

    async fn setup() -> (SqlCipherCredentialRepository, i64, tempfile::TempDir) {
        let (db, temp_dir) = setup_test_db();
        let user = SqlCipherUserRepository::new(Arc::clone(&db))
            .create("owner@example.com", None)
            .await
            .unwrap();
        (SqlCipherCredentialRepository::new(db), user.id, temp_dir)
    }

    fn new_credential(user_id: i64, access: &str, refresh: Option<&str>) -> NewCredential {
        NewCredential {
            user_id,
            provider: CalendarProvider::Google,
            access_token: access.into(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
            scope: Some("https://www.googleapis.com/auth/calendar".into()),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_keeps_one_row_and_preserves_refresh_token() {
        let (repo, user_id, _dir) = setup().await;

        let first = repo.upsert(new_credential(user_id, "access-1", Some("refresh-1"))).await.unwrap();
        let second = repo.upsert(new_credential(user_id, "access-2", None)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.access_token, "access-2");
        assert_eq!(second.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_tokens_replaces_pair_in_place() {
        let (repo, user_id, _dir) = setup().await;
        repo.upsert(new_credential(user_id, "old", Some("refresh-old"))).await.unwrap();
        let expires = Utc.with_ymd_and_hms(2031, 6, 1, 12, 0, 0).unwrap();

        let refreshed = repo
            .update_tokens(user_id, CalendarProvider::Google, "new", None, Some(expires))
            .await
            .unwrap();

        assert_eq!(refreshed.access_token, "new");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-old"));
        assert_eq!(refreshed.expires_at, Some(expires));

        let rotated = repo
            .update_tokens(user_id, CalendarProvider::Google, "newer", Some("refresh-new"), None)
            .await
            .unwrap();
        assert_eq!(rotated.refresh_token.as_deref(), Some("refresh-new"));
        assert_eq!(rotated.expires_at, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_tokens_without_row_is_not_found() {
        let (repo, user_id, _dir) = setup().await;
        let err = repo
            .update_tokens(user_id, CalendarProvider::Google, "x", None, Some(Utc::now() + Duration::hours(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DaybookError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_removes_the_credential() {
        let (repo, user_id, _dir) = setup().await;
        repo.upsert(new_credential(user_id, "a", Some("r"))).await.unwrap();

        assert_eq!(repo.delete(user_id, CalendarProvider::Google).await.unwrap(), 1);
        assert_eq!(repo.get(user_id, CalendarProvider::Google).await.unwrap(), None);
        assert_eq!(repo.delete(user_id, CalendarProvider::Google).await.unwrap(), 0);
    }
}
