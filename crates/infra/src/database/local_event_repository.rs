//! SQLCipher-backed implementation of the `LocalEventRepository` port.
//!
//! Every statement filters on both `id` and `user_id`. Event times are
//! stored as unix milliseconds so sub-second starts survive a round trip.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use daybook_core::LocalEventRepository;
use daybook_domain::{
    DaybookError, LocalEvent, LocalEventFilters, LocalEventPatch, NewLocalEvent, Recurrence, Result,
};
use rusqlite::{params, Connection, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{from_unix, from_unix_millis, parse_text, DbManager};
use crate::errors::conversions::{join_error, storage_error};
use crate::errors::InfraError;

const SELECT_EVENT: &str = "SELECT id, user_id, title, description, location, start_ms, end_ms,
        is_all_day, recurrence, created_at, updated_at
 FROM local_events";

pub struct SqlCipherLocalEventRepository {
    db: Arc<DbManager>,
}

impl SqlCipherLocalEventRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocalEventRepository for SqlCipherLocalEventRepository {
    #[instrument(skip(self, filters))]
    async fn list(&self, user_id: i64, filters: LocalEventFilters) -> Result<Vec<LocalEvent>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<LocalEvent>> {
            let conn = db.get_connection()?;
            let start = filters.start_date.map(|d| d.timestamp_millis());
            let end = filters.end_date.map(|d| d.timestamp_millis());
            // SQLite treats a negative LIMIT as "no limit".
            let limit = filters.limit.map_or(-1, i64::from);
            let offset = filters.offset.map_or(0, i64::from);

            let events = conn
                .query_all(
                    &format!(
                        "{SELECT_EVENT}
                         WHERE user_id = ?1
                           AND (?2 IS NULL OR start_ms >= ?2)
                           AND (?3 IS NULL OR end_ms <= ?3)
                         ORDER BY start_ms ASC, id ASC
                         LIMIT ?4 OFFSET ?5"
                    ),
                    params![user_id, start, end, limit, offset],
                    map_event_row,
                )
                .map_err(storage_error)?;

            debug!(count = events.len(), "listed local events");
            Ok(events)
        })
        .await
        .map_err(join_error)?
    }

    async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<LocalEvent>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<LocalEvent>> {
            let conn = db.get_connection()?;
            fetch_event(&conn, id, user_id)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self, event))]
    async fn create(&self, user_id: i64, event: NewLocalEvent) -> Result<LocalEvent> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<LocalEvent> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(InfraError::from)?;

            let owner_exists = tx
                .query_row("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", params![user_id], |row| {
                    row.get::<_, bool>(0)
                })
                .map_err(InfraError::from)?;
            if !owner_exists {
                return Err(DaybookError::UserNotFound(user_id));
            }

            let now = Utc::now().timestamp();
            tx.execute(
                "INSERT INTO local_events (
                    user_id, title, description, location, start_ms, end_ms,
                    is_all_day, recurrence, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    user_id,
                    event.title,
                    event.description,
                    event.location,
                    event.start_time.timestamp_millis(),
                    event.end_time.timestamp_millis(),
                    event.is_all_day,
                    event.recurrence.as_str(),
                    now,
                ],
            )
            .map_err(InfraError::from)?;
            let id = tx.last_insert_rowid();

            let created = fetch_event(&tx, id, user_id)?
                .ok_or_else(|| DaybookError::Internal(format!("local event {id} vanished after insert")))?;
            tx.commit().map_err(InfraError::from)?;
            Ok(created)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: i64, user_id: i64, patch: LocalEventPatch) -> Result<Option<LocalEvent>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<LocalEvent>> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(InfraError::from)?;

            let Some(mut event) = fetch_event(&tx, id, user_id)? else {
                return Ok(None);
            };
            apply_patch(&mut event, patch);

            tx.execute(
                "UPDATE local_events
                 SET title = ?1, description = ?2, location = ?3, start_ms = ?4,
                     end_ms = ?5, is_all_day = ?6, recurrence = ?7, updated_at = ?8
                 WHERE id = ?9 AND user_id = ?10",
                params![
                    event.title,
                    event.description,
                    event.location,
                    event.start_time.timestamp_millis(),
                    event.end_time.timestamp_millis(),
                    event.is_all_day,
                    event.recurrence.as_str(),
                    Utc::now().timestamp(),
                    id,
                    user_id,
                ],
            )
            .map_err(InfraError::from)?;

            let updated = fetch_event(&tx, id, user_id)?;
            tx.commit().map_err(InfraError::from)?;
            Ok(updated)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64, user_id: i64) -> Result<Option<LocalEvent>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<LocalEvent>> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(InfraError::from)?;

            let existing = fetch_event(&tx, id, user_id)?;
            if existing.is_some() {
                tx.execute("DELETE FROM local_events WHERE id = ?1 AND user_id = ?2", params![id, user_id])
                    .map_err(InfraError::from)?;
            }
            tx.commit().map_err(InfraError::from)?;
            Ok(existing)
        })
        .await
        .map_err(join_error)?
    }

    async fn count(&self, user_id: i64) -> Result<u64> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM local_events WHERE user_id = ?1", params![user_id], |row| {
                    row.get(0)
                })
                .map_err(InfraError::from)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
        .map_err(join_error)?
    }
}

fn fetch_event(conn: &Connection, id: i64, user_id: i64) -> Result<Option<LocalEvent>> {
    use rusqlite::OptionalExtension;

    conn.query_row(
        &format!("{SELECT_EVENT} WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        map_event_row,
    )
    .optional()
    .map_err(|err| InfraError::from(err).into())
}

/// Blank description or location clears the column.
fn apply_patch(event: &mut LocalEvent, patch: LocalEventPatch) {
    if let Some(title) = patch.title {
        event.title = title;
    }
    if let Some(description) = patch.description {
        event.description = Some(description).filter(|d| !d.is_empty());
    }
    if let Some(location) = patch.location {
        event.location = Some(location).filter(|l| !l.is_empty());
    }
    if let Some(start_time) = patch.start_time {
        event.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        event.end_time = end_time;
    }
    if let Some(is_all_day) = patch.is_all_day {
        event.is_all_day = is_all_day;
    }
    if let Some(recurrence) = patch.recurrence {
        event.recurrence = recurrence;
    }
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<LocalEvent> {
    let recurrence: String = row.get(8)?;
    Ok(LocalEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        start_time: from_unix_millis(5, row.get(5)?)?,
        end_time: from_unix_millis(6, row.get(6)?)?,
        is_all_day: row.get(7)?,
        recurrence: parse_text::<Recurrence>(8, &recurrence)?,
        created_at: from_unix(9, row.get(9)?)?,
        updated_at: from_unix(10, row.get(10)?)?,
    })
}
