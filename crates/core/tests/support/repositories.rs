//! In-memory local event repository.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use daybook_core::LocalEventRepository;
use daybook_domain::{
    DaybookError, LocalEvent, LocalEventFilters, LocalEventPatch, NewLocalEvent,
    Result as DomainResult,
};

/// Mock for `LocalEventRepository`.
///
/// Applies the same filter semantics as the SQL repository: `start_date`
/// bounds `start_time` from below, `end_date` bounds `end_time` from above.
/// Only users registered through [`Self::with_user`] may own events.
#[derive(Default, Clone)]
pub struct MockLocalEventRepository {
    rows: Arc<Mutex<Vec<LocalEvent>>>,
    users: Arc<Mutex<Vec<i64>>>,
    next_id: Arc<Mutex<i64>>,
    fail_reads: Arc<Mutex<bool>>,
}

impl MockLocalEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user_id: i64) -> Self {
        self.users.lock().unwrap().push(user_id);
        self
    }

    /// Make every `list` call fail with a database error.
    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    pub fn rows(&self) -> Vec<LocalEvent> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalEventRepository for MockLocalEventRepository {
    async fn list(&self, user_id: i64, filters: LocalEventFilters) -> DomainResult<Vec<LocalEvent>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(DaybookError::Database("disk I/O error".into()));
        }

        let mut rows: Vec<LocalEvent> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| filters.start_date.map_or(true, |start| e.start_time >= start))
            .filter(|e| filters.end_date.map_or(true, |end| e.end_time <= end))
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.start_time);

        let offset = filters.offset.unwrap_or(0) as usize;
        let limit = filters.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_by_id(&self, id: i64, user_id: i64) -> DomainResult<Option<LocalEvent>> {
        Ok(self.rows.lock().unwrap().iter().find(|e| e.id == id && e.user_id == user_id).cloned())
    }

    async fn create(&self, user_id: i64, event: NewLocalEvent) -> DomainResult<LocalEvent> {
        if !self.users.lock().unwrap().contains(&user_id) {
            return Err(DaybookError::UserNotFound(user_id));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let row = LocalEvent {
            id: *next_id,
            user_id,
            title: event.title,
            description: event.description,
            location: event.location,
            start_time: event.start_time,
            end_time: event.end_time,
            is_all_day: event.is_all_day,
            recurrence: event.recurrence,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: i64,
        user_id: i64,
        patch: LocalEventPatch,
    ) -> DomainResult<Option<LocalEvent>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|e| e.id == id && e.user_id == user_id).map(|row| {
            if let Some(title) = patch.title {
                row.title = title;
            }
            if let Some(description) = patch.description {
                row.description = Some(description).filter(|d| !d.is_empty());
            }
            if let Some(location) = patch.location {
                row.location = Some(location).filter(|l| !l.is_empty());
            }
            if let Some(start) = patch.start_time {
                row.start_time = start;
            }
            if let Some(end) = patch.end_time {
                row.end_time = end;
            }
            if let Some(all_day) = patch.is_all_day {
                row.is_all_day = all_day;
            }
            if let Some(recurrence) = patch.recurrence {
                row.recurrence = recurrence;
            }
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete(&self, id: i64, user_id: i64) -> DomainResult<Option<LocalEvent>> {
        let mut rows = self.rows.lock().unwrap();
        let index = rows.iter().position(|e| e.id == id && e.user_id == user_id);
        Ok(index.map(|i| rows.remove(i)))
    }

    async fn count(&self, user_id: i64) -> DomainResult<u64> {
        Ok(self.rows.lock().unwrap().iter().filter(|e| e.user_id == user_id).count() as u64)
    }
}
