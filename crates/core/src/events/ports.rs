//! Port interfaces for local event persistence
//!
//! Every operation is scoped by `user_id`; implementations must filter on
//! both the row id and the owner so one user never sees another's rows.

use async_trait::async_trait;
use daybook_domain::{LocalEvent, LocalEventFilters, LocalEventPatch, NewLocalEvent, Result};

#[async_trait]
pub trait LocalEventRepository: Send + Sync {
    /// Events ordered by start time ascending.
    async fn list(&self, user_id: i64, filters: LocalEventFilters) -> Result<Vec<LocalEvent>>;

    async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<LocalEvent>>;

    /// Insert a row. Fails with `UserNotFound` before writing if the owner
    /// does not exist.
    async fn create(&self, user_id: i64, event: NewLocalEvent) -> Result<LocalEvent>;

    /// Apply a patch; `None` when no row matches `(id, user_id)`.
    async fn update(
        &self,
        id: i64,
        user_id: i64,
        patch: LocalEventPatch,
    ) -> Result<Option<LocalEvent>>;

    /// Remove a row and return it; `None` when no row matches.
    async fn delete(&self, id: i64, user_id: i64) -> Result<Option<LocalEvent>>;

    async fn count(&self, user_id: i64) -> Result<u64>;
}
