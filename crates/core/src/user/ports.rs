//! Port interfaces for user records
//!
//! Users are created by the excluded auth layer; the event store only needs
//! to know whether one exists.

use async_trait::async_trait;
use daybook_domain::{Result, User};

/// Trait for user persistence and retrieval
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user, returning the stored row
    async fn create(&self, email: &str, name: Option<&str>) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Whether a user with this ID exists
    async fn exists(&self, id: i64) -> Result<bool>;
}
