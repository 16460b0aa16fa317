//! Database implementations

pub mod credential_repository;
pub mod local_event_repository;
pub mod manager;
pub mod user_repository;

pub use credential_repository::SqlCipherCredentialRepository;
pub use local_event_repository::SqlCipherLocalEventRepository;
pub use manager::DbManager;
pub use user_repository::SqlCipherUserRepository;
