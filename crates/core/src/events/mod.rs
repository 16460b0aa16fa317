//! Local event store: per-user CRUD plus derived queries.

pub mod ports;
pub mod store;

pub use store::LocalEventStore;
