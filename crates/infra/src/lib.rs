//! # Daybook Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite/SQLCipher)
//! - HTTP client with retry support
//! - External service integrations (Google Calendar, OpenAI)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `daybook-core`
//! - Depends on `daybook-common`, `daybook-domain` and `daybook-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use http::*;
pub use integrations::*;
