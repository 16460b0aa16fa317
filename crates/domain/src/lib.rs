//! # Daybook Domain
//!
//! Business domain types and models for Daybook.
//!
//! This crate contains:
//! - The unified event model and namespaced event identifiers
//! - Local event, provider event and credential types
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Daybook crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
