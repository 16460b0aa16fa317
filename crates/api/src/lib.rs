//! # Daybook API
//!
//! Application layer: the composition root the UI talks to.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Tracing initialisation and operation logging helpers
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod utils;

pub use context::*;
