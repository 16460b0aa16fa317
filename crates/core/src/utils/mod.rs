//! Small shared helpers for the core services

pub mod time;
