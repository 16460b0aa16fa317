//! # Daybook Common
//!
//! Shared infrastructure primitives that carry no Daybook domain knowledge.
//!
//! - [`storage`]: SQLCipher-encrypted SQLite connection pooling

pub mod storage;
