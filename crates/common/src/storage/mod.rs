//! Storage primitives for encrypted databases
//!
//! Generic SQLCipher pooling; schema and queries belong to the application
//! layer.

pub mod error;
pub mod sqlcipher;

pub use error::{StorageError, StorageResult};
pub use sqlcipher::{SqlCipherConfig, SqlCipherConnection, SqlCipherPool, SqlCipherPoolConfig};
