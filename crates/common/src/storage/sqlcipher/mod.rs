//! Encrypted SQLite access.
//!
//! Every connection handed out by [`SqlCipherPool`] has been keyed, verified
//! and tuned before the caller sees it.

pub mod cipher;
pub mod config;
pub mod connection;
pub mod pool;

pub use cipher::{configure_sqlcipher, verify_encryption, SqlCipherConfig};
pub use config::SqlCipherPoolConfig;
pub use connection::SqlCipherConnection;
pub use pool::SqlCipherPool;
