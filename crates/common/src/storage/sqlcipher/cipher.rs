//! SQLCipher key setup and verification

use rusqlite::Connection;
use tracing::{debug, error};

use crate::storage::error::{looks_like_wrong_key, StorageError, StorageResult};

/// SQLCipher configuration
#[derive(Clone)]
pub struct SqlCipherConfig {
    key: String,

    /// Cipher compatibility version (4 for SQLCipher 4.x)
    pub cipher_compatibility: i32,

    /// KDF iterations for key derivation
    pub kdf_iter: i32,
}

// Keep the key out of logs
impl std::fmt::Debug for SqlCipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlCipherConfig")
            .field("key", &"***")
            .field("cipher_compatibility", &self.cipher_compatibility)
            .field("kdf_iter", &self.kdf_iter)
            .finish()
    }
}

impl SqlCipherConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), cipher_compatibility: 4, kdf_iter: 256_000 }
    }
}

/// Apply the encryption pragmas. Must run before any other statement on a
/// fresh connection.
///
/// # Errors
/// Returns [`StorageError::WrongKeyOrNotEncrypted`] when SQLCipher rejects
/// the key, [`StorageError::Encryption`] for any other pragma failure.
pub fn configure_sqlcipher(conn: &Connection, config: &SqlCipherConfig) -> StorageResult<()> {
    conn.pragma_update(None, "key", &config.key).map_err(|e| {
        error!(error = %e, "SQLCipher key setup failed");
        if looks_like_wrong_key(&e.to_string()) {
            StorageError::WrongKeyOrNotEncrypted
        } else {
            StorageError::Encryption(format!("Failed to set encryption key: {e}"))
        }
    })?;

    conn.pragma_update(None, "cipher_compatibility", config.cipher_compatibility)
        .map_err(|e| StorageError::Encryption(format!("Failed to set cipher_compatibility: {e}")))?;

    conn.pragma_update(None, "kdf_iter", config.kdf_iter)
        .map_err(|e| StorageError::Encryption(format!("Failed to set kdf_iter: {e}")))?;

    debug!("SQLCipher configured");
    Ok(())
}

/// Force SQLCipher to decrypt the header so a wrong key fails at pool
/// creation instead of on the first query.
///
/// # Errors
/// Returns [`StorageError::WrongKeyOrNotEncrypted`] if the key does not
/// open the file.
pub fn verify_encryption(conn: &Connection) -> StorageResult<()> {
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
        .map_err(|e| {
            if looks_like_wrong_key(&e.to_string()) {
                error!("Encryption verification failed: key rejected");
                StorageError::WrongKeyOrNotEncrypted
            } else {
                StorageError::from(e)
            }
        })
}
