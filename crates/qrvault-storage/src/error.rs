//! Error types

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Secure key storage could not load or persist the vault key
    #[error("Key storage error: {0}")]
    KeyStorage(String),

    /// Ciphertext is malformed, truncated, or from another key
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload interpretation error
    #[error(transparent)]
    Core(#[from] qrvault_core::Error),
}

impl Error {
    /// Whether the error aborts a whole vault operation rather than one record
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::KeyStorage(_) | Error::Database(_) | Error::Migration(_) | Error::Io(_)
        )
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
