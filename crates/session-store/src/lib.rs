//! Durable session-token storage for the console client.
//!
//! This crate owns the persisted bearer token and UI language
//! preference. It never performs network I/O; validity of a token is
//! ultimately the server's call, the local expiry predicate only reads
//! the embedded claim.

mod claims;
mod file;
mod keys;
mod store;
mod traits;

pub use claims::token_expires_at;
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use store::{SessionStore, SessionStoreError};
pub use traits::TokenStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a SessionStore backed by the default file storage.
pub fn create_session_store(paths: &console_config::Paths) -> StorageResult<SessionStore> {
    let storage = FileStorage::open(paths.session_file())?;
    Ok(SessionStore::new(Box::new(storage)))
}
