//! High-level API for the persisted session token and UI language.

use crate::claims::token_expires_at;
use crate::{StorageError, StorageKeys, StorageResult, TokenStorage};
use thiserror::Error;

/// Tokens with less than this many seconds remaining are treated as
/// expired, so a refresh happens before the server starts rejecting.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Error type for session store operations.
#[derive(Error, Debug)]
pub enum SessionStoreError {
    /// The token was blank after trimming
    #[error("Invalid session token: blank after trimming")]
    InvalidToken,

    /// Underlying storage error
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owner of the persisted bearer token. Pure storage; never performs
/// network I/O and never decides whether a session is actually valid.
pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
}

impl SessionStore {
    /// Create a new session store with the given storage backend.
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    /// True iff a non-blank token is persisted.
    pub fn has_token(&self) -> StorageResult<bool> {
        Ok(self.token()?.is_some())
    }

    /// The persisted token, trimmed. `None` if absent or blank.
    pub fn token(&self) -> StorageResult<Option<String>> {
        match self.storage.get(StorageKeys::SESSION_TOKEN)? {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            None => Ok(None),
        }
    }

    /// Persist a token. Fails if the token is blank after trimming.
    pub fn set_token(&self, token: &str) -> Result<(), SessionStoreError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SessionStoreError::InvalidToken);
        }
        self.storage.set(StorageKeys::SESSION_TOKEN, trimmed)?;
        tracing::debug!("Session token persisted");
        Ok(())
    }

    /// Remove the persisted token. Idempotent.
    pub fn remove_token(&self) -> StorageResult<()> {
        let _ = self.storage.delete(StorageKeys::SESSION_TOKEN)?;
        Ok(())
    }

    /// True iff a token is persisted and its embedded expiry claim has
    /// passed (with a small skew margin). A token without a readable
    /// expiry is never reported expired locally; the server decides.
    pub fn is_token_expired(&self) -> StorageResult<bool> {
        let token = match self.token()? {
            Some(token) => token,
            None => return Ok(true),
        };

        match token_expires_at(&token) {
            Some(expires_at) => {
                let remaining = expires_at
                    .signed_duration_since(chrono::Utc::now())
                    .num_seconds();
                Ok(remaining < EXPIRY_SKEW_SECONDS)
            }
            None => Ok(false),
        }
    }

    /// The persisted UI language tag, if the user picked one.
    pub fn language(&self) -> StorageResult<Option<String>> {
        match self.storage.get(StorageKeys::UI_LANGUAGE)? {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            None => Ok(None),
        }
    }

    /// Persist the UI language tag. Blank values clear it instead.
    pub fn set_language(&self, language: &str) -> StorageResult<()> {
        let trimmed = language.trim();
        if trimmed.is_empty() {
            return self.clear_language();
        }
        self.storage.set(StorageKeys::UI_LANGUAGE, trimmed)
    }

    /// Clear the persisted UI language. Idempotent.
    pub fn clear_language(&self) -> StorageResult<()> {
        let _ = self.storage.delete(StorageKeys::UI_LANGUAGE)?;
        Ok(())
    }
}
