//! Error taxonomy for the outbound HTTP surface.
//!
//! The gateway classifies every failure exactly once; callers branch on
//! the variant and never on raw transport details.

use crate::Problem;
use thiserror::Error;

/// Classified API error.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 that survived a refresh attempt, or the refresh itself
    /// failed. Forces logout; surfaced silently via redirect.
    #[error("Session invalid")]
    SessionInvalid,

    /// 400 with structured field errors; surfaced inline on the
    /// originating form, never globally.
    #[error("Validation failed: {0}")]
    Validation(Problem),

    /// 404; renders a not-found view without invalidating the session.
    #[error("Not found: {0}")]
    NotFound(Problem),

    /// 403; renders a no-access view.
    #[error("Forbidden: {0}")]
    Forbidden(Problem),

    /// Any other non-2xx response. Never retried automatically.
    #[error("API error: {0}")]
    Api(Problem),

    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The caller aborted the request. Silent by contract: never a
    /// user-facing error, never a session transition.
    #[error("Request cancelled")]
    Cancelled,

    /// A 2xx response whose payload did not match the expected shape.
    #[error("Malformed response payload: {0}")]
    Decode(String),

    /// Reading or writing the persisted token failed.
    #[error("Storage error: {0}")]
    Storage(#[from] session_store::StorageError),
}

impl ApiError {
    /// True for failures worth a retry banner (network, timeout).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }

    /// True for outcomes that must not surface a user-visible error:
    /// cancellation is dropped, session-invalid is redirect-driven.
    pub fn is_silent(&self) -> bool {
        matches!(self, ApiError::Cancelled | ApiError::SessionInvalid)
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("connection refused".to_string()).is_retryable());
        assert!(ApiError::Timeout.is_retryable());
        assert!(!ApiError::SessionInvalid.is_retryable());
        assert!(!ApiError::Cancelled.is_retryable());
        assert!(!ApiError::NotFound(Problem::default()).is_retryable());
    }

    #[test]
    fn test_silent_classification() {
        assert!(ApiError::Cancelled.is_silent());
        assert!(ApiError::SessionInvalid.is_silent());
        assert!(!ApiError::Timeout.is_silent());
        assert!(!ApiError::Validation(Problem::default()).is_silent());
    }
}
