//! Error types for the sign-in protocol.

use api_gateway::ApiError;
use thiserror::Error;

/// Error type for authentication operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A step was attempted out of protocol order, e.g. submitting a
    /// second-factor code with no challenge pending.
    #[error("Sign-in step out of order: {0}")]
    OutOfOrder(&'static str),

    /// The server throttled code verification; resubmission is blocked
    /// for this many more seconds.
    #[error("Code resubmission blocked for {seconds} more seconds")]
    MfaThrottled { seconds: u64 },

    /// Persisting the minted token failed.
    #[error("Token persistence failed: {0}")]
    Store(#[from] session_store::SessionStoreError),

    /// A classified API failure from the gateway.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_error_names_remaining_seconds() {
        let error = AuthError::MfaThrottled { seconds: 30 };
        assert_eq!(
            error.to_string(),
            "Code resubmission blocked for 30 more seconds"
        );
    }
}
