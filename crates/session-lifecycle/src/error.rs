use api_gateway::ApiError;
use thiserror::Error;

/// Error type for lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A classified API failure; `is_retryable()` tells the UI whether
    /// to offer a retry.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Reading or writing persisted session state failed.
    #[error("Storage error: {0}")]
    Storage(#[from] session_store::StorageError),
}

/// Result type alias using LifecycleError.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
