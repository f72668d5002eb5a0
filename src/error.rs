//! Error types for the vote ledger.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for vote ledger operations.
pub type VoteResult<T> = Result<T, VoteError>;

/// Errors surfaced by vote operations.
///
/// `NotFound` and `InvalidArgument` abort before any mutation. `Timeout`
/// and `Database` abort the whole operation; retrying after either is
/// safe because a vote is a toggle, but a timed-out request is not
/// guaranteed to have been a no-op.
#[derive(Error, Debug)]
pub enum VoteError {
    /// Vote target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed identifier or unsupported input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store did not answer within the configured bound
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic error with context
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl VoteError {
    /// Whether the caller may retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VoteError::Timeout(_) | VoteError::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(VoteError::Timeout(Duration::from_secs(2)).is_retryable());
        assert!(VoteError::Database(sqlx::Error::PoolClosed).is_retryable());
        assert!(!VoteError::NotFound("post".into()).is_retryable());
        assert!(!VoteError::InvalidArgument("nil voter id".into()).is_retryable());
    }
}
