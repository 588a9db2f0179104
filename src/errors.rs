//! Error types for cursor construction and execution
//!
//! Taxonomy:
//! - `InvalidArgument`: fatal at construction, never retried
//! - `InvalidContinuation`: fatal, surfaced to the caller; never silently
//!   falls back to restarting from the beginning
//! - `Store`: storage/transaction failures passed through untouched so the
//!   transaction-retry layer above can rebuild the cursor topology from the
//!   last observed continuation
//! - `Predicate`: predicate evaluation failed; aborts the filter pipeline

use thiserror::Error;

/// Result type for cursor operations
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors produced by cursors and continuation codecs
#[derive(Debug, Error)]
pub enum CursorError {
    /// A cursor was constructed with invalid inputs
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A continuation could not be decoded or does not match the cursor
    /// definition it was fed into
    #[error("Invalid continuation: {0}")]
    InvalidContinuation(String),

    /// A storage-level failure (timeout, conflict, transaction too old);
    /// propagated to the caller's retry layer, never handled here
    #[error("Store operation failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Predicate evaluation failed inside a filter pipeline
    #[error("Predicate evaluation failed: {0}")]
    Predicate(String),
}

impl CursorError {
    /// Create an invalid-argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        CursorError::InvalidArgument(reason.into())
    }

    /// Create an invalid-continuation error
    pub fn invalid_continuation(reason: impl Into<String>) -> Self {
        CursorError::InvalidContinuation(reason.into())
    }

    /// Wrap a storage-level failure
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        CursorError::Store(Box::new(source))
    }

    /// Create a predicate-evaluation error
    pub fn predicate(reason: impl Into<String>) -> Self {
        CursorError::Predicate(reason.into())
    }

    /// Returns true if this error is fatal at construction time
    /// (the caller must not retry with the same inputs)
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            CursorError::InvalidArgument(_) | CursorError::InvalidContinuation(_)
        )
    }
}
