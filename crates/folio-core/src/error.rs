//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business rule failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),
}

/// Document store errors, reported verbatim by every adapter.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Subscription failed: {0}")]
    Subscription(String),
}

/// Repository-level errors.
///
/// Store failures pass through untouched; the only condition the repository
/// raises on its own is a missing backend.
#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("Document store is not configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepoError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, RepoError::NotConfigured(_))
    }
}
