//! Ledger store error taxonomy

use thiserror::Error;

/// Errors surfaced by ledger store backends
///
/// `Unavailable` is the retryable class (connectivity, pool exhaustion);
/// everything else is a hard failure. A failed [`commit`] guarantees that
/// none of the batch was applied.
///
/// [`commit`]: super::LedgerStore::commit
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Wallet number already taken: {0}")]
    DuplicateMoniNumber(String),

    #[error("Request status conflict for notification {0}")]
    RequestConflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    /// Classify driver errors so `?` never hides a connectivity failure
    /// behind the generic database variant.
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(io) => StoreError::Unavailable(io.to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Unavailable("connection pool timed out".to_string())
            }
            sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    /// True for the transient class where a retry may succeed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
