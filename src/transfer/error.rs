//! Transfer error types

use thiserror::Error;

use crate::account::{AccountError, ResolveError, ValidationError};
use crate::store::StoreError;

/// Everything that can stop a transfer.
///
/// Validation failures are reported before any write happens; the
/// system variants surface after validation, from the commit itself.
#[derive(Error, Debug)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Transfer kind '{0}' cannot be initiated directly")]
    KindNotInitiable(&'static str),

    #[error("Transfer kind '{0}' requires a recipient")]
    RecipientRequired(&'static str),

    #[error("Transfer kind '{0}' does not take a recipient")]
    UnexpectedRecipient(&'static str),

    #[error("Details payload does not match transfer kind '{0}'")]
    DetailsMismatch(&'static str),

    #[error(transparent)]
    InvalidRecipient(#[from] ValidationError),

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: u64 },

    // === Recipient Errors ===
    #[error("No wallet found for {0}")]
    RecipientNotFound(String),

    // === Request Errors ===
    #[error("Request {0} is no longer pending")]
    RequestConflict(String),

    // === System Errors ===
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => TransferError::StoreUnavailable(msg),
            StoreError::RequestConflict(id) => TransferError::RequestConflict(id),
            other => TransferError::Store(other.to_string()),
        }
    }
}

impl From<ResolveError> for TransferError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Invalid(e) => TransferError::InvalidRecipient(e),
            ResolveError::RecipientNotFound(moni) => TransferError::RecipientNotFound(moni),
            ResolveError::Store(e) => e.into(),
        }
    }
}

impl From<AccountError> for TransferError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(e) => TransferError::InvalidRecipient(e),
            AccountError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outage_and_conflict_keep_their_identity_through_from() {
        assert!(matches!(
            TransferError::from(StoreError::Unavailable("down".into())),
            TransferError::StoreUnavailable(_)
        ));
        assert!(matches!(
            TransferError::from(StoreError::RequestConflict("abc".into())),
            TransferError::RequestConflict(_)
        ));
        assert!(matches!(
            TransferError::from(StoreError::Internal("x".into())),
            TransferError::Store(_)
        ));
    }

    #[test]
    fn resolver_errors_map_to_the_validation_family() {
        let err = TransferError::from(ResolveError::RecipientNotFound("MN100042".into()));
        assert!(matches!(err, TransferError::RecipientNotFound(_)));
        assert_eq!(err.to_string(), "No wallet found for MN100042");
    }

    #[test]
    fn display_strings() {
        assert_eq!(
            TransferError::InvalidAmount.to_string(),
            "Amount must be greater than zero"
        );
        assert_eq!(
            TransferError::InsufficientFunds {
                balance: 100,
                requested: 500
            }
            .to_string(),
            "Insufficient funds: balance 100, requested 500"
        );
    }
}
