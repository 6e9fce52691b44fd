//! Recipient resolution
//!
//! Turns a typed-in wallet number into an account. Fails closed: a
//! malformed or unknown number never yields an account, so money can
//! only move toward a wallet that actually exists.

use std::sync::Arc;

use crate::store::{LedgerStore, StoreError};

use super::models::Account;
use super::validation::{MoniNumber, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("No wallet found for {0}")]
    RecipientNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Resolver {
    store: Arc<dyn LedgerStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, input: &str) -> Result<Account, ResolveError> {
        let moni = MoniNumber::new(input)?;
        self.store
            .account_by_moni(&moni)
            .await?
            .ok_or_else(|| ResolveError::RecipientNotFound(moni.to_string()))
    }
}
