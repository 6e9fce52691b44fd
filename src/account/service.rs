//! Account provisioning
//!
//! Wallet accounts are created lazily: the first operation an
//! authenticated key performs provisions its account with a zero
//! balance and a freshly issued wallet number. Uniqueness of the
//! wallet number is the store's constraint; this service only retries
//! when it loses a race.

use std::sync::Arc;

use tracing::info;

use crate::core_types::AccountKey;
use crate::store::{LedgerStore, StoreError};

use super::models::Account;
use super::validation::{MoniNumber, ValidationError};

const PROVISION_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Return the key's account, creating it on first use.
    ///
    /// Two concurrent calls for the same key may both try to insert;
    /// the loser re-reads and returns the winner's account, so both
    /// callers observe the same wallet number.
    pub async fn ensure(
        &self,
        key: &AccountKey,
        display_name: &str,
    ) -> Result<Account, AccountError> {
        for _ in 0..PROVISION_ATTEMPTS {
            if let Some(existing) = self.store.account(key).await? {
                return Ok(existing);
            }

            let seq = self.store.next_moni_sequence().await?;
            let account =
                Account::provision(key.clone(), display_name, MoniNumber::from_sequence(seq));
            match self.store.insert_account(&account).await {
                Ok(()) => {
                    info!(
                        account = %account.key,
                        moni = %account.moni_number,
                        "provisioned wallet account"
                    );
                    return Ok(account);
                }
                // lost the creation race, the next pass re-reads
                Err(StoreError::AccountExists(_)) => continue,
                // wallet number already taken, retry with a fresh one
                Err(StoreError::DuplicateMoniNumber(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(AccountError::Store(StoreError::Internal(format!(
            "could not provision account {key}"
        ))))
    }

    pub async fn account(&self, key: &AccountKey) -> Result<Option<Account>, AccountError> {
        Ok(self.store.account(key).await?)
    }

    /// Public lookup by wallet number, used to preview a recipient
    /// before sending.
    pub async fn lookup(&self, moni: &MoniNumber) -> Result<Option<Account>, AccountError> {
        Ok(self.store.account_by_moni(moni).await?)
    }
}
