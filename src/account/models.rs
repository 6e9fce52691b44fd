//! Data models for wallet accounts

use chrono::{DateTime, Utc};

use super::validation::MoniNumber;
use crate::core_types::AccountKey;

/// Wallet account
///
/// Balances are signed minor units. The primary balance can legitimately
/// go negative under racing debits; the linked balance mirrors an external
/// wallet and is read-only for the transfer engine.
#[derive(Debug, Clone)]
pub struct Account {
    pub key: AccountKey,
    pub display_name: String,
    pub moni_number: MoniNumber,
    pub balance: i64,
    pub linked_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Fresh account with zero balances, as created on first touch.
    pub fn provision(key: AccountKey, display_name: &str, moni_number: MoniNumber) -> Self {
        Self {
            key,
            display_name: display_name.to_string(),
            moni_number,
            balance: 0,
            linked_balance: 0,
            created_at: Utc::now(),
        }
    }

    /// True if a debit of `amount` would stay at or above the floor.
    pub fn can_cover(&self, amount: u64) -> bool {
        i64::try_from(amount)
            .map(|signed| signed <= self.balance)
            .unwrap_or(false)
    }
}
