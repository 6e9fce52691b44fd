//! Ledger store
//!
//! One async trait owns all persistence: accounts, postings,
//! notifications, and the atomic batch commit every transfer goes
//! through. Two backends implement it: [`MemoryStore`] for tests and
//! development, [`PgStore`] for deployment.

pub mod batch;
pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::account::{Account, MoniNumber};
use crate::core_types::{AccountKey, NotificationId, PostingId};
use crate::notify::{Notification, RequestStatus};
use crate::transfer::Posting;

pub use batch::{WriteBatch, WriteOp};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Document-style wallet ledger.
///
/// Reads are point lookups or per-account listings (most recent first).
/// All writes that must be atomic go through [`commit`]: a failed commit
/// means nothing in the batch was applied.
///
/// [`commit`]: LedgerStore::commit
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load an account by its internal key.
    async fn account(&self, key: &AccountKey) -> Result<Option<Account>, StoreError>;

    /// Load an account by its public wallet number. Uniqueness is a
    /// store invariant, so at most one account can match.
    async fn account_by_moni(&self, moni: &MoniNumber) -> Result<Option<Account>, StoreError>;

    /// Insert a freshly provisioned account.
    ///
    /// Fails with [`StoreError::AccountExists`] on a key collision and
    /// [`StoreError::DuplicateMoniNumber`] when the wallet number is
    /// already taken.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Issue the next wallet order number. Monotonic per store.
    async fn next_moni_sequence(&self) -> Result<u64, StoreError>;

    /// Apply a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Load one posting.
    async fn posting(&self, id: PostingId) -> Result<Option<Posting>, StoreError>;

    /// An account's postings, most recent first, at most `limit`.
    async fn postings_for(
        &self,
        key: &AccountKey,
        limit: usize,
    ) -> Result<Vec<Posting>, StoreError>;

    /// Load one notification.
    async fn notification(&self, id: NotificationId)
    -> Result<Option<Notification>, StoreError>;

    /// An account's notifications, most recent first.
    async fn notifications_for(&self, key: &AccountKey)
    -> Result<Vec<Notification>, StoreError>;

    /// Set `read = true` and clear `action_required`. One-way and
    /// idempotent; returns the updated record, `None` if the id is
    /// unknown.
    async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StoreError>;

    /// Standalone compare-and-set on a request notification's status,
    /// clearing `action_required` when the request leaves `Pending`.
    /// Returns false when the precondition did not hold.
    async fn update_request_status(
        &self,
        id: NotificationId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<bool, StoreError>;
}
