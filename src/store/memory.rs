//! In-memory ledger store
//!
//! Backend for tests and single-node development. One `RwLock` guards
//! the whole ledger, so a committed batch becomes visible in a single
//! step; readers never observe half a batch.
//!
//! Carries failure injection so callers can prove atomicity: a commit
//! that fails must leave balances, postings, and notifications untouched.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::account::{Account, MoniNumber};
use crate::core_types::{AccountKey, NotificationId, PostingId};
use crate::notify::{Notification, NotificationKind, RequestStatus};
use crate::transfer::Posting;

use super::batch::{WriteBatch, WriteOp};
use super::error::StoreError;
use super::LedgerStore;

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    moni_index: HashMap<String, AccountKey>,
    postings: HashMap<PostingId, Posting>,
    notifications: HashMap<NotificationId, Notification>,
}

/// In-memory [`LedgerStore`] backend with failure injection.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    moni_seq: AtomicU64,
    fail_commit: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            moni_seq: AtomicU64::new(0),
            fail_commit: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Make every subsequent commit fail with `Unavailable` before
    /// applying anything.
    pub fn set_fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail with `Unavailable`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    /// Snapshot of an account's balance, for assertions in tests.
    pub fn balance_of(&self, key: &AccountKey) -> Option<i64> {
        let inner = self.inner.read().unwrap();
        inner.accounts.get(key.as_str()).map(|a| a.balance)
    }

    /// (accounts, postings, notifications) counts, for assertions in tests.
    pub fn counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.read().unwrap();
        (
            inner.accounts.len(),
            inner.postings.len(),
            inner.notifications.len(),
        )
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Check one op against current state. Nothing is written here; commit
/// applies ops only after every precondition passed.
fn check_op(inner: &Inner, op: &WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::InsertPosting(_) | WriteOp::InsertNotification(_) => Ok(()),
        WriteOp::AdjustBalance { account, .. } => {
            if inner.accounts.contains_key(account.as_str()) {
                Ok(())
            } else {
                Err(StoreError::AccountNotFound(account.to_string()))
            }
        }
        WriteOp::SetRequestStatus { id, expected, .. } => match inner.notifications.get(id) {
            Some(n)
                if n.kind == NotificationKind::P2pRequest
                    && n.request_status == Some(*expected) =>
            {
                Ok(())
            }
            Some(_) => Err(StoreError::RequestConflict(id.to_string())),
            None => Err(StoreError::RequestConflict(id.to_string())),
        },
    }
}

fn apply_op(inner: &mut Inner, op: WriteOp) {
    match op {
        WriteOp::InsertPosting(posting) => {
            inner.postings.insert(posting.id, posting);
        }
        WriteOp::InsertNotification(notification) => {
            inner.notifications.insert(notification.id, notification);
        }
        WriteOp::AdjustBalance { account, delta } => {
            if let Some(acc) = inner.accounts.get_mut(account.as_str()) {
                acc.balance += delta;
            }
        }
        WriteOp::SetRequestStatus { id, next, .. } => {
            if let Some(n) = inner.notifications.get_mut(&id) {
                n.request_status = Some(next);
                if next != RequestStatus::Pending {
                    n.action_required = false;
                }
            }
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn account(&self, key: &AccountKey) -> Result<Option<Account>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.read().unwrap();
        Ok(inner.accounts.get(key.as_str()).cloned())
    }

    async fn account_by_moni(&self, moni: &MoniNumber) -> Result<Option<Account>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.read().unwrap();
        let key = match inner.moni_index.get(moni.as_str()) {
            Some(key) => key,
            None => return Ok(None),
        };
        Ok(inner.accounts.get(key.as_str()).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap();
        if inner.accounts.contains_key(account.key.as_str()) {
            return Err(StoreError::AccountExists(account.key.to_string()));
        }
        if inner.moni_index.contains_key(account.moni_number.as_str()) {
            return Err(StoreError::DuplicateMoniNumber(
                account.moni_number.to_string(),
            ));
        }
        inner
            .moni_index
            .insert(account.moni_number.as_str().to_string(), account.key.clone());
        inner
            .accounts
            .insert(account.key.as_str().to_string(), account.clone());
        Ok(())
    }

    async fn next_moni_sequence(&self) -> Result<u64, StoreError> {
        Ok(self.moni_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        let mut inner = self.inner.write().unwrap();

        // Validate first, apply second: a rejected batch changes nothing.
        for op in batch.ops() {
            check_op(&inner, op)?;
        }
        for op in batch.into_ops() {
            apply_op(&mut inner, op);
        }
        Ok(())
    }

    async fn posting(&self, id: PostingId) -> Result<Option<Posting>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.read().unwrap();
        Ok(inner.postings.get(&id).cloned())
    }

    async fn postings_for(
        &self,
        key: &AccountKey,
        limit: usize,
    ) -> Result<Vec<Posting>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.read().unwrap();
        let mut postings: Vec<Posting> = inner
            .postings
            .values()
            .filter(|p| p.account == *key)
            .cloned()
            .collect();
        postings.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        postings.truncate(limit);
        Ok(postings)
    }

    async fn notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.read().unwrap();
        Ok(inner.notifications.get(&id).cloned())
    }

    async fn notifications_for(
        &self,
        key: &AccountKey,
    ) -> Result<Vec<Notification>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.read().unwrap();
        let mut notifications: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.account == *key)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StoreError> {
        let mut inner = self.inner.write().unwrap();
        match inner.notifications.get_mut(&id) {
            Some(n) => {
                n.read = true;
                n.action_required = false;
                Ok(Some(n.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_request_status(
        &self,
        id: NotificationId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().unwrap();
        match inner.notifications.get_mut(&id) {
            Some(n)
                if n.kind == NotificationKind::P2pRequest
                    && n.request_status == Some(expected) =>
            {
                n.request_status = Some(next);
                if next != RequestStatus::Pending {
                    n.action_required = false;
                }
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }
}
