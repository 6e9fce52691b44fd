//! Atomic write batch
//!
//! Every money movement is expressed as one batch: postings, balance
//! adjustments, notifications, and request-status transitions that must
//! become visible together or not at all.

use crate::core_types::{AccountKey, BalanceDelta, NotificationId};
use crate::notify::{Notification, RequestStatus};
use crate::transfer::Posting;

/// One write inside a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    InsertPosting(Posting),
    InsertNotification(Notification),
    /// Unconditional increment applied at commit time. Not a serialized
    /// read-modify-write: racing debits can drive a balance negative.
    AdjustBalance {
        account: AccountKey,
        delta: BalanceDelta,
    },
    /// Compare-and-set on a request notification's status. A mismatch
    /// aborts the whole batch.
    SetRequestStatus {
        id: NotificationId,
        expected: RequestStatus,
        next: RequestStatus,
    },
}

/// All-or-nothing unit handed to [`LedgerStore::commit`].
///
/// [`LedgerStore::commit`]: super::LedgerStore::commit
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_posting(&mut self, posting: Posting) {
        self.ops.push(WriteOp::InsertPosting(posting));
    }

    pub fn insert_notification(&mut self, notification: Notification) {
        self.ops.push(WriteOp::InsertNotification(notification));
    }

    pub fn adjust_balance(&mut self, account: AccountKey, delta: BalanceDelta) {
        self.ops.push(WriteOp::AdjustBalance { account, delta });
    }

    pub fn set_request_status(
        &mut self,
        id: NotificationId,
        expected: RequestStatus,
        next: RequestStatus,
    ) {
        self.ops.push(WriteOp::SetRequestStatus { id, expected, next });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
