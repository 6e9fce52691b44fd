//! Notification reads and the read-state transition

use std::sync::Arc;

use tracing::debug;

use crate::core_types::{AccountKey, NotificationId};
use crate::store::{LedgerStore, StoreError};

use super::hub::NotificationHub;
use super::models::{Notification, NotificationEvent};

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for NotificationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            other => Self::Store(other),
        }
    }
}

pub struct NotificationService {
    store: Arc<dyn LedgerStore>,
    hub: Arc<NotificationHub>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn LedgerStore>, hub: Arc<NotificationHub>) -> Self {
        Self { store, hub }
    }

    /// All of an account's notifications, most recent first.
    pub async fn notifications_for(
        &self,
        account: &AccountKey,
    ) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.store.notifications_for(account).await?)
    }

    /// Unread notifications only, most recent first.
    pub async fn unread_for(
        &self,
        account: &AccountKey,
    ) -> Result<Vec<Notification>, NotificationError> {
        let mut notifications = self.store.notifications_for(account).await?;
        notifications.retain(|n| !n.read);
        Ok(notifications)
    }

    pub async fn unread_count(&self, account: &AccountKey) -> Result<usize, NotificationError> {
        Ok(self.unread_for(account).await?.len())
    }

    /// Mark one of the account's notifications read.
    ///
    /// One way and idempotent: a read notification stays read, and
    /// repeating the call changes nothing. Clearing also drops the
    /// action flag, so a request notification stops prompting once
    /// opened. A notification addressed to someone else is reported
    /// as missing.
    pub async fn mark_read(
        &self,
        account: &AccountKey,
        id: NotificationId,
    ) -> Result<Notification, NotificationError> {
        let current = self
            .store
            .notification(id)
            .await?
            .ok_or(NotificationError::NotFound)?;
        if current.account != *account {
            return Err(NotificationError::NotFound);
        }
        if current.read && !current.action_required {
            return Ok(current);
        }

        let updated = self
            .store
            .mark_notification_read(id)
            .await?
            .ok_or(NotificationError::NotFound)?;
        debug!(account = %account, notification = %id, "notification marked read");
        self.hub
            .publish(account, NotificationEvent::Updated(updated.clone()));
        Ok(updated)
    }
}
