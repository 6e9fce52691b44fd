//! Notification event hub
//!
//! In-process fanout of committed notification events. Each account
//! gets its own broadcast channel, created on first subscribe. The
//! ledger is the durable record; this stream only wakes live clients,
//! so delivery is best effort and slow consumers can miss events.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core_types::AccountKey;

use super::models::NotificationEvent;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct NotificationHub {
    channels: DashMap<AccountKey, broadcast::Sender<NotificationEvent>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn subscribe(&self, account: &AccountKey) -> broadcast::Receiver<NotificationEvent> {
        let tx = self
            .channels
            .entry(account.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        debug!(account = %account, "notification stream subscribed");
        tx.subscribe()
    }

    pub fn publish(&self, account: &AccountKey, event: NotificationEvent) {
        let Some(tx) = self.channels.get(account) else {
            return;
        };
        if tx.send(event).is_err() {
            // all receivers are gone, drop the channel
            drop(tx);
            self.channels
                .remove_if(account, |_, tx| tx.receiver_count() == 0);
            debug!(account = %account, "notification stream closed");
        }
    }

    pub fn subscriber_count(&self, account: &AccountKey) -> usize {
        self.channels
            .get(account)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    pub fn active_accounts(&self) -> usize {
        self.channels.len()
    }
}
