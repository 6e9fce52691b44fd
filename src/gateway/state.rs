use std::sync::Arc;

use crate::account::{AccountService, Resolver};
use crate::notify::{NotificationHub, NotificationService};
use crate::requests::RequestLedger;
use crate::store::LedgerStore;
use crate::transfer::TransferEngine;

/// Shared gateway state.
///
/// Every service hangs off the same [`LedgerStore`] and the same
/// [`NotificationHub`], so a transfer committed through one handler is
/// visible to listings and live streams served by another.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub accounts: Arc<AccountService>,
    pub resolver: Arc<Resolver>,
    pub engine: Arc<TransferEngine>,
    pub requests: Arc<RequestLedger>,
    pub notifications: Arc<NotificationService>,
    pub hub: Arc<NotificationHub>,
}

impl AppState {
    /// Wires the full service graph on top of a single store backend.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let hub = Arc::new(NotificationHub::default());
        let accounts = Arc::new(AccountService::new(store.clone()));
        let resolver = Arc::new(Resolver::new(store.clone()));
        let engine = Arc::new(TransferEngine::new(
            store.clone(),
            accounts.clone(),
            resolver.clone(),
            hub.clone(),
        ));
        let requests = Arc::new(RequestLedger::new(
            store.clone(),
            resolver.clone(),
            accounts.clone(),
            engine.clone(),
            hub.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(store.clone(), hub.clone()));

        Self {
            store,
            accounts,
            resolver,
            engine,
            requests,
            notifications,
            hub,
        }
    }
}
