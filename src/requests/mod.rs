//! Payment requests
//!
//! A request for money is a durable notification on the payer's feed:
//! kind `P2pRequest`, carrying the requester's identity, the amount,
//! and a persisted `Pending`/`Accepted`/`Rejected` status. No money
//! moves until the payer accepts; acceptance delegates to the transfer
//! engine, which carries the `Pending -> Accepted` transition inside
//! the same atomic batch as the payment. Losing that race settles
//! nothing twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::account::{
    AccountError, AccountService, MoniNumber, ResolveError, Resolver, ValidationError,
};
use crate::core_types::{AccountKey, MinorUnits, NotificationId};
use crate::money::format_amount;
use crate::notify::{
    Notification, NotificationEvent, NotificationHub, NotificationKind, RequestStatus,
};
use crate::store::{LedgerStore, StoreError, WriteBatch};
use crate::transfer::{
    DisplayData, TransferDetails, TransferEngine, TransferError, TransferKind, TransferReceipt,
    TransferSpec, FALLBACK_DISPLAY_NAME,
};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error(transparent)]
    InvalidWalletNumber(#[from] ValidationError),

    #[error("No wallet found for {0}")]
    WalletNotFound(String),

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: u64 },

    #[error("Request not found")]
    NotFound,

    #[error("Request already resolved")]
    AlreadyResolved,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for RequestError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => RequestError::StoreUnavailable(msg),
            StoreError::RequestConflict(_) => RequestError::AlreadyResolved,
            other => RequestError::Store(other.to_string()),
        }
    }
}

impl From<ResolveError> for RequestError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Invalid(e) => RequestError::InvalidWalletNumber(e),
            ResolveError::RecipientNotFound(moni) => RequestError::WalletNotFound(moni),
            ResolveError::Store(e) => e.into(),
        }
    }
}

impl From<AccountError> for RequestError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(e) => RequestError::InvalidWalletNumber(e),
            AccountError::Store(e) => e.into(),
        }
    }
}

impl From<TransferError> for RequestError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Unauthenticated => RequestError::Unauthenticated,
            TransferError::InvalidAmount => RequestError::InvalidAmount,
            TransferError::InvalidRecipient(e) => RequestError::InvalidWalletNumber(e),
            TransferError::RecipientNotFound(moni) => RequestError::WalletNotFound(moni),
            TransferError::InsufficientFunds { balance, requested } => {
                RequestError::InsufficientFunds { balance, requested }
            }
            TransferError::RequestConflict(_) => RequestError::AlreadyResolved,
            TransferError::StoreUnavailable(msg) => RequestError::StoreUnavailable(msg),
            other => RequestError::Store(other.to_string()),
        }
    }
}

/// A payer-facing view of one request notification.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub id: NotificationId,
    pub requester_name: String,
    pub requester_moni: MoniNumber,
    pub amount: MinorUnits,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Project a notification into a request view. Records that are not
/// well-formed requests are skipped rather than surfaced.
fn request_view(n: &Notification) -> Option<PaymentRequest> {
    if n.kind != NotificationKind::P2pRequest {
        return None;
    }
    Some(PaymentRequest {
        id: n.id,
        requester_name: n.sender_name.clone()?,
        requester_moni: n.sender_moni.clone()?,
        amount: n.amount?,
        message: (!n.message.is_empty()).then(|| n.message.clone()),
        status: n.request_status?,
        created_at: n.created_at,
    })
}

pub struct RequestLedger {
    store: Arc<dyn LedgerStore>,
    resolver: Arc<Resolver>,
    accounts: Arc<AccountService>,
    engine: Arc<TransferEngine>,
    hub: Arc<NotificationHub>,
}

impl RequestLedger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        resolver: Arc<Resolver>,
        accounts: Arc<AccountService>,
        engine: Arc<TransferEngine>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            store,
            resolver,
            accounts,
            engine,
            hub,
        }
    }

    /// Ask `payer_moni` for money. Writes one pending request
    /// notification on the payer's feed; no balance is touched or held.
    pub async fn create_request(
        &self,
        requester: &AccountKey,
        payer_moni: &str,
        amount: MinorUnits,
        message: Option<String>,
    ) -> Result<PaymentRequest, RequestError> {
        if requester.is_empty() {
            return Err(RequestError::Unauthenticated);
        }
        if amount == 0 || i64::try_from(amount).is_err() {
            return Err(RequestError::InvalidAmount);
        }

        let payer = self.resolver.resolve(payer_moni).await?;
        let requester_account = self
            .accounts
            .ensure(requester, FALLBACK_DISPLAY_NAME)
            .await?;

        let notification = Notification {
            id: NotificationId::new(),
            account: payer.key.clone(),
            kind: NotificationKind::P2pRequest,
            title: format!(
                "{} requests {}",
                requester_account.display_name,
                format_amount(amount)
            ),
            // the raw note; it rides along into the settling transfer
            message: message.unwrap_or_default(),
            amount: Some(amount),
            sender_name: Some(requester_account.display_name.clone()),
            sender_moni: Some(requester_account.moni_number.clone()),
            posting_id: None,
            request_status: Some(RequestStatus::Pending),
            read: false,
            action_required: true,
            created_at: Utc::now(),
        };

        let mut batch = WriteBatch::new();
        batch.insert_notification(notification.clone());
        self.store.commit(batch).await?;
        info!(
            request = %notification.id,
            requester = %requester,
            payer = %payer.key,
            amount,
            "payment request created"
        );

        self.hub.publish(
            &payer.key,
            NotificationEvent::Posted(notification.clone()),
        );

        // the view is total for a record we just built
        request_view(&notification).ok_or_else(|| {
            RequestError::Store("request projection lost its own fields".to_string())
        })
    }

    /// Requests sitting on `account`'s feed, most recent first, in every
    /// status. Callers filter on `status` for the pending-only view.
    pub async fn incoming_requests(
        &self,
        account: &AccountKey,
    ) -> Result<Vec<PaymentRequest>, RequestError> {
        if account.is_empty() {
            return Err(RequestError::Unauthenticated);
        }
        let notifications = self.store.notifications_for(account).await?;
        Ok(notifications.iter().filter_map(request_view).collect())
    }

    /// Pay a pending request. The payment and the `Pending -> Accepted`
    /// transition commit in one batch; a concurrent accept or reject
    /// makes the whole batch fail with `AlreadyResolved`.
    pub async fn accept(
        &self,
        payer: &AccountKey,
        id: NotificationId,
    ) -> Result<TransferReceipt, RequestError> {
        let request = self.load_request(payer, id).await?;
        if request.request_status != Some(RequestStatus::Pending) {
            return Err(RequestError::AlreadyResolved);
        }

        let requester_moni = request
            .sender_moni
            .clone()
            .ok_or_else(|| RequestError::Store("request record has no requester".to_string()))?;
        let amount = request
            .amount
            .ok_or_else(|| RequestError::Store("request record has no amount".to_string()))?;
        let requester_name = request
            .sender_name
            .clone()
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());
        let message = (!request.message.is_empty()).then(|| request.message.clone());

        let spec = TransferSpec {
            kind: TransferKind::P2pSend,
            amount,
            recipient: Some(requester_moni.to_string()),
            message,
            reference: None,
            details: TransferDetails::None,
            display: DisplayData {
                title: "Request paid".to_string(),
                description: format!("To {requester_name}"),
                icon: "arrow-up-right".to_string(),
                color: "text-red-500".to_string(),
            },
        };

        let receipt = self.engine.execute(payer, spec, Some(id)).await?;
        info!(request = %id, payer = %payer, transfer = %receipt.transfer_id, "payment request accepted");

        self.publish_update(payer, id).await;
        Ok(receipt)
    }

    /// Decline a pending request. Persists `Pending -> Rejected`; no
    /// money moves, and the decision survives sessions.
    pub async fn reject(
        &self,
        payer: &AccountKey,
        id: NotificationId,
    ) -> Result<PaymentRequest, RequestError> {
        let request = self.load_request(payer, id).await?;
        if request.request_status != Some(RequestStatus::Pending) {
            return Err(RequestError::AlreadyResolved);
        }

        let transitioned = self
            .store
            .update_request_status(id, RequestStatus::Pending, RequestStatus::Rejected)
            .await?;
        if !transitioned {
            return Err(RequestError::AlreadyResolved);
        }
        info!(request = %id, payer = %payer, "payment request rejected");

        self.publish_update(payer, id).await;

        let updated = self
            .store
            .notification(id)
            .await?
            .ok_or(RequestError::NotFound)?;
        request_view(&updated).ok_or(RequestError::NotFound)
    }

    /// Addressee, kind, and existence checks shared by accept/reject.
    /// Someone else's request is indistinguishable from a missing one.
    async fn load_request(
        &self,
        payer: &AccountKey,
        id: NotificationId,
    ) -> Result<Notification, RequestError> {
        if payer.is_empty() {
            return Err(RequestError::Unauthenticated);
        }
        let notification = self
            .store
            .notification(id)
            .await?
            .ok_or(RequestError::NotFound)?;
        if notification.account != *payer || notification.kind != NotificationKind::P2pRequest {
            return Err(RequestError::NotFound);
        }
        Ok(notification)
    }

    async fn publish_update(&self, payer: &AccountKey, id: NotificationId) {
        if let Ok(Some(updated)) = self.store.notification(id).await {
            self.hub
                .publish(payer, NotificationEvent::Updated(updated));
        }
    }
}
