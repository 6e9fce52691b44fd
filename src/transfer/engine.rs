//! Transfer engine
//!
//! Validates a transfer, then commits every record it produces in one
//! atomic batch: the sender posting, the balance adjustments, the
//! recipient's credit posting and notification, and (when settling a
//! payment request) the request's status transition. Either the whole
//! batch lands or none of it does.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::account::{Account, AccountService, Resolver};
use crate::core_types::{AccountKey, NotificationId, PostingId, TransferId};
use crate::money::format_amount;
use crate::notify::{
    Notification, NotificationEvent, NotificationHub, NotificationKind, RequestStatus,
};
use crate::store::{LedgerStore, WriteBatch};

use super::error::TransferError;
use super::types::{
    DisplayData, Posting, PostingStatus, TransferDetails, TransferKind, TransferReceipt,
    TransferSpec,
};

/// Page size for history listings when the caller does not ask for one.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Display name for a wallet provisioned implicitly by its first
/// transfer, before the owner has set a profile name.
pub const FALLBACK_DISPLAY_NAME: &str = "Unknown";

pub struct TransferEngine {
    store: Arc<dyn LedgerStore>,
    accounts: Arc<AccountService>,
    resolver: Arc<Resolver>,
    hub: Arc<NotificationHub>,
}

impl TransferEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        accounts: Arc<AccountService>,
        resolver: Arc<Resolver>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            store,
            accounts,
            resolver,
            hub,
        }
    }

    /// Validate and commit a transfer initiated by `sender`.
    ///
    /// There is no idempotency key: submitting the same spec twice
    /// moves money twice. A caller that times out mid-commit must
    /// reconcile against history instead of blindly retrying.
    pub async fn perform_transfer(
        &self,
        sender: &AccountKey,
        spec: TransferSpec,
    ) -> Result<TransferReceipt, TransferError> {
        self.execute(sender, spec, None).await
    }

    /// An account's postings, most recent first.
    pub async fn history(
        &self,
        account: &AccountKey,
        limit: usize,
    ) -> Result<Vec<Posting>, TransferError> {
        if account.is_empty() {
            return Err(TransferError::Unauthenticated);
        }
        Ok(self.store.postings_for(account, limit).await?)
    }

    /// Like [`perform_transfer`], but additionally carries a payment
    /// request's `Pending -> Accepted` transition inside the same
    /// batch, so settling a request and moving the money cannot come
    /// apart.
    ///
    /// [`perform_transfer`]: TransferEngine::perform_transfer
    pub(crate) async fn execute(
        &self,
        sender: &AccountKey,
        spec: TransferSpec,
        settles: Option<NotificationId>,
    ) -> Result<TransferReceipt, TransferError> {
        // every validation failure happens before anything is written
        if sender.is_empty() {
            return Err(TransferError::Unauthenticated);
        }
        if spec.amount == 0 || i64::try_from(spec.amount).is_err() {
            return Err(TransferError::InvalidAmount);
        }
        let kind = spec.kind;
        if !kind.is_initiable() {
            return Err(TransferError::KindNotInitiable(kind.as_str()));
        }
        match (&spec.recipient, kind.requires_recipient()) {
            (None, true) => return Err(TransferError::RecipientRequired(kind.as_str())),
            (Some(_), false) => return Err(TransferError::UnexpectedRecipient(kind.as_str())),
            _ => {}
        }
        if !spec.details.permits(kind) {
            return Err(TransferError::DetailsMismatch(kind.as_str()));
        }

        let sender_account = self.accounts.ensure(sender, FALLBACK_DISPLAY_NAME).await?;

        // floor check against the balance read above; concurrent debits
        // can still race past it, which is why balances are signed
        if kind.is_debit() && !sender_account.can_cover(spec.amount) {
            return Err(TransferError::InsufficientFunds {
                balance: sender_account.balance,
                requested: spec.amount,
            });
        }

        let recipient = match &spec.recipient {
            Some(input) => Some(self.resolver.resolve(input).await?),
            None => None,
        };

        let transfer_id = TransferId::new();
        let now = Utc::now();
        let mut batch = WriteBatch::new();
        let mut events: Vec<(AccountKey, Notification)> = Vec::new();

        let debit_posting = Posting {
            id: PostingId::new(),
            transfer_id,
            account: sender.clone(),
            kind,
            amount: spec.amount,
            status: PostingStatus::Completed,
            display: spec.display.clone(),
            counterparty_name: recipient.as_ref().map(|r| r.display_name.clone()),
            counterparty_moni: recipient.as_ref().map(|r| r.moni_number.clone()),
            message: spec.message.clone(),
            reference: spec.reference.clone(),
            details: spec.details.clone(),
            created_at: now,
        };
        let posting_id = debit_posting.id;
        batch.insert_posting(debit_posting);

        let delta = kind.balance_delta(spec.amount);
        if delta != 0 {
            batch.adjust_balance(sender.clone(), delta);
        }

        if let (Some(recipient), Some(credit_kind)) = (&recipient, kind.credit_counterpart()) {
            self.push_credit_leg(
                &mut batch,
                &mut events,
                &sender_account,
                recipient,
                credit_kind,
                transfer_id,
                &spec,
                now,
            );
        }

        if let Some(notification) =
            self.self_notification(&sender_account, kind, &spec, posting_id, now)
        {
            batch.insert_notification(notification.clone());
            events.push((sender.clone(), notification));
        }

        if let Some(request_id) = settles {
            batch.set_request_status(request_id, RequestStatus::Pending, RequestStatus::Accepted);
        }

        self.store.commit(batch).await?;
        info!(
            transfer = %transfer_id,
            kind = %kind,
            amount = spec.amount,
            sender = %sender,
            recipient = ?recipient.as_ref().map(|r| r.moni_number.as_str()),
            "transfer committed"
        );

        // fanout only after the commit; a lost event costs nothing,
        // the notifications are already durable
        for (account, notification) in events {
            self.hub
                .publish(&account, NotificationEvent::Posted(notification));
        }

        Ok(TransferReceipt {
            transfer_id,
            posting_id,
            kind,
            amount: spec.amount,
            counterparty: recipient.map(|r| r.moni_number),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn push_credit_leg(
        &self,
        batch: &mut WriteBatch,
        events: &mut Vec<(AccountKey, Notification)>,
        sender: &Account,
        recipient: &Account,
        credit_kind: TransferKind,
        transfer_id: TransferId,
        spec: &TransferSpec,
        now: chrono::DateTime<Utc>,
    ) {
        batch.adjust_balance(
            recipient.key.clone(),
            credit_kind.balance_delta(spec.amount),
        );

        let credit_posting = Posting {
            id: PostingId::new(),
            transfer_id,
            account: recipient.key.clone(),
            kind: credit_kind,
            amount: spec.amount,
            status: PostingStatus::Completed,
            display: DisplayData {
                title: format!("Received from {}", sender.display_name),
                description: spec
                    .message
                    .clone()
                    .unwrap_or_else(|| "Money received".to_string()),
                icon: "arrow-down-left".to_string(),
                color: "text-green-500".to_string(),
            },
            counterparty_name: Some(sender.display_name.clone()),
            counterparty_moni: Some(sender.moni_number.clone()),
            message: spec.message.clone(),
            reference: spec.reference.clone(),
            details: TransferDetails::None,
            created_at: now,
        };
        let credit_posting_id = credit_posting.id;
        batch.insert_posting(credit_posting);

        let amount_text = format_amount(spec.amount);
        let mut message = format!("{} sent you {}", sender.display_name, amount_text);
        if let Some(note) = &spec.message {
            message.push_str(": ");
            message.push_str(note);
        }
        let notification = Notification {
            id: NotificationId::new(),
            account: recipient.key.clone(),
            kind: if credit_kind == TransferKind::P2pReceive {
                NotificationKind::P2pReceived
            } else {
                NotificationKind::TransferReceived
            },
            title: format!("You received {amount_text}"),
            message,
            amount: Some(spec.amount),
            sender_name: Some(sender.display_name.clone()),
            sender_moni: Some(sender.moni_number.clone()),
            posting_id: Some(credit_posting_id),
            request_status: None,
            read: false,
            action_required: true,
            created_at: now,
        };
        batch.insert_notification(notification.clone());
        events.push((recipient.key.clone(), notification));
    }

    /// Confirmation notification the sender keeps for transfers with no
    /// counterparty wallet. `Ussd` records the posting only.
    fn self_notification(
        &self,
        sender: &Account,
        kind: TransferKind,
        spec: &TransferSpec,
        posting_id: PostingId,
        now: chrono::DateTime<Utc>,
    ) -> Option<Notification> {
        let amount_text = format_amount(spec.amount);
        let (notification_kind, title, message) = match (kind, &spec.details) {
            (TransferKind::Deposit, _) => (
                NotificationKind::DepositCompleted,
                "Deposit completed".to_string(),
                format!("You deposited {amount_text}"),
            ),
            (TransferKind::Withdraw, _) => (
                NotificationKind::WithdrawCompleted,
                "Withdrawal completed".to_string(),
                format!("You withdrew {amount_text}"),
            ),
            (TransferKind::Bill, TransferDetails::Bill { provider, .. }) => (
                NotificationKind::BillPaid,
                "Bill paid".to_string(),
                format!("You paid {amount_text} to {provider}"),
            ),
            _ => return None,
        };

        Some(Notification {
            id: NotificationId::new(),
            account: sender.key.clone(),
            kind: notification_kind,
            title,
            message,
            amount: Some(spec.amount),
            sender_name: None,
            sender_moni: None,
            posting_id: Some(posting_id),
            request_status: None,
            read: false,
            action_required: false,
            created_at: now,
        })
    }
}
