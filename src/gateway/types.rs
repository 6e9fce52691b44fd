//! Gateway wire types
//!
//! Every handler returns the same `{code, msg, data}` envelope. Money
//! crosses this boundary as decimal strings in both directions; see
//! [`crate::money`] for the conversion rules.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountError, ResolveError};
use crate::core_types::{NotificationId, PostingId, TransferId};
use crate::money::{format_amount, format_amount_signed, parse_amount};
use crate::notify::{
    Notification, NotificationError, NotificationKind, RequestStatus,
};
use crate::requests::{PaymentRequest, RequestError};
use crate::store::StoreError;
use crate::transfer::{
    DisplayData, Posting, PostingStatus, TransferDetails, TransferError, TransferKind,
    TransferReceipt, TransferSpec,
};

// ============================================================
// Response envelope
// ============================================================

/// Unified API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Business status code (0 = success)
    pub code: i32,
    /// Human-readable message
    pub msg: String,
    /// Payload, omitted on errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Business status codes carried in the envelope.
pub mod error_codes {
    /// Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    /// Malformed or rejected input
    pub const INVALID_PARAMETER: i32 = 1001;
    /// Debit would push the balance below the floor
    pub const INSUFFICIENT_FUNDS: i32 = 1002;

    // Auth errors (2xxx)
    /// Session header missing or empty
    pub const MISSING_AUTH: i32 = 2001;

    // Resource errors (4xxx)
    /// No wallet behind the given key or number
    pub const WALLET_NOT_FOUND: i32 = 4001;
    /// Notification does not exist on this account's feed
    pub const NOTIFICATION_NOT_FOUND: i32 = 4002;
    /// Payment request does not exist on this account's feed
    pub const REQUEST_NOT_FOUND: i32 = 4003;
    /// Payment request was already accepted or rejected
    pub const REQUEST_ALREADY_RESOLVED: i32 = 4090;

    // Server errors (5xxx)
    /// Unexpected internal failure
    pub const INTERNAL_ERROR: i32 = 5000;
    /// Backing store unreachable
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

/// Handler error: HTTP status plus the envelope's business code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

/// What every handler returns.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap a payload in the success envelope.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            msg,
        )
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::MISSING_AUTH, msg)
    }

    pub fn not_found(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, self.msg));
        (self.status, body).into_response()
    }
}

// ============================================================
// Domain error -> wire error mapping
// ============================================================

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        if e.is_unavailable() {
            ApiError::unavailable(e.to_string())
        } else {
            ApiError::internal(e.to_string())
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let msg = e.to_string();
        match e {
            TransferError::Unauthenticated => ApiError::unauthorized(msg),
            TransferError::InsufficientFunds { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                error_codes::INSUFFICIENT_FUNDS,
                msg,
            ),
            TransferError::RecipientNotFound(_) => {
                ApiError::not_found(error_codes::WALLET_NOT_FOUND, msg)
            }
            TransferError::RequestConflict(_) => ApiError::new(
                StatusCode::CONFLICT,
                error_codes::REQUEST_ALREADY_RESOLVED,
                msg,
            ),
            TransferError::StoreUnavailable(_) => ApiError::unavailable(msg),
            TransferError::Store(_) => ApiError::internal(msg),
            // the remaining variants are all input validation
            _ => ApiError::bad_request(msg),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        let msg = e.to_string();
        match e {
            RequestError::Unauthenticated => ApiError::unauthorized(msg),
            RequestError::InvalidAmount | RequestError::InvalidWalletNumber(_) => {
                ApiError::bad_request(msg)
            }
            RequestError::WalletNotFound(_) => {
                ApiError::not_found(error_codes::WALLET_NOT_FOUND, msg)
            }
            RequestError::InsufficientFunds { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                error_codes::INSUFFICIENT_FUNDS,
                msg,
            ),
            RequestError::NotFound => ApiError::not_found(error_codes::REQUEST_NOT_FOUND, msg),
            RequestError::AlreadyResolved => ApiError::new(
                StatusCode::CONFLICT,
                error_codes::REQUEST_ALREADY_RESOLVED,
                msg,
            ),
            RequestError::StoreUnavailable(_) => ApiError::unavailable(msg),
            RequestError::Store(_) => ApiError::internal(msg),
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(e: NotificationError) -> Self {
        let msg = e.to_string();
        match e {
            NotificationError::NotFound => {
                ApiError::not_found(error_codes::NOTIFICATION_NOT_FOUND, msg)
            }
            NotificationError::StoreUnavailable(_) => ApiError::unavailable(msg),
            NotificationError::Store(_) => ApiError::internal(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(v) => ApiError::bad_request(v.to_string()),
            AccountError::Store(s) => s.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        let msg = e.to_string();
        match e {
            ResolveError::Invalid(_) => ApiError::bad_request(msg),
            ResolveError::RecipientNotFound(_) => {
                ApiError::not_found(error_codes::WALLET_NOT_FOUND, msg)
            }
            ResolveError::Store(s) => s.into(),
        }
    }
}

// ============================================================
// Request bodies
// ============================================================

/// Body of `POST /account`.
#[derive(Debug, Deserialize)]
pub struct ProvisionBody {
    pub display_name: Option<String>,
}

/// Body of `POST /transfers`.
///
/// `amount` is a decimal string; the parse is strict and signs are
/// rejected. `display` may be omitted, in which case a per-kind default
/// presentation block is filled in.
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub kind: TransferKind,
    pub amount: String,
    pub recipient: Option<String>,
    pub message: Option<String>,
    pub reference: Option<String>,
    #[serde(default)]
    pub details: TransferDetails,
    pub display: Option<DisplayData>,
}

impl TransferBody {
    pub fn into_spec(self) -> Result<TransferSpec, ApiError> {
        let amount =
            parse_amount(&self.amount).map_err(|e| ApiError::bad_request(e.to_string()))?;
        let display = self
            .display
            .unwrap_or_else(|| default_display(self.kind));
        Ok(TransferSpec {
            kind: self.kind,
            amount,
            recipient: self.recipient,
            message: self.message,
            reference: self.reference,
            details: self.details,
            display,
        })
    }
}

/// Presentation block used when the client does not send one.
fn default_display(kind: TransferKind) -> DisplayData {
    let (title, description, icon, color) = match kind {
        TransferKind::Deposit => (
            "Deposit",
            "Wallet deposit",
            "arrow-down-left",
            "text-green-500",
        ),
        TransferKind::Withdraw => ("Withdrawal", "Cash out", "arrow-up-right", "text-red-500"),
        TransferKind::Send => (
            "Transfer sent",
            "Wallet transfer",
            "arrow-up-right",
            "text-red-500",
        ),
        TransferKind::P2pSend => (
            "Payment sent",
            "Peer payment",
            "arrow-up-right",
            "text-red-500",
        ),
        TransferKind::Bill => ("Bill paid", "Bill payment", "receipt", "text-orange-500"),
        TransferKind::Ussd => ("USSD action", "USSD service", "hash", "text-blue-500"),
        // credit kinds are rejected upstream as not initiable; the
        // engine synthesizes their presentation itself
        TransferKind::Receive | TransferKind::P2pReceive => (
            "Received",
            "Money received",
            "arrow-down-left",
            "text-green-500",
        ),
    };
    DisplayData {
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
    }
}

/// Body of `POST /requests`.
#[derive(Debug, Deserialize)]
pub struct RequestBody {
    /// Wallet number of the account being asked to pay.
    pub payer: String,
    pub amount: String,
    pub message: Option<String>,
}

/// Query string of the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

// ============================================================
// Response payloads
// ============================================================

/// Full account view, returned only to the owner.
#[derive(Debug, Serialize)]
pub struct AccountData {
    pub account: String,
    pub display_name: String,
    pub moni_number: String,
    pub balance: String,
    pub linked_balance: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountData {
    fn from(a: Account) -> Self {
        Self {
            account: a.key.to_string(),
            display_name: a.display_name,
            moni_number: a.moni_number.to_string(),
            balance: format_amount_signed(a.balance),
            linked_balance: format_amount_signed(a.linked_balance),
            created_at: a.created_at,
        }
    }
}

/// What a recipient lookup reveals: name and number, nothing else.
#[derive(Debug, Serialize)]
pub struct LookupData {
    pub display_name: String,
    pub moni_number: String,
}

impl From<Account> for LookupData {
    fn from(a: Account) -> Self {
        Self {
            display_name: a.display_name,
            moni_number: a.moni_number.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptData {
    pub transfer_id: TransferId,
    pub posting_id: PostingId,
    pub kind: TransferKind,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl From<TransferReceipt> for ReceiptData {
    fn from(r: TransferReceipt) -> Self {
        Self {
            transfer_id: r.transfer_id,
            posting_id: r.posting_id,
            kind: r.kind,
            amount: format_amount(r.amount),
            counterparty: r.counterparty.map(|m| m.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostingData {
    pub id: PostingId,
    pub transfer_id: TransferId,
    pub kind: TransferKind,
    pub amount: String,
    pub status: PostingStatus,
    pub display: DisplayData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_moni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub details: TransferDetails,
    pub created_at: DateTime<Utc>,
}

impl From<Posting> for PostingData {
    fn from(p: Posting) -> Self {
        Self {
            id: p.id,
            transfer_id: p.transfer_id,
            kind: p.kind,
            amount: format_amount(p.amount),
            status: p.status,
            display: p.display,
            counterparty_name: p.counterparty_name,
            counterparty_moni: p.counterparty_moni.map(|m| m.into_string()),
            message: p.message,
            reference: p.reference,
            details: p.details,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationData {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_moni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_id: Option<PostingId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_status: Option<RequestStatus>,
    pub read: bool,
    pub action_required: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationData {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            amount: n.amount.map(format_amount),
            sender_name: n.sender_name,
            sender_moni: n.sender_moni.map(|m| m.into_string()),
            posting_id: n.posting_id,
            request_status: n.request_status,
            read: n.read,
            action_required: n.action_required,
            created_at: n.created_at,
        }
    }
}

/// Feed plus the unread badge count, served in one round trip.
#[derive(Debug, Serialize)]
pub struct NotificationListData {
    pub notifications: Vec<NotificationData>,
    pub unread: usize,
}

#[derive(Debug, Serialize)]
pub struct RequestData {
    pub id: NotificationId,
    pub requester_name: String,
    pub requester_moni: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRequest> for RequestData {
    fn from(r: PaymentRequest) -> Self {
        Self {
            id: r.id,
            requester_name: r.requester_name,
            requester_moni: r.requester_moni.into_string(),
            amount: format_amount(r.amount),
            message: r.message,
            status: r.status,
            created_at: r.created_at,
        }
    }
}
