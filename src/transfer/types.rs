//! Transfer Core Types
//!
//! The closed set of transfer kinds, the per-kind details union, and the
//! posting record every transfer commits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::MoniNumber;
use crate::core_types::{AccountKey, MinorUnits, PostingId, TransferId};

/// Transfer kind
///
/// `Receive` and `P2pReceive` are the credit-side kinds the engine writes
/// for the recipient; callers can never request them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    #[serde(rename = "deposit")]
    Deposit,
    #[serde(rename = "withdraw")]
    Withdraw,
    #[serde(rename = "send")]
    Send,
    #[serde(rename = "receive")]
    Receive,
    #[serde(rename = "p2p-send")]
    P2pSend,
    #[serde(rename = "p2p-receive")]
    P2pReceive,
    #[serde(rename = "bill")]
    Bill,
    #[serde(rename = "ussd")]
    Ussd,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Deposit => "deposit",
            TransferKind::Withdraw => "withdraw",
            TransferKind::Send => "send",
            TransferKind::Receive => "receive",
            TransferKind::P2pSend => "p2p-send",
            TransferKind::P2pReceive => "p2p-receive",
            TransferKind::Bill => "bill",
            TransferKind::Ussd => "ussd",
        }
    }

    /// Kinds a caller may request. Credit-side kinds are engine-internal.
    pub fn is_initiable(&self) -> bool {
        !matches!(self, TransferKind::Receive | TransferKind::P2pReceive)
    }

    /// Kinds that debit the acting account and are subject to the
    /// balance floor check.
    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            TransferKind::Withdraw | TransferKind::Send | TransferKind::P2pSend | TransferKind::Bill
        )
    }

    /// Kinds that move money to another wallet and therefore need a
    /// recipient identifier.
    pub fn requires_recipient(&self) -> bool {
        matches!(self, TransferKind::Send | TransferKind::P2pSend)
    }

    /// Signed effect on the owning account's balance.
    ///
    /// `Ussd` has no entry in the delta table: the posting records the
    /// action, the balance is untouched.
    pub fn balance_delta(&self, amount: MinorUnits) -> i64 {
        let signed = amount as i64;
        match self {
            TransferKind::Deposit | TransferKind::Receive | TransferKind::P2pReceive => signed,
            TransferKind::Withdraw
            | TransferKind::Send
            | TransferKind::P2pSend
            | TransferKind::Bill => -signed,
            TransferKind::Ussd => 0,
        }
    }

    /// Credit-side kind written for the recipient of a wallet-to-wallet
    /// transfer.
    pub fn credit_counterpart(&self) -> Option<TransferKind> {
        match self {
            TransferKind::Send => Some(TransferKind::Receive),
            TransferKind::P2pSend => Some(TransferKind::P2pReceive),
            _ => None,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransferKind::Deposit),
            "withdraw" => Ok(TransferKind::Withdraw),
            "send" => Ok(TransferKind::Send),
            "receive" => Ok(TransferKind::Receive),
            "p2p-send" => Ok(TransferKind::P2pSend),
            "p2p-receive" => Ok(TransferKind::P2pReceive),
            "bill" => Ok(TransferKind::Bill),
            "ussd" => Ok(TransferKind::Ussd),
            _ => Err(format!("Invalid transfer kind: {}", s)),
        }
    }
}

/// Posting status
///
/// The engine only ever writes `Completed`; the other states exist for
/// records imported from pending external rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Pending,
    Completed,
    Failed,
}

impl PostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Pending => "pending",
            PostingStatus::Completed => "completed",
            PostingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PostingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PostingStatus::Pending),
            "completed" => Ok(PostingStatus::Completed),
            "failed" => Ok(PostingStatus::Failed),
            _ => Err(format!("Invalid posting status: {}", s)),
        }
    }
}

/// Kind-specific transfer details
///
/// A closed union instead of a free-form metadata bag; the engine rejects
/// a details payload that does not belong to the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferDetails {
    #[default]
    None,
    /// Deposit over mobile-money rails
    MobileMoney { operator: String, phone: String },
    /// Deposit handed to an agent
    Agent { phone: String },
    /// Bill payment
    Bill {
        provider: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due_date: Option<String>,
    },
    /// USSD-initiated action
    Ussd { code: String },
}

impl TransferDetails {
    /// Whether this payload is acceptable for `kind`.
    pub fn permits(&self, kind: TransferKind) -> bool {
        match self {
            TransferDetails::None => !matches!(kind, TransferKind::Bill | TransferKind::Ussd),
            TransferDetails::MobileMoney { .. } | TransferDetails::Agent { .. } => {
                kind == TransferKind::Deposit
            }
            TransferDetails::Bill { .. } => kind == TransferKind::Bill,
            TransferDetails::Ussd { .. } => kind == TransferKind::Ussd,
        }
    }
}

/// Caller-supplied presentation block, stored verbatim on the posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayData {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

/// A transfer as requested by the caller.
#[derive(Debug, Clone)]
pub struct TransferSpec {
    pub kind: TransferKind,
    pub amount: MinorUnits,
    /// Raw recipient wallet number; resolved (and re-validated) by the
    /// engine for the send kinds.
    pub recipient: Option<String>,
    pub message: Option<String>,
    /// Caller reference, stored verbatim. Not a deduplication key.
    pub reference: Option<String>,
    pub details: TransferDetails,
    pub display: DisplayData,
}

/// Per-party transaction record.
#[derive(Debug, Clone)]
pub struct Posting {
    pub id: PostingId,
    pub transfer_id: TransferId,
    pub account: AccountKey,
    pub kind: TransferKind,
    pub amount: MinorUnits,
    pub status: PostingStatus,
    pub display: DisplayData,
    pub counterparty_name: Option<String>,
    pub counterparty_moni: Option<MoniNumber>,
    pub message: Option<String>,
    pub reference: Option<String>,
    pub details: TransferDetails,
    pub created_at: DateTime<Utc>,
}

/// What the caller gets back after a committed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transfer_id: TransferId,
    /// The sender-side posting.
    pub posting_id: PostingId,
    pub kind: TransferKind,
    pub amount: MinorUnits,
    pub counterparty: Option<MoniNumber>,
}
