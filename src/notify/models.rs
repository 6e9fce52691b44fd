//! Notification records and live events

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::MoniNumber;
use crate::core_types::{AccountKey, MinorUnits, NotificationId, PostingId};

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "transfer-received")]
    TransferReceived,
    #[serde(rename = "p2p-received")]
    P2pReceived,
    #[serde(rename = "p2p-request")]
    P2pRequest,
    #[serde(rename = "deposit-completed")]
    DepositCompleted,
    #[serde(rename = "withdraw-completed")]
    WithdrawCompleted,
    #[serde(rename = "bill-paid")]
    BillPaid,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TransferReceived => "transfer-received",
            NotificationKind::P2pReceived => "p2p-received",
            NotificationKind::P2pRequest => "p2p-request",
            NotificationKind::DepositCompleted => "deposit-completed",
            NotificationKind::WithdrawCompleted => "withdraw-completed",
            NotificationKind::BillPaid => "bill-paid",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer-received" => Ok(NotificationKind::TransferReceived),
            "p2p-received" => Ok(NotificationKind::P2pReceived),
            "p2p-request" => Ok(NotificationKind::P2pRequest),
            "deposit-completed" => Ok(NotificationKind::DepositCompleted),
            "withdraw-completed" => Ok(NotificationKind::WithdrawCompleted),
            "bill-paid" => Ok(NotificationKind::BillPaid),
            _ => Err(format!("Invalid notification kind: {}", s)),
        }
    }
}

/// Lifecycle of a payment request, persisted on its notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

/// Durable in-app notification
///
/// `read` starts false and only ever flips to true. `request_status` is
/// present on `P2pRequest` records only and survives sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    /// Addressee account.
    pub account: AccountKey,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub amount: Option<MinorUnits>,
    pub sender_name: Option<String>,
    pub sender_moni: Option<MoniNumber>,
    /// Credit-side posting this notification announces, when there is one.
    pub posting_id: Option<PostingId>,
    pub request_status: Option<RequestStatus>,
    pub read: bool,
    pub action_required: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_pending_request(&self) -> bool {
        self.kind == NotificationKind::P2pRequest
            && self.request_status == Some(RequestStatus::Pending)
    }
}

/// Live event pushed to subscribers after a commit.
///
/// Best-effort: the committed record is the source of truth, the event
/// stream is only a hint to refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "notification", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A new notification was committed.
    Posted(Notification),
    /// An existing notification changed (read flag or request status).
    Updated(Notification),
}

impl NotificationEvent {
    pub fn notification(&self) -> &Notification {
        match self {
            NotificationEvent::Posted(n) | NotificationEvent::Updated(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> Notification {
        Notification {
            id: NotificationId::new(),
            account: AccountKey::new("payer-1"),
            kind: NotificationKind::P2pRequest,
            title: "Payment request".into(),
            message: "Fatou requests 500.00".into(),
            amount: Some(50_000),
            sender_name: Some("Fatou Ndiaye".into()),
            sender_moni: Some(MoniNumber::from_sequence(1)),
            posting_id: None,
            request_status: Some(RequestStatus::Pending),
            read: false,
            action_required: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_request_detection() {
        let mut n = sample_request();
        assert!(n.is_pending_request());

        n.request_status = Some(RequestStatus::Accepted);
        assert!(!n.is_pending_request());

        n.kind = NotificationKind::TransferReceived;
        n.request_status = None;
        assert!(!n.is_pending_request());
    }

    #[test]
    fn kind_strings_roundtrip() {
        for kind in [
            NotificationKind::TransferReceived,
            NotificationKind::P2pReceived,
            NotificationKind::P2pRequest,
            NotificationKind::DepositCompleted,
            NotificationKind::WithdrawCompleted,
            NotificationKind::BillPaid,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn events_tag_their_variant() {
        let event = NotificationEvent::Posted(sample_request());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "posted");
        assert_eq!(json["notification"]["kind"], "p2p-request");
        assert_eq!(json["notification"]["read"], false);
    }
}
