//! Funds transfers
//!
//! Implements the wallet's movement-of-money core. Every transfer is
//! one atomic batch against the ledger store:
//!
//! ```text
//! validate → ensure sender → floor check → resolve recipient
//!     → [debit posting, balance deltas, credit posting,
//!        notification, request status CAS] → commit → fanout
//! ```
//!
//! # Invariants
//!
//! 1. **Validate-Before-Write**: every rejection happens before the
//!    batch is built; a failed transfer leaves no trace.
//! 2. **One Batch**: postings, balance adjustments, notifications, and
//!    request settlement commit together or not at all.
//! 3. **No Idempotency Key**: resubmitting an identical spec moves the
//!    money again; callers reconcile against history after a timeout.

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use engine::{TransferEngine, DEFAULT_HISTORY_LIMIT, FALLBACK_DISPLAY_NAME};
pub use error::TransferError;
pub use types::{
    DisplayData, Posting, PostingStatus, TransferDetails, TransferKind, TransferReceipt,
    TransferSpec,
};
