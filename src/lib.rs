//! Moni Wallet Core - Funds Transfer and Notification Fanout
//!
//! A mobile-wallet backend in Rust: single-currency integer balances,
//! atomic multi-record transfers, and durable notifications with live
//! fanout to connected clients.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier newtypes (AccountKey, TransferId, ...)
//! - [`money`] - The string boundary for minor-unit amounts
//! - [`account`] - Wallet accounts, provisioning, recipient resolution
//! - [`store`] - Ledger store trait with memory and PostgreSQL backends
//! - [`transfer`] - Transfer engine: validation, batch commit, fanout
//! - [`requests`] - Peer-to-peer payment requests
//! - [`notify`] - Notification records, feed service, live event hub
//! - [`gateway`] - Axum HTTP/WebSocket boundary
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing setup

// Core types - must be first!
pub mod core_types;
pub mod money;

// Domain services
pub mod account;
pub mod notify;
pub mod requests;
pub mod store;
pub mod transfer;

// Infrastructure
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use account::{Account, AccountService, MoniNumber, Resolver};
pub use core_types::{AccountKey, MinorUnits, NotificationId, PostingId, TransferId};
pub use notify::{
    Notification, NotificationEvent, NotificationHub, NotificationService, RequestStatus,
};
pub use requests::{PaymentRequest, RequestLedger};
pub use store::{LedgerStore, MemoryStore, PgStore, StoreError, WriteBatch};
pub use transfer::{TransferEngine, TransferKind, TransferReceipt, TransferSpec};
