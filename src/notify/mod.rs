//! Notifications
//!
//! Durable notification records written in the same batch as the
//! postings they describe, the one-way read transition, and the
//! in-process hub that fans committed events out to live clients.

pub mod hub;
pub mod models;
pub mod service;

pub use hub::NotificationHub;
pub use models::{Notification, NotificationEvent, NotificationKind, RequestStatus};
pub use service::{NotificationError, NotificationService};
