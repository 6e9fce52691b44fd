//! Wallet accounts
//!
//! Account records, wallet number validation, lazy provisioning, and
//! recipient resolution.

pub mod models;
pub mod resolver;
pub mod service;
pub mod validation;

pub use models::Account;
pub use resolver::{ResolveError, Resolver};
pub use service::{AccountError, AccountService};
pub use validation::{MoniNumber, ValidationError, MONI_PREFIX};
