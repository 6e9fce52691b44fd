//! Account handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::gateway::state::AppState;
use crate::gateway::types::{
    error_codes, ok, AccountData, ApiError, ApiResult, LookupData, ProvisionBody,
};
use crate::gateway::Session;
use crate::transfer::FALLBACK_DISPLAY_NAME;

/// `POST /account`: get-or-create the caller's wallet.
///
/// Idempotent; calling it again returns the existing account untouched,
/// matching the lazy provisioning the transfer path performs anyway.
pub async fn provision_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<ProvisionBody>,
) -> ApiResult<AccountData> {
    let name = body
        .display_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(FALLBACK_DISPLAY_NAME);
    let account = state.accounts.ensure(&session.account, name).await?;
    ok(account.into())
}

/// `GET /account`: the caller's wallet, when one exists.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<AccountData> {
    let account = state
        .accounts
        .account(&session.account)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(error_codes::WALLET_NOT_FOUND, "No wallet for this session")
        })?;
    ok(account.into())
}

/// `GET /lookup/{moni}`: public recipient preview.
///
/// Reveals display name and wallet number only; an unknown or malformed
/// number fails without leaking whether the key space is dense.
pub async fn lookup_wallet(
    State(state): State<Arc<AppState>>,
    Path(moni): Path<String>,
) -> ApiResult<LookupData> {
    let account = state.resolver.resolve(&moni).await?;
    ok(account.into())
}
