//! Transfer handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use tracing::info;

use crate::gateway::state::AppState;
use crate::gateway::types::{ok, ApiResult, ListQuery, PostingData, ReceiptData, TransferBody};
use crate::gateway::Session;
use crate::transfer::DEFAULT_HISTORY_LIMIT;

/// `POST /transfers`: validate and commit a transfer.
///
/// No idempotency key: resubmitting the same body moves money again. A
/// client that times out must reconcile against `GET /transfers` before
/// retrying.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<TransferBody>,
) -> ApiResult<ReceiptData> {
    let spec = body.into_spec()?;
    info!(
        account = %session.account,
        kind = %spec.kind,
        amount = spec.amount,
        "transfer requested"
    );
    let receipt = state
        .engine
        .perform_transfer(&session.account, spec)
        .await?;
    ok(receipt.into())
}

/// `GET /transfers`: the caller's postings, most recent first.
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<PostingData>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let postings = state.engine.history(&session.account, limit).await?;
    ok(postings.into_iter().map(PostingData::from).collect())
}
