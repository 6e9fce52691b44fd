//! Payment request handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use tracing::info;

use crate::core_types::NotificationId;
use crate::gateway::state::AppState;
use crate::gateway::types::{ok, ApiError, ApiResult, ReceiptData, RequestBody, RequestData};
use crate::gateway::Session;
use crate::money::parse_amount;

/// `POST /requests`: ask another wallet for money.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<RequestBody>,
) -> ApiResult<RequestData> {
    let amount = parse_amount(&body.amount).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let request = state
        .requests
        .create_request(&session.account, &body.payer, amount, body.message)
        .await?;
    ok(request.into())
}

/// `GET /requests`: requests on the caller's feed, most recent first.
/// Every status is included; clients filter on `status` for the
/// pending-only view.
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Vec<RequestData>> {
    let requests = state.requests.incoming_requests(&session.account).await?;
    ok(requests.into_iter().map(RequestData::from).collect())
}

/// `POST /requests/{id}/accept`: pay a pending request.
///
/// Settlement and payment commit in one batch, so a request can be paid
/// at most once; the loser of a race gets a conflict.
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<NotificationId>,
) -> ApiResult<ReceiptData> {
    let receipt = state.requests.accept(&session.account, id).await?;
    info!(request = %id, payer = %session.account, "request accepted over http");
    ok(receipt.into())
}

/// `POST /requests/{id}/reject`: decline a pending request.
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<NotificationId>,
) -> ApiResult<RequestData> {
    let request = state.requests.reject(&session.account, id).await?;
    ok(request.into())
}
