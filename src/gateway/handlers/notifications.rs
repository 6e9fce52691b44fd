//! Notification handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Extension;

use crate::core_types::NotificationId;
use crate::gateway::state::AppState;
use crate::gateway::types::{ok, ApiResult, NotificationData, NotificationListData};
use crate::gateway::Session;

/// `GET /notifications`: the caller's feed plus the unread badge count.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<NotificationListData> {
    let notifications = state
        .notifications
        .notifications_for(&session.account)
        .await?;
    let unread = notifications.iter().filter(|n| !n.read).count();
    ok(NotificationListData {
        notifications: notifications.into_iter().map(NotificationData::from).collect(),
        unread,
    })
}

/// `GET /notifications/unread`: unread entries only.
pub async fn list_unread(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<NotificationListData> {
    let notifications = state.notifications.unread_for(&session.account).await?;
    let unread = notifications.len();
    ok(NotificationListData {
        notifications: notifications.into_iter().map(NotificationData::from).collect(),
        unread,
    })
}

/// `POST /notifications/{id}/read`: mark one notification read.
///
/// One way and idempotent; repeating the call returns the same record.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<NotificationId>,
) -> ApiResult<NotificationData> {
    let updated = state.notifications.mark_read(&session.account, id).await?;
    ok(updated.into())
}
