//! Live notification stream
//!
//! One WebSocket per session, carrying the account's notification events
//! as JSON text frames. The stream is a refresh hint, not a source of
//! truth: committed records always win, and a lagging client is cut off
//! so it reloads over HTTP instead of acting on a gapped stream.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::Extension;
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::gateway::state::AppState;
use crate::gateway::Session;

/// First frame on every stream, confirming which feed is attached.
#[derive(Debug, Serialize)]
struct ConnectedFrame<'a> {
    event: &'static str,
    account: &'a str,
}

/// `GET /ws`: upgrade and stream the session's notification events.
pub async fn notification_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let mut events = state.hub.subscribe(&session.account);
    let (mut sender, mut receiver) = socket.split();
    let account = session.account.clone();

    debug!(account = %account, "notification stream opened");

    let welcome = ConnectedFrame {
        event: "connected",
        account: account.as_str(),
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    // Forward committed events to the socket
    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to encode notification event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    // the client has already missed events; force a resync
                    warn!(skipped, "notification stream lagged, closing");
                    break;
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Drain the client side until it closes
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    debug!(account = %account, "notification stream closed");
}
