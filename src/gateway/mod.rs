//! HTTP gateway
//!
//! Thin boundary over the wallet services: handlers translate between
//! wire DTOs and domain calls, and every response uses the same
//! `{code, msg, data}` envelope.
//!
//! Routes are split into a public group (no session) and a private group
//! where [`session_middleware`] requires the session header and inserts
//! a [`Session`] extension for the handlers.

pub mod handlers;
pub mod state;
pub mod types;

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::core_types::AccountKey;

pub use state::AppState;
pub use types::{ApiError, ApiResponse, ApiResult};

/// Header carrying the opaque session account key.
///
/// Upstream authentication terminates before this service; by the time
/// a request arrives here the header value is a trusted internal key,
/// never raw user input.
pub const SESSION_HEADER: &str = "x-moni-account";

/// Authenticated session, inserted by [`session_middleware`].
#[derive(Debug, Clone)]
pub struct Session {
    pub account: AccountKey,
}

/// Require the session header on every private route.
///
/// A missing or empty header is rejected with 401 before any handler
/// runs, so handlers can rely on a non-empty [`Session`].
pub async fn session_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let account = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::unauthorized(format!("Missing {SESSION_HEADER} header")))?;

    let session = Session {
        account: AccountKey::new(account),
    };
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Assemble the full route tree.
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==================== Public Routes ====================
    let public_routes =
        Router::new().route("/lookup/{moni}", get(handlers::accounts::lookup_wallet));

    // ==================== Private Routes (session required) ====================
    let private_routes = Router::new()
        // account
        .route(
            "/account",
            get(handlers::accounts::get_account).post(handlers::accounts::provision_account),
        )
        // transfers
        .route(
            "/transfers",
            post(handlers::transfers::create_transfer).get(handlers::transfers::list_transfers),
        )
        // payment requests
        .route(
            "/requests",
            post(handlers::requests::create_request).get(handlers::requests::list_requests),
        )
        .route(
            "/requests/{id}/accept",
            post(handlers::requests::accept_request),
        )
        .route(
            "/requests/{id}/reject",
            post(handlers::requests::reject_request),
        )
        // notifications
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/unread",
            get(handlers::notifications::list_unread),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notifications::mark_read),
        )
        // live stream
        .route("/ws", get(handlers::ws::notification_stream))
        .layer(middleware::from_fn(session_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/public", public_routes)
        .nest("/api/v1/private", private_routes)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run_server(state: Arc<AppState>, host: &str, port: u16) {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("❌ Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    println!("🚀 Wallet gateway listening on http://{addr}");
    println!("   ❤️  Health : http://{addr}/api/v1/health");
    println!("   🌐 Public : http://{addr}/api/v1/public");
    println!("   🔒 Private: http://{addr}/api/v1/private  (requires {SESSION_HEADER} header)");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {e}");
        std::process::exit(1);
    }
}
