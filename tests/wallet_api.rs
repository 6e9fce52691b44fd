//! End-to-end tests over the HTTP gateway.
//!
//! Each test builds the full router on a fresh in-memory store and talks
//! to it the way a client would: session header, JSON bodies, amounts as
//! decimal strings.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt; // for collecting body
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

use moni_wallet::gateway::{build_router, AppState, SESSION_HEADER};
use moni_wallet::store::MemoryStore;

fn test_app() -> Router {
    let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));
    build_router(state)
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(account) = session {
        builder = builder.header(SESSION_HEADER, account);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(account) = session {
        builder = builder.header(SESSION_HEADER, account);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Provision a wallet and return its `data` payload.
async fn provision(app: &Router, account: &str, name: &str) -> Value {
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/account",
            Some(account),
            json!({ "display_name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Fund a wallet through the deposit endpoint.
async fn deposit(app: &Router, account: &str, amount: &str) {
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/transfers",
            Some(account),
            json!({
                "kind": "deposit",
                "amount": amount,
                "details": {
                    "type": "mobile_money",
                    "operator": "Orange Money",
                    "phone": "+221770000000"
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn balance_of(app: &Router, account: &str) -> String {
    let response = app
        .clone()
        .oneshot(get("/api/v1/private/account", Some(account)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["balance"]
        .as_str()
        .unwrap()
        .to_string()
}

// ==================== Health and Auth ====================

#[tokio::test]
async fn health_reports_service_identity() {
    let app = test_app();

    let response = app.oneshot(get("/api/v1/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["service"], "moni_wallet");
}

#[tokio::test]
async fn private_routes_require_the_session_header() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(get("/api/v1/private/account", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], 2001);

    // a present-but-blank header is just as unauthenticated
    let response = app
        .oneshot(get("/api/v1/private/account", Some("  ")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ==================== Accounts ====================

#[tokio::test]
async fn provisioning_is_idempotent_and_lookup_is_public() {
    let app = test_app();

    let created = provision(&app, "user-alice", "Alice Diallo").await;
    let moni = created["moni_number"].as_str().unwrap().to_string();
    assert!(moni.starts_with("MN1000"));
    assert_eq!(created["balance"], "0.00");

    // provisioning again returns the same wallet untouched
    let again = provision(&app, "user-alice", "Someone Else").await;
    assert_eq!(again["moni_number"], moni.as_str());
    assert_eq!(again["display_name"], "Alice Diallo");

    // the public lookup reveals name and number only
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/public/lookup/{moni}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["display_name"], "Alice Diallo");
    assert_eq!(body["data"]["moni_number"], moni.as_str());
    assert!(body["data"].get("balance").is_none());

    // unknown number fails closed, malformed is rejected as input
    let response = app
        .clone()
        .oneshot(get("/api/v1/public/lookup/MN9999999", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 4001);

    let response = app
        .oneshot(get("/api/v1/public/lookup/bogus", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], 1001);
}

// ==================== Transfers ====================

#[tokio::test]
async fn transfer_moves_money_and_feeds_both_parties() {
    let app = test_app();

    provision(&app, "user-alice", "Alice Diallo").await;
    deposit(&app, "user-alice", "100.00").await;
    let bob = provision(&app, "user-bob", "Bob Sow").await;
    let bob_moni = bob["moni_number"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/transfers",
            Some("user-alice"),
            json!({
                "kind": "send",
                "amount": "40.00",
                "recipient": bob_moni,
                "message": "lunch"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["code"], 0);
    assert_eq!(receipt["data"]["kind"], "send");
    assert_eq!(receipt["data"]["amount"], "40.00");
    assert_eq!(receipt["data"]["counterparty"], bob_moni.as_str());

    assert_eq!(balance_of(&app, "user-alice").await, "60.00");
    assert_eq!(balance_of(&app, "user-bob").await, "40.00");

    // sender history: the send on top, the deposit under it
    let response = app
        .clone()
        .oneshot(get("/api/v1/private/transfers", Some("user-alice")))
        .await
        .unwrap();
    let history = body_json(response).await;
    let postings = history["data"].as_array().unwrap();
    assert_eq!(postings.len(), 2);
    assert_eq!(postings[0]["kind"], "send");
    assert_eq!(postings[0]["counterparty_name"], "Bob Sow");
    assert_eq!(postings[1]["kind"], "deposit");

    // recipient history: one credit posting joined by transfer id
    let response = app
        .clone()
        .oneshot(get("/api/v1/private/transfers", Some("user-bob")))
        .await
        .unwrap();
    let history = body_json(response).await;
    let postings = history["data"].as_array().unwrap();
    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0]["kind"], "receive");
    assert_eq!(postings[0]["amount"], "40.00");
    assert_eq!(postings[0]["transfer_id"], receipt["data"]["transfer_id"]);

    // recipient notification, then mark it read
    let response = app
        .clone()
        .oneshot(get("/api/v1/private/notifications", Some("user-bob")))
        .await
        .unwrap();
    let feed = body_json(response).await;
    assert_eq!(feed["data"]["unread"], 1);
    let notification = &feed["data"]["notifications"][0];
    assert_eq!(notification["kind"], "transfer-received");
    assert_eq!(notification["title"], "You received 40.00");
    assert_eq!(notification["message"], "Alice Diallo sent you 40.00: lunch");
    assert_eq!(notification["action_required"], true);
    let notification_id = notification["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/private/notifications/{notification_id}/read"),
            Some("user-bob"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["read"], true);
    assert_eq!(updated["data"]["action_required"], false);

    let response = app
        .oneshot(get("/api/v1/private/notifications", Some("user-bob")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["unread"], 0);
}

#[tokio::test]
async fn bad_amounts_shallow_pockets_and_ghosts_are_rejected() {
    let app = test_app();

    provision(&app, "user-alice", "Alice Diallo").await;
    let bob = provision(&app, "user-bob", "Bob Sow").await;
    let bob_moni = bob["moni_number"].as_str().unwrap().to_string();

    // malformed and zero amounts never reach the ledger
    for bad in ["abc", "0", "-5", "1.005"] {
        let response = app
            .clone()
            .oneshot(post(
                "/api/v1/private/transfers",
                Some("user-alice"),
                json!({ "kind": "deposit", "amount": bad }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "amount {bad:?}");
        assert_eq!(body_json(response).await["code"], 1001);
    }

    // the floor check fires before recipient resolution
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/transfers",
            Some("user-alice"),
            json!({ "kind": "send", "amount": "10.00", "recipient": bob_moni }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], 1002);

    // funded sender, unknown recipient
    deposit(&app, "user-alice", "50.00").await;
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/transfers",
            Some("user-alice"),
            json!({ "kind": "send", "amount": "10.00", "recipient": "MN9999999" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 4001);

    // nothing above moved money
    assert_eq!(balance_of(&app, "user-alice").await, "50.00");
}

// ==================== Payment Requests ====================

#[tokio::test]
async fn request_lifecycle_over_http() {
    let app = test_app();

    let moussa_moni = provision(&app, "user-moussa", "Moussa Ba").await["moni_number"]
        .as_str()
        .unwrap()
        .to_string();
    deposit(&app, "user-moussa", "50.00").await;
    provision(&app, "user-fatou", "Fatou Ndiaye").await;

    // fatou asks moussa for lunch money
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/requests",
            Some("user-fatou"),
            json!({ "payer": moussa_moni, "amount": "25.00", "message": "Lunch" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["data"]["status"], "pending");
    assert_eq!(created["data"]["amount"], "25.00");
    let request_id = created["data"]["id"].as_str().unwrap().to_string();

    // the request sits on the payer's feed
    let response = app
        .clone()
        .oneshot(get("/api/v1/private/requests", Some("user-moussa")))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed["data"][0]["requester_name"], "Fatou Ndiaye");
    assert_eq!(listed["data"][0]["status"], "pending");

    // accept pays the requester and settles the request
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/private/requests/{request_id}/accept"),
            Some("user-moussa"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["amount"], "25.00");

    assert_eq!(balance_of(&app, "user-moussa").await, "25.00");
    assert_eq!(balance_of(&app, "user-fatou").await, "25.00");

    // a second accept finds the request settled
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/private/requests/{request_id}/accept"),
            Some("user-moussa"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], 4090);
    assert_eq!(balance_of(&app, "user-moussa").await, "25.00");

    // the requester was notified with the forwarded note
    let response = app
        .oneshot(get("/api/v1/private/notifications", Some("user-fatou")))
        .await
        .unwrap();
    let feed = body_json(response).await;
    let kinds: Vec<&str> = feed["data"]["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"p2p-received"));
}

#[tokio::test]
async fn rejecting_a_request_needs_no_funds_and_sticks() {
    let app = test_app();

    let awa_moni = provision(&app, "user-awa", "Awa Fall").await["moni_number"]
        .as_str()
        .unwrap()
        .to_string();
    provision(&app, "user-binta", "Binta Diop").await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/requests",
            Some("user-binta"),
            json!({ "payer": awa_moni, "amount": "10.00" }),
        ))
        .await
        .unwrap();
    let request_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // awa has nothing; rejecting works anyway
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/private/requests/{request_id}/reject"),
            Some("user-awa"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "rejected");

    // a rejected request cannot be accepted afterwards
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/private/requests/{request_id}/accept"),
            Some("user-awa"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(balance_of(&app, "user-awa").await, "0.00");
    assert_eq!(balance_of(&app, "user-binta").await, "0.00");
}

#[tokio::test]
async fn requests_validate_payer_and_amount() {
    let app = test_app();
    provision(&app, "user-binta", "Binta Diop").await;

    // unknown payer wallet
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/requests",
            Some("user-binta"),
            json!({ "payer": "MN9999999", "amount": "10.00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 4001);

    // malformed payer wallet number
    let response = app
        .oneshot(post(
            "/api/v1/private/requests",
            Some("user-binta"),
            json!({ "payer": "not-a-moni", "amount": "10.00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], 1001);
}

// ==================== Notifications ====================

#[tokio::test]
async fn notifications_are_invisible_to_other_sessions() {
    let app = test_app();

    provision(&app, "user-alice", "Alice Diallo").await;
    deposit(&app, "user-alice", "20.00").await;
    let bob_moni = provision(&app, "user-bob", "Bob Sow").await["moni_number"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/private/transfers",
            Some("user-alice"),
            json!({ "kind": "send", "amount": "5.00", "recipient": bob_moni }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/v1/private/notifications/unread", Some("user-bob")))
        .await
        .unwrap();
    let feed = body_json(response).await;
    assert_eq!(feed["data"]["unread"], 1);
    let notification_id = feed["data"]["notifications"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // another session cannot read bob's notification, or even learn it exists
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/private/notifications/{notification_id}/read"),
            Some("user-mallory"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 4002);

    // bob's unread feed is untouched
    let response = app
        .oneshot(get("/api/v1/private/notifications/unread", Some("user-bob")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["unread"], 1);
}
