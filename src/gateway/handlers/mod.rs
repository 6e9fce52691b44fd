//! HTTP handlers, grouped by resource.

pub mod accounts;
pub mod notifications;
pub mod requests;
pub mod transfers;
pub mod ws;

use serde::Serialize;

use super::types::{ok, ApiResult};

/// Liveness payload: service identity and build stamp.
#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
}

/// `GET /health`
pub async fn health_check() -> ApiResult<HealthData> {
    ok(HealthData {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
    })
}
