//! Moni wallet service entry point.
//!
//! ```text
//! ┌─────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Gateway │────▶│   Services   │────▶│ LedgerStore  │
//! │ (axum)  │     │ (transfers,  │     │ (memory/PG)  │
//! └────┬────┘     │  requests)   │     └──────────────┘
//!      │          └──────┬───────┘
//!      │                 │ commit fanout
//!      └── live events ◀─┴── NotificationHub
//! ```
//!
//! One process serves the HTTP/WebSocket gateway; the store backend is
//! selected by `config/<env>.yaml`.

use std::sync::Arc;

use anyhow::Context;

use moni_wallet::config::AppConfig;
use moni_wallet::gateway::{run_server, AppState};
use moni_wallet::store::{LedgerStore, MemoryStore, PgStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env);
    let _log_guard = moni_wallet::logging::init_logging(&app_config);

    tracing::info!(env = %env, git_hash = env!("GIT_HASH"), "Starting Moni wallet service");
    println!("=== Moni Wallet Service ({env}) ===");

    let store: Arc<dyn LedgerStore> = match app_config.store.backend.as_str() {
        "postgres" => {
            let url = app_config
                .store
                .postgres_url
                .as_deref()
                .context("store.postgres_url is required for the postgres backend")?;
            let store = PgStore::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store
                .ensure_schema()
                .await
                .context("Failed to initialize wallet schema")?;
            println!("✅ PostgreSQL connected and schema initialized");
            Arc::new(store)
        }
        "memory" => {
            println!("⚠️  In-memory store: all data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        other => anyhow::bail!("Unknown store backend: {other}"),
    };

    let state = Arc::new(AppState::new(store));

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    run_server(state, &app_config.gateway.host, port).await;

    Ok(())
}
