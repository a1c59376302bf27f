//! Webhook HTTP surface (axum): `POST {WEBHOOK_PATH}` dispatches, `GET /health` reports.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::runner::BotApp;

pub const HEALTH_PATH: &str = "/health";

pub fn router(app: Arc<BotApp>) -> Router {
    let webhook_path = app.config().webhook_path.clone();
    Router::new()
        .route(&webhook_path, post(webhook))
        .route(HEALTH_PATH, get(health))
        .with_state(app)
}

/// Always answers 200 once the payload parses; handler failures never reach the platform.
async fn webhook(State(app): State<Arc<BotApp>>, body: Bytes) -> (StatusCode, &'static str) {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected webhook body");
            return (StatusCode::BAD_REQUEST, "invalid payload");
        }
    };

    match app.handle_payload(payload).await {
        Ok(outcome) => {
            debug!(outcome = ?outcome, "webhook handled");
            (StatusCode::OK, "ok")
        }
        Err(e) => {
            warn!(error = %e, "Rejected webhook payload");
            (StatusCode::BAD_REQUEST, "invalid payload")
        }
    }
}

async fn health(State(app): State<Arc<BotApp>>) -> Json<Value> {
    Json(json!({ "status": "ok", "bot_id": app.config().bot_id }))
}

/// Serves until `shutdown` resolves.
pub async fn serve<S>(app: Arc<BotApp>, listener: TcpListener, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Listener has no address")?;
    info!(addr = %addr, webhook_path = %app.config().webhook_path, "Webhook server listening");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Webhook server stopped");
    Ok(())
}

/// Resolves on Ctrl-C. If the signal cannot be installed, never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
