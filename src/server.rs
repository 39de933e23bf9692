//! Webhook HTTP surface.
//!
//! One POST route for registry change notifications plus a liveness
//! endpoint. Requests are stateless and independent; per-subject
//! serialization lives in [`crate::state::SubjectLocks`].

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::state::AppState;
use crate::webhook::WebhookProcessor;
use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

const WEBHOOK_PATH: &str = "/webhooks/registry";
const SIGNATURE_HEADER: &str = "webhook-signature";

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run_server(config: SyncConfig) -> Result<()> {
    let bind_addr = config.http_bind_address;
    let state = Arc::new(AppState::new(config));
    let router = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, path = WEBHOOK_PATH, "listening for webhooks");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let processor = WebhookProcessor::new(state);
    match processor.handle(&body, signature).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(SyncError::SignatureInvalid) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid signature" })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(category = err.category(), %err, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
        .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
