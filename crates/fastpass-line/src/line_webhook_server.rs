//! HTTP surface that receives LINE webhook deliveries.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fastpass_dispatch::Dispatcher;
use futures_util::future::join_all;
use serde_json::json;
use tokio::net::TcpListener;

use crate::line_signature::{verify_line_signature, LINE_SIGNATURE_HEADER};
use crate::line_webhook_payload::parse_line_webhook_body;

pub const LINE_WEBHOOK_PATH: &str = "/callback";
pub const DEFAULT_LINE_WEBHOOK_BIND: &str = "0.0.0.0:5001";

#[derive(Debug, Clone)]
pub struct LineWebhookConfig {
    pub bind: String,
    pub channel_secret: String,
}

pub struct LineWebhookState {
    channel_secret: String,
    dispatcher: Dispatcher,
}

impl LineWebhookState {
    pub fn new(channel_secret: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            dispatcher,
        }
    }
}

pub fn build_line_webhook_router(state: Arc<LineWebhookState>) -> Router {
    Router::new()
        .route(LINE_WEBHOOK_PATH, post(handle_line_webhook))
        .route("/healthz", get(handle_webhook_health))
        .with_state(state)
}

/// Binds `config.bind` and serves webhooks until ctrl-c.
pub async fn run_line_webhook_server(
    config: LineWebhookConfig,
    dispatcher: Dispatcher,
) -> Result<()> {
    let listener = TcpListener::bind(config.bind.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve line webhook bound address")?;
    tracing::info!(addr = %local_addr, path = LINE_WEBHOOK_PATH, "line webhook server listening");

    let state = Arc::new(LineWebhookState::new(config.channel_secret, dispatcher));
    let app = build_line_webhook_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("line webhook server exited unexpectedly")?;
    Ok(())
}

async fn handle_webhook_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

async fn handle_line_webhook(
    State(state): State<Arc<LineWebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(LINE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if let Err(error) = verify_line_signature(&body, signature, &state.channel_secret) {
        tracing::warn!(reason_code = "invalid_signature", error = %error, "rejected line webhook");
        return (
            StatusCode::BAD_REQUEST,
            Json(
                json!({"error":{"code":"invalid_signature","message":"line webhook signature verification failed"}}),
            ),
        )
            .into_response();
    }

    let parsed = match parse_line_webhook_body(&body) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(reason_code = "parse_failed", error = %format!("{error:#}"), "rejected line webhook");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error":{"code":"parse_failed","message":"invalid line webhook payload"}})),
            )
                .into_response();
        }
    };
    if parsed.ignored > 0 {
        tracing::debug!(ignored = parsed.ignored, "skipped unsupported line events");
    }

    // Events of one delivery run concurrently; each touches only its own sender's state.
    let reports = join_all(parsed.events.into_iter().map(|event| {
        tracing::debug!(
            user_id = %event.sender(),
            event_kind = event.kind(),
            "line event accepted"
        );
        state.dispatcher.handle_event(event)
    }))
    .await;
    tracing::debug!(events = reports.len(), "line webhook delivery handled");

    (StatusCode::OK, "OK").into_response()
}
