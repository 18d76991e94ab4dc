//! Parley gateway: HTTP front for [`parley_core::Gateway`].
//!
//! One route, `/api/chat`. `POST` runs a chat turn, `GET` reports health.
//! CORS is wide open so browser front ends on any origin can call it.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use parley_core::constants::endpoints;
use parley_core::{Gateway, GatewayError};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::CHAT_ROUTE, post(chat).get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Gateway listening on http://{}{}",
        listener.local_addr()?,
        endpoints::CHAT_ROUTE
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// `POST /api/chat`. A body that is not JSON is treated like one without
/// a messages array.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);

    match state.gateway.chat(&body).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /api/chat`.
pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.gateway.health().await;
    let status =
        StatusCode::from_u16(report.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report)).into_response()
}

fn error_response(e: GatewayError) -> Response {
    if e.status >= 500 {
        tracing::warn!(status = e.status, "Chat request failed: {}", e.message);
    } else {
        tracing::debug!(status = e.status, "Chat request rejected: {}", e.message);
    }

    let status = StatusCode::from_u16(e.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": e.message }))).into_response()
}
