//! System endpoints: health check and public storefront settings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    store: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, active store backend, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: state.store_backend.to_string(),
        }),
    )
}

/// Storefront settings visible to the dashboard. The token is never echoed.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorefrontInfo {
    store_domain: Option<String>,
    configured: bool,
}

/// `GET /config/storefront`: Public storefront settings.
#[utoipa::path(
    get,
    path = "/config/storefront",
    tag = "System",
    summary = "Storefront settings",
    responses(
        (status = 200, description = "Storefront domain and whether a token is set", body = StorefrontInfo),
    )
)]
pub async fn storefront_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StorefrontInfo {
        store_domain: state.storefront.store_domain.clone(),
        configured: state.storefront.is_configured(),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/storefront", get(storefront_handler))
}
