//! Alert handlers: active list, history, resolve.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    AlertHistoryParams, AlertHistoryResponse, AlertListParams, AlertListResponse,
    ResolveAlertRequest, ResolveAlertResponse,
};
use crate::app_state::AppState;
use crate::domain::alert::{alert_count, critical_alert_count};
use crate::error::{ErrorResponse, MonitorError};
use crate::monitor::view::AlertRow;
use crate::service::SeverityFilter;

/// `GET /alerts`: Unresolved alerts.
///
/// # Errors
///
/// Returns [`MonitorError::InvalidFilter`] for an unknown severity, or
/// [`MonitorError::Store`] when the read fails.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    tag = "Alerts",
    summary = "List active alerts",
    params(AlertListParams),
    responses(
        (status = 200, description = "Unresolved alerts", body = AlertListResponse),
        (status = 400, description = "Unknown severity filter", body = ErrorResponse),
    )
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertListParams>,
) -> Result<Json<AlertListResponse>, MonitorError> {
    let severity = params
        .severity
        .as_deref()
        .map_or(Ok(SeverityFilter::All), SeverityFilter::parse)?;
    let alerts = state.repository.fetch_active_alerts(severity).await?;
    let now = Utc::now();
    Ok(Json(AlertListResponse {
        alert_count: alert_count(&alerts),
        critical_alert_count: critical_alert_count(&alerts),
        data: alerts.iter().map(|a| AlertRow::from_record(a, now)).collect(),
    }))
}

/// `GET /alerts/history`: Recent alerts, resolved or not.
///
/// # Errors
///
/// Returns [`MonitorError::Store`] when the read fails.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/history",
    tag = "Alerts",
    summary = "Alert history",
    params(AlertHistoryParams),
    responses(
        (status = 200, description = "Recent alerts", body = AlertHistoryResponse),
    )
)]
pub async fn alert_history(
    State(state): State<AppState>,
    Query(params): Query<AlertHistoryParams>,
) -> Result<Json<AlertHistoryResponse>, MonitorError> {
    let limit = params.clamped_limit();
    let alerts = state.repository.get_alert_history(limit).await?;
    let now = Utc::now();
    Ok(Json(AlertHistoryResponse {
        data: alerts.iter().map(|a| AlertRow::from_record(a, now)).collect(),
        limit,
    }))
}

/// `POST /alerts/{id}/resolve`: Mark an alert resolved.
///
/// # Errors
///
/// Returns [`MonitorError::AlertNotFound`] for unknown alerts.
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/resolve",
    tag = "Alerts",
    summary = "Resolve an alert",
    description = "Sets `resolved`, `resolvedAt`, `resolvedBy` and `notes` on the alert. Resolving twice overwrites the previous resolution.",
    params(("id" = String, Path, description = "Alert document id")),
    request_body = ResolveAlertRequest,
    responses(
        (status = 200, description = "Alert resolved", body = ResolveAlertResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    )
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResolveAlertRequest>,
) -> Result<Json<ResolveAlertResponse>, MonitorError> {
    let resolution = state
        .repository
        .resolve_alert(&id, &req.notes, req.resolved_by.as_deref())
        .await?;
    Ok(Json(resolution.into()))
}

/// Alert routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/history", get(alert_history))
        .route("/alerts/{id}/resolve", post(resolve_alert))
}
