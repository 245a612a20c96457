//! Daily stats and dashboard summary handlers.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};

use crate::api::dto::DashboardResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MonitorError};
use crate::monitor::DashboardSummary;
use crate::monitor::view::StatsView;
use crate::service::SeverityFilter;

/// `GET /stats/today`: Today's (UTC) counters.
///
/// # Errors
///
/// Returns [`MonitorError::Store`] when the read fails.
#[utoipa::path(
    get,
    path = "/api/v1/stats/today",
    tag = "Stats",
    summary = "Today's counters",
    description = "Counters for the current UTC date. All zeros when no document exists yet.",
    responses(
        (status = 200, description = "Daily counters", body = StatsView),
    )
)]
pub async fn stats_today(State(state): State<AppState>) -> Result<Json<StatsView>, MonitorError> {
    let date = Utc::now().date_naive();
    let stats = state.repository.fetch_stats_for(date).await?;
    Ok(Json(StatsView::new(date, stats)))
}

/// `GET /stats/{date}`: Counters for a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`MonitorError::InvalidRequest`] for a malformed date.
#[utoipa::path(
    get,
    path = "/api/v1/stats/{date}",
    tag = "Stats",
    summary = "Counters for a date",
    params(("date" = String, Path, description = "Date as YYYY-MM-DD")),
    responses(
        (status = 200, description = "Daily counters", body = StatsView),
        (status = 400, description = "Malformed date", body = ErrorResponse),
    )
)]
pub async fn stats_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<StatsView>, MonitorError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| MonitorError::InvalidRequest(format!("invalid date {date:?}: {e}")))?;
    let stats = state.repository.fetch_stats_for(date).await?;
    Ok(Json(StatsView::new(date, stats)))
}

/// `GET /dashboard`: Summary strip.
///
/// # Errors
///
/// Returns [`MonitorError::Store`] when a read fails.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Stats",
    summary = "Dashboard summary",
    description = "Today's counters, success rate, and unresolved alert counts.",
    responses(
        (status = 200, description = "Summary strip", body = DashboardResponse),
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, MonitorError> {
    let (stats, alerts) = tokio::try_join!(
        state.repository.fetch_stats(),
        state.repository.fetch_active_alerts(SeverityFilter::All),
    )?;
    Ok(Json(DashboardResponse {
        summary: DashboardSummary::compute(Utc::now(), stats, &alerts),
        storefront_configured: state.storefront.is_configured(),
    }))
}

/// Stats routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats/today", get(stats_today))
        .route("/stats/{date}", get(stats_for_date))
        .route("/dashboard", get(dashboard))
}
