//! Purchase log handlers: list and detail.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{WebhookListParams, WebhookListResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MonitorError};
use crate::monitor::state::matches_search;
use crate::monitor::view::{PurchaseDetail, PurchaseRow};
use crate::service::{PurchaseQuery, StatusFilter};

/// `GET /webhooks`: One page of the purchase log.
///
/// # Errors
///
/// Returns [`MonitorError::InvalidFilter`] for an unknown status, or
/// [`MonitorError::Store`] when the read fails.
#[utoipa::path(
    get,
    path = "/api/v1/webhooks",
    tag = "Webhooks",
    summary = "List purchase webhooks",
    description = "Returns the newest purchase records, optionally filtered by processing status. The search term narrows only the fetched page.",
    params(WebhookListParams),
    responses(
        (status = 200, description = "Purchase page", body = WebhookListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn list_webhooks(
    State(state): State<AppState>,
    Query(params): Query<WebhookListParams>,
) -> Result<Json<WebhookListResponse>, MonitorError> {
    let status = params
        .status
        .as_deref()
        .map_or(Ok(StatusFilter::All), StatusFilter::parse)?;
    let query = PurchaseQuery::new(
        params
            .max_results
            .unwrap_or(state.settings.default_max_results),
        status,
    );

    let records = state.repository.fetch_purchases(&query).await?;
    let term = params.search.unwrap_or_default();
    let now = Utc::now();
    let data: Vec<PurchaseRow> = records
        .iter()
        .filter(|r| matches_search(r, &term))
        .map(|r| PurchaseRow::from_record(r, now))
        .collect();

    Ok(Json(WebhookListResponse {
        count: data.len(),
        data,
        max_results: query.max_results,
        status: query.status.as_str().to_string(),
    }))
}

/// `GET /webhooks/{id}`: Full detail of one purchase, payload expanded.
///
/// # Errors
///
/// Returns [`MonitorError::WebhookNotFound`] when the record does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/webhooks/{id}",
    tag = "Webhooks",
    summary = "Get purchase details",
    params(("id" = String, Path, description = "Purchase document id")),
    responses(
        (status = 200, description = "Purchase detail", body = PurchaseDetail),
        (status = 404, description = "Purchase not found", body = ErrorResponse),
    )
)]
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PurchaseDetail>, MonitorError> {
    let record = state
        .repository
        .get_webhook_details(&id)
        .await?
        .ok_or(MonitorError::WebhookNotFound(id))?;
    Ok(Json(PurchaseDetail::from_record(&record, true, Utc::now())))
}

/// Purchase log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks", get(list_webhooks))
        .route("/webhooks/{id}", get(get_webhook))
}
