//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and
//! `/config/storefront` live at the root. With the `swagger-ui` feature the
//! generated document is served at `/api-docs/openapi.json` and browsable at
//! `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Webhook monitor API",
        description = "Read-side API over the Shopify webhook log: purchases, alerts, and daily stats."
    ),
    paths(
        handlers::webhooks::list_webhooks,
        handlers::webhooks::get_webhook,
        handlers::alerts::list_alerts,
        handlers::alerts::alert_history,
        handlers::alerts::resolve_alert,
        handlers::stats::stats_today,
        handlers::stats::stats_for_date,
        handlers::stats::dashboard,
        handlers::system::health_handler,
        handlers::system::storefront_handler,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        dto::WebhookListResponse,
        dto::AlertListResponse,
        dto::AlertHistoryResponse,
        dto::ResolveAlertRequest,
        dto::ResolveAlertResponse,
        dto::DashboardResponse,
    )),
    tags(
        (name = "Webhooks", description = "Purchase webhook log"),
        (name = "Alerts", description = "Processing alerts and resolution"),
        (name = "Stats", description = "Daily counters and dashboard summary"),
        (name = "System", description = "Health and public settings"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/webhooks",
            "/api/v1/webhooks/{id}",
            "/api/v1/alerts",
            "/api/v1/alerts/history",
            "/api/v1/alerts/{id}/resolve",
            "/api/v1/stats/today",
            "/api/v1/stats/{date}",
            "/api/v1/dashboard",
            "/health",
            "/config/storefront",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
