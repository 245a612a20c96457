//! Stats and dashboard DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::monitor::DashboardSummary;

/// Response for `GET /api/v1/dashboard`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Summary strip.
    #[serde(flatten)]
    pub summary: DashboardSummary,
    /// Whether storefront settings are configured.
    pub storefront_configured: bool,
}
