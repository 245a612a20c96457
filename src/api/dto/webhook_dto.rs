//! Purchase log DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::monitor::view::PurchaseRow;

/// Query parameters for `GET /api/v1/webhooks`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WebhookListParams {
    /// Page size, clamped to `1..=500`. Defaults to the configured size.
    pub max_results: Option<usize>,
    /// `all` or one processing status.
    pub status: Option<String>,
    /// Case-insensitive search over the fetched page.
    pub search: Option<String>,
}

/// Response for `GET /api/v1/webhooks`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookListResponse {
    /// Matching rows, newest first.
    pub data: Vec<PurchaseRow>,
    /// Number of rows returned after search.
    pub count: usize,
    /// Effective page size.
    pub max_results: usize,
    /// Effective status filter.
    pub status: String,
}
