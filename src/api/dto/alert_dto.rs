//! Alert DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::AlertResolution;
use crate::monitor::view::AlertRow;

/// Default page size for alert history.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Largest alert history page.
pub const MAX_HISTORY_LIMIT: usize = 200;

/// Query parameters for `GET /api/v1/alerts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertListParams {
    /// `all` or one severity.
    pub severity: Option<String>,
}

/// Response for `GET /api/v1/alerts`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertListResponse {
    /// Unresolved alerts passing the filter, newest first.
    pub data: Vec<AlertRow>,
    /// Unresolved alerts in `data`.
    pub alert_count: usize,
    /// Unresolved critical alerts in `data`.
    pub critical_alert_count: usize,
}

/// Query parameters for `GET /api/v1/alerts/history`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertHistoryParams {
    /// Page size (max 200). Defaults to 20.
    pub limit: Option<usize>,
}

impl AlertHistoryParams {
    /// Effective limit, clamped to `1..=200`.
    #[must_use]
    pub fn clamped_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// Response for `GET /api/v1/alerts/history`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertHistoryResponse {
    /// Alerts regardless of resolution state, newest first.
    pub data: Vec<AlertRow>,
    /// Effective limit.
    pub limit: usize,
}

/// Body for `POST /api/v1/alerts/{id}/resolve`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ResolveAlertRequest {
    /// Operator notes stored with the resolution.
    #[serde(default)]
    pub notes: String,
    /// Overrides the configured resolver identity.
    #[serde(default)]
    pub resolved_by: Option<String>,
}

/// Response for `POST /api/v1/alerts/{id}/resolve`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolveAlertResponse {
    /// Resolved alert.
    pub alert_id: String,
    /// Who resolved it.
    pub resolved_by: String,
    /// Stored notes.
    pub notes: String,
    /// Server time of resolution.
    pub resolved_at: DateTime<Utc>,
}

impl From<AlertResolution> for ResolveAlertResponse {
    fn from(r: AlertResolution) -> Self {
        Self {
            alert_id: r.alert_id,
            resolved_by: r.resolved_by,
            notes: r.notes,
            resolved_at: r.resolved_at,
        }
    }
}
