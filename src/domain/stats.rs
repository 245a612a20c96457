//! Per-day aggregate counters maintained by the webhook writer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Aggregate counters for one calendar day (UTC).
///
/// A missing document, or a missing counter inside one, reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyStats {
    /// Webhooks received.
    pub total_webhooks: u64,
    /// Orders processed successfully.
    pub successful_orders: u64,
    /// Orders that failed processing.
    pub failed_orders: u64,
    /// Users created by the handler.
    pub users_created: u64,
    /// Orders that matched no user.
    pub orders_without_users: u64,
    /// Webhooks that failed before order processing.
    pub failed_webhooks: u64,
    /// Alerts raised.
    pub alerts_created: u64,
}

impl DailyStats {
    /// Reads counters from stored document data.
    #[must_use]
    pub fn from_document_data(data: &Value) -> Self {
        let counter = |key: &str| data.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            total_webhooks: counter("totalWebhooks"),
            successful_orders: counter("successfulOrders"),
            failed_orders: counter("failedOrders"),
            users_created: counter("usersCreated"),
            orders_without_users: counter("ordersWithoutUsers"),
            failed_webhooks: counter("failedWebhooks"),
            alerts_created: counter("alertsCreated"),
        }
    }

    /// Percentage of webhooks that produced a successful order, 0 when no
    /// webhook arrived.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_webhooks == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.successful_orders as f64 / self.total_webhooks as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    }
}

/// Document id of the stats document for `date` (`YYYY-MM-DD`).
#[must_use]
pub fn stats_document_id(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
