//! Rendered view models pushed to clients.
//!
//! Everything here is display-ready: badges resolved, timestamps formatted,
//! order numbers prefixed. Row types are also used by the REST API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::state::{MonitorTab, Notice};
use crate::domain::presentation::{
    format_order_number, format_price, format_relative, format_timestamp, severity_badge,
    status_badge, status_label,
};
use crate::domain::purchase::NoteAttribute;
use crate::domain::{AlertRecord, DailyStats, ProcessingStatus, PurchaseRecord, Severity};
use crate::service::{PurchaseQuery, SeverityFilter, SubscriptionState};

/// Status badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BadgeView {
    /// Upper-case label, e.g. `NO USER`.
    pub label: String,
    /// Icon name.
    pub icon: String,
    /// Background colour token.
    pub background: String,
    /// Text colour token.
    pub text: String,
}

impl BadgeView {
    /// Badge for a processing status.
    #[must_use]
    pub fn for_status(status: &ProcessingStatus) -> Self {
        let style = status_badge(status);
        Self {
            label: status_label(status),
            icon: style.icon.to_string(),
            background: style.background.to_string(),
            text: style.text.to_string(),
        }
    }
}

/// Severity badge and card border.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SeverityBadgeView {
    /// Upper-case label.
    pub label: String,
    /// Icon name.
    pub icon: String,
    /// Card border colour token.
    pub border: String,
    /// Badge background colour token.
    pub background: String,
    /// Badge text colour token.
    pub text: String,
}

impl SeverityBadgeView {
    /// Badge for a severity.
    #[must_use]
    pub fn for_severity(severity: Severity) -> Self {
        let style = severity_badge(severity);
        Self {
            label: severity.as_str().to_uppercase(),
            icon: style.icon.to_string(),
            border: style.border.to_string(),
            background: style.background.to_string(),
            text: style.text.to_string(),
        }
    }
}

/// One line of the purchase log.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PurchaseRow {
    /// Document id.
    pub id: String,
    /// Order number for display, e.g. `#1001`.
    pub order_display: String,
    /// Upstream order id.
    pub order_id: Option<String>,
    /// Matched user email.
    pub user_email: Option<String>,
    /// Product title.
    pub product_title: String,
    /// Raw status string.
    pub status: String,
    /// Status badge.
    pub badge: BadgeView,
    /// Webhook topic.
    pub webhook_topic: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Creation time, formatted.
    pub created_display: String,
    /// Creation time relative to render time.
    pub created_relative: String,
    /// Number of handler errors.
    pub error_count: usize,
    /// Number of handler warnings.
    pub warning_count: usize,
}

impl PurchaseRow {
    /// Renders a record as of `now`.
    #[must_use]
    pub fn from_record(record: &PurchaseRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            order_display: format_order_number(record.order_number.as_deref()),
            order_id: record.order_id.clone(),
            user_email: record.user_email.clone(),
            product_title: record.product_title.clone(),
            status: record.status.as_str().to_string(),
            badge: BadgeView::for_status(&record.status),
            webhook_topic: record.webhook_topic.clone(),
            created_at: record.created_at,
            created_display: format_timestamp(record.created_at),
            created_relative: format_relative(record.created_at, now),
            error_count: record.errors.len(),
            warning_count: record.warnings.len(),
        }
    }
}

/// Detail pane for one purchase.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PurchaseDetail {
    /// Summary line.
    #[serde(flatten)]
    pub row: PurchaseRow,
    /// Handler errors.
    pub errors: Vec<String>,
    /// Handler warnings.
    pub warnings: Vec<String>,
    /// Whether the handler created a user.
    pub user_created: bool,
    /// Whether the handler found a user.
    pub user_found: bool,
    /// Platform user id.
    pub user_id: Option<String>,
    /// Gift recipient email.
    pub recipient_email: Option<String>,
    /// Purchaser email.
    pub purchaser_email: Option<String>,
    /// Which email matched (`recipient` or `purchaser`).
    pub email_used: Option<String>,
    /// Order note attributes.
    pub note_attributes: Vec<NoteAttribute>,
    /// Handler processing time.
    pub processing_time_ms: Option<u64>,
    /// Total with currency, e.g. `49.99 CAD`.
    pub price: Option<String>,
    /// Whether the raw payload is expanded.
    pub payload_expanded: bool,
    /// Pretty-printed raw payload, present only when expanded.
    pub payload: Option<String>,
}

impl PurchaseDetail {
    /// Renders the detail pane.
    #[must_use]
    pub fn from_record(record: &PurchaseRecord, expanded: bool, now: DateTime<Utc>) -> Self {
        let payload = if expanded {
            record
                .full_payload
                .as_ref()
                .and_then(|p| serde_json::to_string_pretty(p).ok())
        } else {
            None
        };
        Self {
            row: PurchaseRow::from_record(record, now),
            errors: record.errors.clone(),
            warnings: record.warnings.clone(),
            user_created: record.user_created,
            user_found: record.user_found,
            user_id: record.user_id.clone(),
            recipient_email: record.recipient_email.clone(),
            purchaser_email: record.purchaser_email.clone(),
            email_used: record.email_used.map(|e| e.as_str().to_string()),
            note_attributes: record.note_attributes.clone(),
            processing_time_ms: record.processing_time_ms,
            price: format_price(record.total_price.as_deref(), record.currency.as_deref()),
            payload_expanded: expanded,
            payload,
        }
    }
}

/// One alert card.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AlertRow {
    /// Document id.
    pub id: String,
    /// Alert category.
    pub alert_type: String,
    /// Severity.
    pub severity: Severity,
    /// Severity badge.
    pub badge: SeverityBadgeView,
    /// Description.
    pub message: Option<String>,
    /// Related order, e.g. `#1001`.
    pub order_display: String,
    /// Related order id.
    pub order_id: Option<String>,
    /// Product titles.
    pub products: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Creation time, formatted.
    pub created_display: String,
    /// Creation time relative to render time.
    pub created_relative: String,
    /// Whether the alert is resolved.
    pub resolved: bool,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Resolver.
    pub resolved_by: Option<String>,
    /// Resolution notes.
    pub notes: Option<String>,
}

impl AlertRow {
    /// Renders an alert as of `now`.
    #[must_use]
    pub fn from_record(alert: &AlertRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: alert.id.clone(),
            alert_type: alert.alert_type.clone(),
            severity: alert.severity,
            badge: SeverityBadgeView::for_severity(alert.severity),
            message: alert.details.message.clone(),
            order_display: format_order_number(alert.details.order_number.as_deref()),
            order_id: alert.details.order_id.clone(),
            products: alert.details.products.clone(),
            created_at: alert.created_at,
            created_display: format_timestamp(alert.created_at),
            created_relative: format_relative(alert.created_at, now),
            resolved: alert.resolved,
            resolved_at: alert.resolved_at,
            resolved_by: alert.resolved_by.clone(),
            notes: alert.notes.clone(),
        }
    }
}

/// Counters for one day plus the derived success rate.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatsView {
    /// Day, `YYYY-MM-DD`.
    pub date: String,
    /// Raw counters.
    pub stats: DailyStats,
    /// Successful orders over webhooks, in percent (one decimal).
    pub success_rate: f64,
}

impl StatsView {
    /// Renders counters for `date`.
    #[must_use]
    pub fn new(date: NaiveDate, stats: DailyStats) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            success_rate: stats.success_rate(),
            stats,
        }
    }
}

/// A subscription-backed section of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView<T> {
    /// `true` until the first snapshot.
    pub loading: bool,
    /// Failure message; cleared by `retry`.
    pub error: Option<String>,
    /// Rendered content; empty while loading or failed.
    pub items: T,
}

impl<T: Default> SectionView<T> {
    /// Renders a subscription state with `render`.
    pub fn from_state<S>(state: &SubscriptionState<S>, render: impl FnOnce(&S) -> T) -> Self {
        match state {
            SubscriptionState::Loading => Self {
                loading: true,
                error: None,
                items: T::default(),
            },
            SubscriptionState::Ready(value) => Self {
                loading: false,
                error: None,
                items: render(value),
            },
            SubscriptionState::Failed(message) => Self {
                loading: false,
                error: Some(message.clone()),
                items: T::default(),
            },
        }
    }
}

/// Active filters, echoed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterView {
    /// Purchase page size and status filter.
    #[serde(flatten)]
    pub purchases: PurchaseQuery,
    /// Alert severity filter.
    pub severity: SeverityFilter,
}

/// The full monitor modal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorView {
    /// Visible tab.
    pub active_tab: MonitorTab,
    /// Current search term.
    pub search_term: String,
    /// Active filters.
    pub filters: FilterView,
    /// Whether stats refresh periodically.
    pub auto_refresh: bool,
    /// Purchase log after filter and search.
    pub purchases: SectionView<Vec<PurchaseRow>>,
    /// Unresolved alerts.
    pub alerts: SectionView<Vec<AlertRow>>,
    /// Today's counters.
    pub stats: SectionView<Option<StatsView>>,
    /// Unresolved alerts in the live list.
    pub alert_count: usize,
    /// Unresolved critical alerts in the live list.
    pub critical_alert_count: usize,
    /// Detail pane.
    pub selected: Option<PurchaseDetail>,
    /// Banner.
    pub notice: Option<Notice>,
}
