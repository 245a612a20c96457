//! Monitor view state: active tab, search, filters, detail pane, notice.
//!
//! Pure data. [`super::MonitorSession`] owns one and re-issues
//! subscriptions when a setter reports that the query changed.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::clamp_max_results;
use crate::domain::{AlertRecord, PurchaseRecord};
use crate::service::{PurchaseQuery, SeverityFilter, StatusFilter};

/// Monitor tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MonitorTab {
    /// Purchase log.
    #[default]
    Logs,
    /// Unresolved alerts.
    Alerts,
    /// Today's counters.
    Stats,
}

/// Notice banner level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Confirmation.
    Info,
    /// A failed action.
    Error,
}

/// One-line banner shown above the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Banner level.
    pub level: NoticeLevel,
    /// Banner text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything the monitor remembers between commands.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState {
    /// Visible tab.
    pub active_tab: MonitorTab,
    /// Free-text search over the fetched purchase page.
    pub search_term: String,
    /// Purchase subscription parameters.
    pub purchase_query: PurchaseQuery,
    /// Alert subscription filter.
    pub severity_filter: SeverityFilter,
    /// Record shown in the detail pane.
    pub selected_webhook: Option<PurchaseRecord>,
    /// Whether the raw payload is expanded in the detail pane.
    pub expanded_payload: bool,
    /// Whether stats refresh periodically.
    pub auto_refresh: bool,
    /// Current banner.
    pub notice: Option<Notice>,
}

impl MonitorState {
    /// Initial state: logs tab, no search, no filters.
    #[must_use]
    pub fn new(default_max_results: usize, auto_refresh: bool) -> Self {
        Self {
            active_tab: MonitorTab::Logs,
            search_term: String::new(),
            purchase_query: PurchaseQuery::new(default_max_results, StatusFilter::All),
            severity_filter: SeverityFilter::All,
            selected_webhook: None,
            expanded_payload: false,
            auto_refresh,
            notice: None,
        }
    }

    /// Sets the search term. Never requires a resubscribe.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Sets the status filter. Returns `true` if the purchase query changed.
    pub fn set_status_filter(&mut self, status: StatusFilter) -> bool {
        if self.purchase_query.status == status {
            return false;
        }
        self.purchase_query.status = status;
        true
    }

    /// Sets the severity filter. Returns `true` if the alert query changed.
    pub fn set_severity_filter(&mut self, severity: SeverityFilter) -> bool {
        if self.severity_filter == severity {
            return false;
        }
        self.severity_filter = severity;
        true
    }

    /// Sets the page size (clamped). Returns `true` if the purchase query
    /// changed.
    pub fn set_max_results(&mut self, max_results: usize) -> bool {
        let max_results = clamp_max_results(max_results);
        if self.purchase_query.max_results == max_results {
            return false;
        }
        self.purchase_query.max_results = max_results;
        true
    }

    /// Opens the detail pane on `record`, payload collapsed.
    pub fn select(&mut self, record: PurchaseRecord) {
        self.selected_webhook = Some(record);
        self.expanded_payload = false;
    }

    /// Closes the detail pane.
    pub fn close_details(&mut self) {
        self.selected_webhook = None;
        self.expanded_payload = false;
    }

    /// Toggles the raw payload. Returns `false` when no record is selected.
    pub fn toggle_payload(&mut self) -> bool {
        if self.selected_webhook.is_none() {
            return false;
        }
        self.expanded_payload = !self.expanded_payload;
        true
    }

    /// Purchases passing the status filter and the search term, in order.
    #[must_use]
    pub fn visible_purchases<'a>(&self, records: &'a [PurchaseRecord]) -> Vec<&'a PurchaseRecord> {
        records
            .iter()
            .filter(|r| self.purchase_query.status.accepts(&r.status))
            .filter(|r| matches_search(r, &self.search_term))
            .collect()
    }

    /// Unresolved alerts passing the severity filter, in order.
    #[must_use]
    pub fn visible_alerts<'a>(&self, alerts: &'a [AlertRecord]) -> Vec<&'a AlertRecord> {
        alerts
            .iter()
            .filter(|a| a.is_active() && self.severity_filter.accepts(a.severity))
            .collect()
    }
}

/// Case-insensitive substring match over a record's search fields. Blank
/// terms match everything.
#[must_use]
pub fn matches_search(record: &PurchaseRecord, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record
        .search_fields()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ProcessingStatus, Severity};
    use crate::store::Document;
    use chrono::Utc;
    use serde_json::json;

    fn record(id: &str, email: &str, status: &str) -> PurchaseRecord {
        let doc = Document::new(
            id,
            json!({
                "orderId": format!("70{id}"),
                "orderNumber": format!("10{id}"),
                "userEmail": email,
                "processingResult": {"status": status},
                "createdAt": "2026-10-18T09:00:00Z",
            }),
        );
        PurchaseRecord::from_document(&doc, Utc::now())
    }

    #[test]
    fn blank_search_matches_everything() {
        let r = record("1", "a@example.com", "success");
        assert!(matches_search(&r, ""));
        assert!(matches_search(&r, "   "));
    }

    #[test]
    fn search_is_case_insensitive_over_emails_and_numbers() {
        let r = record("1", "Buyer@Example.com", "success");
        assert!(matches_search(&r, "buyer@example"));
        assert!(matches_search(&r, "101"));
        assert!(!matches_search(&r, "someone-else"));
    }

    #[test]
    fn search_narrows_only_the_fetched_page() {
        let records = vec![
            record("1", "alice@example.com", "success"),
            record("2", "bob@example.com", "error"),
            record("3", "alice@other.org", "success"),
        ];
        let mut state = MonitorState::new(50, true);
        state.set_search("alice");
        let visible: Vec<&str> = state
            .visible_purchases(&records)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(visible, vec!["1", "3"]);
    }

    #[test]
    fn status_filter_applies_client_side_too() {
        let records = vec![
            record("1", "a@example.com", "success"),
            record("2", "b@example.com", "error"),
        ];
        let mut state = MonitorState::new(50, true);
        assert!(state.set_status_filter(StatusFilter::Only(ProcessingStatus::Error)));
        assert!(!state.set_status_filter(StatusFilter::Only(ProcessingStatus::Error)));
        assert_eq!(state.visible_purchases(&records).len(), 1);
    }

    #[test]
    fn max_results_changes_are_clamped_and_detected() {
        let mut state = MonitorState::new(50, true);
        assert!(!state.set_max_results(50));
        assert!(state.set_max_results(9999));
        assert_eq!(state.purchase_query.max_results, 500);
    }

    #[test]
    fn severity_filter_change_detection() {
        let mut state = MonitorState::new(50, true);
        assert!(!state.set_severity_filter(SeverityFilter::All));
        assert!(state.set_severity_filter(SeverityFilter::Only(Severity::Critical)));
    }

    #[test]
    fn payload_toggle_requires_selection() {
        let mut state = MonitorState::new(50, true);
        assert!(!state.toggle_payload());
        state.select(record("1", "a@example.com", "success"));
        assert!(state.toggle_payload());
        assert!(state.expanded_payload);
        state.close_details();
        assert!(state.selected_webhook.is_none());
        assert!(!state.expanded_payload);
    }
}
