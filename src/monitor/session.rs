//! The monitor modal: three subscriptions plus view state.

use chrono::{DateTime, Utc};

use super::MonitorSettings;
use super::state::{MonitorState, MonitorTab, Notice};
use super::view::{AlertRow, FilterView, MonitorView, PurchaseDetail, PurchaseRow, SectionView, StatsView};
use crate::domain::alert::{alert_count, critical_alert_count};
use crate::domain::{AlertRecord, AlertResolution, DailyStats, PurchaseRecord};
use crate::error::MonitorError;
use crate::service::{
    LiveQuery, SeverityFilter, StatsPoller, StatusFilter, SubscriptionState, WebhookRepository,
};

/// An open monitor.
///
/// Owns the purchase and alert live queries and a stats poller. Changing a
/// filter or the page size drops the affected live query and starts a new
/// one; dropping the session stops all three.
#[derive(Debug)]
pub struct MonitorSession {
    repository: WebhookRepository,
    state: MonitorState,
    purchases: LiveQuery<Vec<PurchaseRecord>>,
    alerts: LiveQuery<Vec<AlertRecord>>,
    stats: StatsPoller,
}

impl MonitorSession {
    /// Opens the monitor and starts its subscriptions.
    #[must_use]
    pub fn open(repository: WebhookRepository, settings: &MonitorSettings) -> Self {
        let state = MonitorState::new(settings.default_max_results, settings.auto_refresh);
        let purchases = repository.subscribe_purchases(&state.purchase_query);
        let alerts = repository.subscribe_alerts(state.severity_filter);
        let stats = StatsPoller::spawn(
            repository.clone(),
            settings.stats_refresh_interval,
            settings.auto_refresh,
        );
        tracing::debug!("monitor opened");
        Self {
            repository,
            state,
            purchases,
            alerts,
            stats,
        }
    }

    /// Current view state.
    #[must_use]
    pub const fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Switches tab.
    pub fn set_tab(&mut self, tab: MonitorTab) {
        self.state.active_tab = tab;
    }

    /// Sets the search term.
    pub fn search(&mut self, term: impl Into<String>) {
        self.state.set_search(term);
    }

    /// Sets the status filter, resubscribing when it changes.
    pub fn set_status_filter(&mut self, status: StatusFilter) {
        if self.state.set_status_filter(status) {
            self.resubscribe_purchases();
        }
    }

    /// Sets the page size, resubscribing when it changes.
    pub fn set_max_results(&mut self, max_results: usize) {
        if self.state.set_max_results(max_results) {
            self.resubscribe_purchases();
        }
    }

    /// Sets the severity filter, resubscribing when it changes.
    pub fn set_severity_filter(&mut self, severity: SeverityFilter) {
        if self.state.set_severity_filter(severity) {
            self.resubscribe_alerts();
        }
    }

    /// Opens the detail pane with a fresh read of `purchase_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::WebhookNotFound`] if the record is gone, or
    /// the read error. Both also set an error notice.
    pub async fn open_details(&mut self, purchase_id: &str) -> Result<(), MonitorError> {
        match self.repository.get_webhook_details(purchase_id).await {
            Ok(Some(record)) => {
                self.state.select(record);
                Ok(())
            }
            Ok(None) => {
                self.state.notice = Some(Notice::error(format!(
                    "Webhook {purchase_id} no longer exists"
                )));
                Err(MonitorError::WebhookNotFound(purchase_id.to_string()))
            }
            Err(e) => {
                self.state.notice = Some(Notice::error(format!("Failed to load details: {e}")));
                Err(e)
            }
        }
    }

    /// Closes the detail pane.
    pub fn close_details(&mut self) {
        self.state.close_details();
    }

    /// Expands or collapses the raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidRequest`] when no record is selected.
    pub fn toggle_payload(&mut self) -> Result<(), MonitorError> {
        if self.state.toggle_payload() {
            Ok(())
        } else {
            Err(MonitorError::InvalidRequest("no webhook selected".to_string()))
        }
    }

    /// Resolves an alert.
    ///
    /// On success the alert leaves the local list at once, before the
    /// change feed confirms it. On failure the list is untouched and an
    /// error notice is set.
    ///
    /// # Errors
    ///
    /// Propagates the repository error.
    pub async fn resolve_alert(
        &mut self,
        alert_id: &str,
        notes: &str,
    ) -> Result<AlertResolution, MonitorError> {
        match self.repository.resolve_alert(alert_id, notes, None).await {
            Ok(resolution) => {
                self.alerts.modify(|alerts| alerts.retain(|a| a.id != alert_id));
                self.state.notice = Some(Notice::info("Alert resolved"));
                Ok(resolution)
            }
            Err(e) => {
                tracing::warn!(alert_id, error = %e, "alert resolution failed");
                self.state.notice = Some(Notice::error(format!("Failed to resolve alert: {e}")));
                Err(e)
            }
        }
    }

    /// Turns stats auto-refresh on or off.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.state.auto_refresh = enabled;
        self.stats.set_auto_refresh(enabled);
    }

    /// Re-reads stats now.
    pub async fn refresh_stats(&self) {
        self.stats.refresh_now().await;
    }

    /// Restarts every failed subscription.
    pub fn retry(&mut self) {
        if self.purchases.borrow().is_failed() {
            self.resubscribe_purchases();
        }
        if self.alerts.borrow().is_failed() {
            self.resubscribe_alerts();
        }
        if self.stats.snapshot().is_failed() {
            self.stats.restart();
        }
    }

    /// Clears the banner.
    pub fn dismiss_notice(&mut self) {
        self.state.notice = None;
    }

    /// Purchase subscription state.
    #[must_use]
    pub fn purchases(&self) -> SubscriptionState<Vec<PurchaseRecord>> {
        self.purchases.snapshot()
    }

    /// Alert subscription state.
    #[must_use]
    pub fn alerts(&self) -> SubscriptionState<Vec<AlertRecord>> {
        self.alerts.snapshot()
    }

    /// Stats state.
    #[must_use]
    pub fn stats(&self) -> SubscriptionState<DailyStats> {
        self.stats.snapshot()
    }

    /// Unresolved alerts in the live list.
    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.alerts.borrow().value().map_or(0, |a| alert_count(a))
    }

    /// Unresolved critical alerts in the live list.
    #[must_use]
    pub fn critical_alert_count(&self) -> usize {
        self.alerts
            .borrow()
            .value()
            .map_or(0, |a| critical_alert_count(a))
    }

    /// Waits until any subscription publishes.
    pub async fn changed(&mut self) {
        tokio::select! {
            () = self.purchases.changed() => {}
            () = self.alerts.changed() => {}
            () = self.stats.changed() => {}
        }
    }

    /// Renders the modal as of `now`.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> MonitorView {
        let purchases = SectionView::from_state(&*self.purchases.borrow(), |records| {
            self.state
                .visible_purchases(records)
                .into_iter()
                .map(|r| PurchaseRow::from_record(r, now))
                .collect()
        });
        let alerts = SectionView::from_state(&*self.alerts.borrow(), |records| {
            self.state
                .visible_alerts(records)
                .into_iter()
                .map(|a| AlertRow::from_record(a, now))
                .collect()
        });
        let stats = SectionView::from_state(&self.stats.snapshot(), |s| {
            Some(StatsView::new(now.date_naive(), *s))
        });

        MonitorView {
            active_tab: self.state.active_tab,
            search_term: self.state.search_term.clone(),
            filters: FilterView {
                purchases: self.state.purchase_query.clone(),
                severity: self.state.severity_filter,
            },
            auto_refresh: self.state.auto_refresh,
            purchases,
            alerts,
            stats,
            alert_count: self.alert_count(),
            critical_alert_count: self.critical_alert_count(),
            selected: self
                .state
                .selected_webhook
                .as_ref()
                .map(|r| PurchaseDetail::from_record(r, self.state.expanded_payload, now)),
            notice: self.state.notice.clone(),
        }
    }

    fn resubscribe_purchases(&mut self) {
        self.purchases = self
            .repository
            .subscribe_purchases(&self.state.purchase_query);
    }

    fn resubscribe_alerts(&mut self) {
        self.alerts = self.repository.subscribe_alerts(self.state.severity_filter);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CollectionPath, EventBus, ProcessingStatus};
    use crate::store::testing::FaultyStore;
    use crate::store::{DocumentStore, MemoryDocumentStore};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;

    fn settings() -> MonitorSettings {
        MonitorSettings {
            default_max_results: 50,
            stats_refresh_interval: Duration::from_secs(3600),
            auto_refresh: true,
        }
    }

    async fn seed(store: &dyn DocumentStore, collection: CollectionPath, id: &str, data: Value) {
        let result = store.set(&collection.doc(id), data).await;
        assert!(result.is_ok());
    }

    /// Waits until `ready` holds, giving background tasks time to publish.
    async fn settle(session: &mut MonitorSession, ready: impl Fn(&MonitorSession) -> bool) {
        for _ in 0..50 {
            if ready(session) {
                return;
            }
            let _ = tokio::time::timeout(Duration::from_millis(50), session.changed()).await;
        }
        assert!(ready(session), "session never settled");
    }

    fn loaded(session: &MonitorSession) -> bool {
        !session.purchases().is_loading()
            && !session.alerts().is_loading()
            && !session.stats().is_loading()
    }

    #[tokio::test]
    async fn scenario_success_row() {
        let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
        seed(&*store, CollectionPath::purchases(), "p1", json!({
            "order": {"id": 7001, "orderNumber": 1001},
            "user": {"email": "buyer@example.com"},
            "processingResult": {"status": "success", "errors": [], "warnings": []},
            "createdAt": "2026-10-18T09:05:00Z"
        })).await;
        let repo = WebhookRepository::new(store, "admin");
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;

        let view = session.view(Utc::now());
        let Some(row) = view.purchases.items.first() else {
            panic!("one row expected");
        };
        assert_eq!(row.order_display, "#1001");
        assert_eq!(row.badge.label, "SUCCESS");
        assert_eq!(row.badge.background, "green-100");
        assert_eq!(row.created_display, "Oct 18, 2026, 9:05:00 AM UTC");
    }

    #[tokio::test]
    async fn scenario_resolve_critical_alert() {
        let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
        seed(&*store, CollectionPath::alerts(), "a1", json!({
            "type": "no_user_found", "severity": "critical", "resolved": false,
            "details": {"message": "No user", "orderNumber": 1001},
            "createdAt": "2026-10-18T09:00:00Z"
        })).await;
        seed(&*store, CollectionPath::alerts(), "a2", json!({
            "type": "slow", "severity": "warning", "resolved": false,
            "createdAt": "2026-10-18T08:00:00Z"
        })).await;
        let repo = WebhookRepository::new(store, "admin");
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;
        assert_eq!(session.alert_count(), 2);
        assert_eq!(session.critical_alert_count(), 1);

        let Ok(resolution) = session.resolve_alert("a1", "handled").await else {
            panic!("resolve must succeed");
        };
        assert_eq!(resolution.alert_id, "a1");
        // Optimistic removal is visible before any re-read.
        assert_eq!(session.alert_count(), 1);
        assert_eq!(session.critical_alert_count(), 0);

        let view = session.view(Utc::now());
        assert!(view.alerts.items.iter().all(|a| a.id != "a1"));
        assert_eq!(view.alert_count, view.alerts.items.len());
        assert_eq!(view.notice, Some(Notice::info("Alert resolved")));
    }

    #[tokio::test]
    async fn failed_resolve_keeps_alert_and_sets_notice() {
        let store = FaultyStore::new();
        seed(&*store, CollectionPath::alerts(), "a1", json!({
            "severity": "critical", "resolved": false, "createdAt": "2026-10-18T09:00:00Z"
        })).await;
        store.fail_updates(true);
        let repo = WebhookRepository::new(Arc::clone(&store) as Arc<dyn DocumentStore>, "admin");
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;

        assert!(session.resolve_alert("a1", "").await.is_err());
        assert_eq!(session.alert_count(), 1);
        let Some(notice) = session.state().notice.clone() else {
            panic!("notice expected");
        };
        assert!(notice.message.starts_with("Failed to resolve alert"));
    }

    #[tokio::test]
    async fn scenario_search_by_email() {
        let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
        for (id, email) in [("p1", "alice@example.com"), ("p2", "bob@example.com")] {
            seed(&*store, CollectionPath::purchases(), id, json!({
                "orderId": id, "orderNumber": 1000, "userEmail": email,
                "processingResult": {"status": "success"},
                "createdAt": "2026-10-18T09:00:00Z"
            })).await;
        }
        let repo = WebhookRepository::new(store, "admin");
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;

        session.search("BOB@");
        let view = session.view(Utc::now());
        let ids: Vec<&str> = view.purchases.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p2"]);

        session.search("");
        assert_eq!(session.view(Utc::now()).purchases.items.len(), 2);
    }

    #[tokio::test]
    async fn status_filter_resubscribes() {
        let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
        seed(&*store, CollectionPath::purchases(), "ok", json!({
            "processingResult": {"status": "success"}, "createdAt": "2026-10-18T09:00:00Z"
        })).await;
        seed(&*store, CollectionPath::purchases(), "bad", json!({
            "processingResult": {"status": "error"}, "createdAt": "2026-10-18T09:01:00Z"
        })).await;
        let repo = WebhookRepository::new(store, "admin");
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;

        session.set_status_filter(StatusFilter::Only(ProcessingStatus::Error));
        assert!(session.purchases().is_loading());
        settle(&mut session, loaded).await;
        let Some(records) = session.purchases().value().cloned() else {
            panic!("purchases expected");
        };
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn live_updates_reach_the_session() {
        let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
        let repo = WebhookRepository::new(
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            "admin",
        );
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;
        assert_eq!(session.view(Utc::now()).purchases.items.len(), 0);

        seed(&*store, CollectionPath::purchases(), "p9", json!({
            "processingResult": {"status": "no_user"}, "createdAt": "2026-10-18T10:00:00Z"
        })).await;
        settle(&mut session, |s| {
            s.purchases().value().is_some_and(|records| records.len() == 1)
        })
        .await;
    }

    #[tokio::test]
    async fn details_open_and_missing() {
        let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
        seed(&*store, CollectionPath::purchases(), "p1", json!({
            "orderNumber": 1001, "fullPayload": {"id": 1},
            "processingResult": {"status": "success"}, "createdAt": "2026-10-18T09:00:00Z"
        })).await;
        let repo = WebhookRepository::new(store, "admin");
        let mut session = MonitorSession::open(repo, &settings());

        assert!(session.toggle_payload().is_err());
        assert!(session.open_details("p1").await.is_ok());
        assert!(session.toggle_payload().is_ok());
        let view = session.view(Utc::now());
        let Some(detail) = view.selected else {
            panic!("detail pane expected");
        };
        assert!(detail.payload.is_some());

        let missing = session.open_details("nope").await;
        assert!(matches!(missing, Err(MonitorError::WebhookNotFound(_))));
        assert!(session.state().notice.is_some());
        session.dismiss_notice();
        assert!(session.state().notice.is_none());
    }

    #[tokio::test]
    async fn retry_restarts_failed_subscriptions() {
        let store = FaultyStore::new();
        store.fail_queries_on(Some(CollectionPath::alerts()));
        let repo = WebhookRepository::new(Arc::clone(&store) as Arc<dyn DocumentStore>, "admin");
        let mut session = MonitorSession::open(repo, &settings());
        settle(&mut session, loaded).await;
        assert!(session.alerts().is_failed());
        assert!(session.view(Utc::now()).alerts.error.is_some());

        store.fail_queries_on(None);
        session.retry();
        settle(&mut session, |s| matches!(s.alerts(), SubscriptionState::Ready(_))).await;
    }
}
