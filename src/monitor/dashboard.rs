//! Admin dashboard shell: summary strip plus the monitor modal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::view::{MonitorView, SectionView};
use super::{MonitorSession, MonitorSettings};
use crate::domain::alert::{alert_count, critical_alert_count};
use crate::domain::{AlertRecord, DailyStats};
use crate::error::MonitorError;
use crate::service::{LiveQuery, SeverityFilter, StatsPoller, SubscriptionState, WebhookRepository};

/// Numbers shown in the dashboard strip.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardSummary {
    /// Day the counters belong to, `YYYY-MM-DD`.
    pub date: String,
    /// Today's counters.
    pub stats: DailyStats,
    /// Successful orders over webhooks, in percent.
    pub success_rate: f64,
    /// Unresolved alerts.
    pub alert_count: usize,
    /// Unresolved critical alerts.
    pub critical_alert_count: usize,
}

impl DashboardSummary {
    /// Computes the strip for `now` from stats and the active alert list.
    #[must_use]
    pub fn compute(now: DateTime<Utc>, stats: DailyStats, alerts: &[AlertRecord]) -> Self {
        Self {
            date: now.date_naive().format("%Y-%m-%d").to_string(),
            success_rate: stats.success_rate(),
            stats,
            alert_count: alert_count(alerts),
            critical_alert_count: critical_alert_count(alerts),
        }
    }
}

/// What the admin's screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Today's counters.
    pub stats: SectionView<Option<DailyStats>>,
    /// Summary strip, present once stats and alerts are both loaded.
    pub summary: Option<DashboardSummary>,
    /// Whether the monitor modal is open.
    pub monitor_open: bool,
    /// The modal, when open.
    pub monitor: Option<MonitorView>,
}

/// One admin's dashboard.
///
/// The monitor is an owned modal: [`Self::open_monitor`] creates it and
/// [`Self::close_monitor`] drops it together with its subscriptions.
#[derive(Debug)]
pub struct DashboardSession {
    repository: WebhookRepository,
    settings: MonitorSettings,
    alerts: LiveQuery<Vec<AlertRecord>>,
    stats: StatsPoller,
    monitor: Option<MonitorSession>,
}

impl DashboardSession {
    /// Starts the dashboard subscriptions. The monitor starts closed.
    #[must_use]
    pub fn new(repository: WebhookRepository, settings: MonitorSettings) -> Self {
        let alerts = repository.subscribe_alerts(SeverityFilter::All);
        let stats = StatsPoller::spawn(
            repository.clone(),
            settings.stats_refresh_interval,
            settings.auto_refresh,
        );
        Self {
            repository,
            settings,
            alerts,
            stats,
            monitor: None,
        }
    }

    /// Opens the monitor. Returns `false` if it was already open.
    pub fn open_monitor(&mut self) -> bool {
        if self.monitor.is_some() {
            return false;
        }
        self.monitor = Some(MonitorSession::open(self.repository.clone(), &self.settings));
        true
    }

    /// Closes the monitor. Returns `false` if it was not open.
    pub fn close_monitor(&mut self) -> bool {
        if self.monitor.take().is_some() {
            tracing::debug!("monitor closed");
            true
        } else {
            false
        }
    }

    /// Whether the monitor is open.
    #[must_use]
    pub const fn is_monitor_open(&self) -> bool {
        self.monitor.is_some()
    }

    /// The open monitor.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::MonitorNotOpen`] while the modal is closed.
    pub fn monitor_mut(&mut self) -> Result<&mut MonitorSession, MonitorError> {
        self.monitor.as_mut().ok_or(MonitorError::MonitorNotOpen)
    }

    /// The open monitor, if any.
    #[must_use]
    pub const fn monitor(&self) -> Option<&MonitorSession> {
        self.monitor.as_ref()
    }

    /// Restarts failed dashboard subscriptions (and the monitor's).
    pub fn retry(&mut self) {
        if self.alerts.borrow().is_failed() {
            self.alerts = self.repository.subscribe_alerts(SeverityFilter::All);
        }
        if self.stats.snapshot().is_failed() {
            self.stats.restart();
        }
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.retry();
        }
    }

    /// Waits until any dashboard or monitor subscription publishes.
    pub async fn changed(&mut self) {
        let open = &mut self.monitor;
        let monitor = async move {
            match open.as_mut() {
                Some(monitor) => monitor.changed().await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            () = self.alerts.changed() => {}
            () = self.stats.changed() => {}
            () = monitor => {}
        }
    }

    /// Renders the dashboard as of `now`.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        let stats_state = self.stats.snapshot();
        let summary = match (&stats_state, &*self.alerts.borrow()) {
            (SubscriptionState::Ready(stats), SubscriptionState::Ready(alerts)) => {
                Some(DashboardSummary::compute(now, *stats, alerts))
            }
            _ => None,
        };
        DashboardView {
            stats: SectionView::from_state(&stats_state, |s| Some(*s)),
            summary,
            monitor_open: self.monitor.is_some(),
            monitor: self.monitor.as_ref().map(|m| m.view(now)),
        }
    }
}
