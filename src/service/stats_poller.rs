//! Periodic re-read of today's stats.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::WebhookRepository;
use super::live::SubscriptionState;
use crate::domain::DailyStats;

/// Keeps today's [`DailyStats`] fresh.
///
/// The poll task reads once on start and then every `interval` while
/// auto-refresh is on. A failed read publishes
/// [`SubscriptionState::Failed`]; the next tick reads again.
#[derive(Debug)]
pub struct StatsPoller {
    repository: WebhookRepository,
    state: Arc<watch::Sender<SubscriptionState<DailyStats>>>,
    receiver: watch::Receiver<SubscriptionState<DailyStats>>,
    interval: Duration,
    auto_refresh: bool,
    task: JoinHandle<()>,
}

impl StatsPoller {
    /// Starts polling.
    #[must_use]
    pub fn spawn(repository: WebhookRepository, interval: Duration, auto_refresh: bool) -> Self {
        let (sender, receiver) = watch::channel(SubscriptionState::Loading);
        let state = Arc::new(sender);
        let task = spawn_poll(&repository, &state, interval, auto_refresh);
        Self {
            repository,
            state,
            receiver,
            interval,
            auto_refresh,
            task,
        }
    }

    /// Whether periodic refresh is on.
    #[must_use]
    pub const fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    /// Turns periodic refresh on or off. Turning it on reads immediately.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        if enabled == self.auto_refresh {
            return;
        }
        self.auto_refresh = enabled;
        self.task.abort();
        if enabled {
            self.task = spawn_poll(&self.repository, &self.state, self.interval, true);
        }
        tracing::debug!(enabled, "stats auto-refresh toggled");
    }

    /// Reads now, outside the poll schedule.
    pub async fn refresh_now(&self) {
        publish(&self.repository, &self.state).await;
    }

    /// Restarts the poll task with an immediate read.
    pub fn restart(&mut self) {
        self.task.abort();
        self.task = spawn_poll(&self.repository, &self.state, self.interval, self.auto_refresh);
    }

    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> SubscriptionState<DailyStats> {
        self.receiver.borrow().clone()
    }

    /// Waits until a new state is published.
    pub async fn changed(&mut self) {
        if self.receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_poll(
    repository: &WebhookRepository,
    state: &Arc<watch::Sender<SubscriptionState<DailyStats>>>,
    interval: Duration,
    repeat: bool,
) -> JoinHandle<()> {
    let repository = repository.clone();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        if !repeat {
            publish(&repository, &state).await;
            return;
        }
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            publish(&repository, &state).await;
        }
    })
}

async fn publish(
    repository: &WebhookRepository,
    state: &watch::Sender<SubscriptionState<DailyStats>>,
) {
    match repository.fetch_stats().await {
        Ok(stats) => {
            state.send_replace(SubscriptionState::Ready(stats));
        }
        Err(e) => {
            tracing::warn!(error = %e, "stats read failed");
            state.send_replace(SubscriptionState::Failed(e.to_string()));
        }
    }
}
