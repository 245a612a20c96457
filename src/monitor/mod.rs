//! Monitor and admin dashboard sessions.
//!
//! A [`DashboardSession`] is what one connected admin sees: a summary strip
//! fed by its own alert and stats subscriptions, and optionally the
//! [`MonitorSession`] modal. Sessions render to serializable views
//! ([`view`]) that the WebSocket layer pushes to the client.

pub mod dashboard;
pub mod session;
pub mod state;
pub mod view;

use std::time::Duration;

use crate::config::{MonitorConfig, clamp_max_results};
use crate::service::repository::DEFAULT_MAX_RESULTS;

pub use dashboard::{DashboardSession, DashboardSummary, DashboardView};
pub use session::MonitorSession;
pub use state::{MonitorState, MonitorTab, Notice, NoticeLevel};
pub use view::MonitorView;

/// Per-session defaults taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Initial purchase page size.
    pub default_max_results: usize,
    /// Stats re-read period.
    pub stats_refresh_interval: Duration,
    /// Whether stats auto-refresh starts on.
    pub auto_refresh: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
            stats_refresh_interval: Duration::from_secs(60),
            auto_refresh: true,
        }
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            default_max_results: clamp_max_results(config.default_max_results),
            stats_refresh_interval: config.stats_refresh_interval(),
            auto_refresh: config.stats_auto_refresh,
        }
    }
}
