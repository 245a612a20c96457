//! WebSocket message types: envelope and monitor commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::MonitorTab;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp. Defaults to receipt time when a client omits it.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped now.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds a server event with a fresh id.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload)
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client pushed view update.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send, carried in the envelope payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Re-send the current view.
    GetView,
    /// Open the monitor modal.
    OpenMonitor,
    /// Close the monitor modal.
    CloseMonitor,
    /// Switch monitor tab.
    SetTab {
        /// Target tab.
        tab: MonitorTab,
    },
    /// Set the purchase search term.
    Search {
        /// Search term; blank clears.
        #[serde(default)]
        term: String,
    },
    /// Set the purchase status filter (`all` or a status).
    SetStatusFilter {
        /// Status string.
        status: String,
    },
    /// Set the alert severity filter (`all` or a severity).
    SetSeverityFilter {
        /// Severity string.
        severity: String,
    },
    /// Set the purchase page size.
    SetMaxResults {
        /// Page size; clamped to `1..=500`.
        max_results: usize,
    },
    /// Open the detail pane for one purchase.
    OpenDetails {
        /// Purchase document id.
        purchase_id: String,
    },
    /// Close the detail pane.
    CloseDetails,
    /// Expand or collapse the raw payload.
    TogglePayload,
    /// Resolve an alert.
    ResolveAlert {
        /// Alert document id.
        alert_id: String,
        /// Operator notes.
        #[serde(default)]
        notes: String,
    },
    /// Turn stats auto-refresh on or off.
    SetAutoRefresh {
        /// New setting.
        enabled: bool,
    },
    /// Re-read stats now.
    RefreshStats,
    /// Restart failed subscriptions.
    Retry,
    /// Clear the notice banner.
    DismissNotice,
}

impl WsCommand {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetView => "get_view",
            Self::OpenMonitor => "open_monitor",
            Self::CloseMonitor => "close_monitor",
            Self::SetTab { .. } => "set_tab",
            Self::Search { .. } => "search",
            Self::SetStatusFilter { .. } => "set_status_filter",
            Self::SetSeverityFilter { .. } => "set_severity_filter",
            Self::SetMaxResults { .. } => "set_max_results",
            Self::OpenDetails { .. } => "open_details",
            Self::CloseDetails => "close_details",
            Self::TogglePayload => "toggle_payload",
            Self::ResolveAlert { .. } => "resolve_alert",
            Self::SetAutoRefresh { .. } => "set_auto_refresh",
            Self::RefreshStats => "refresh_stats",
            Self::Retry => "retry",
            Self::DismissNotice => "dismiss_notice",
        }
    }
}
