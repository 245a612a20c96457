//! Shared application state injected into all Axum handlers.

use crate::config::StorefrontConfig;
use crate::monitor::MonitorSettings;
use crate::service::WebhookRepository;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read side of the webhook log plus alert resolution.
    pub repository: WebhookRepository,
    /// Defaults for each dashboard session opened over `/ws`.
    pub settings: MonitorSettings,
    /// Public storefront settings exposed to the dashboard client.
    pub storefront: StorefrontConfig,
    /// Name of the active document store backend (`memory` or `postgres`).
    pub store_backend: &'static str,
}
