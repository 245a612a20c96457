//! REST endpoint handlers organized by resource.

pub mod alerts;
pub mod stats;
pub mod system;
pub mod webhooks;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(webhooks::routes())
        .merge(alerts::routes())
        .merge(stats::routes())
}
