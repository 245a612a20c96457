//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::monitor::DashboardSession;

/// `GET /ws`: Upgrade to a WebSocket carrying one dashboard session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let repository = state.repository.clone();
    let settings = state.settings.clone();

    ws.on_upgrade(move |socket| async move {
        tracing::debug!("ws dashboard session opened");
        run_connection(socket, DashboardSession::new(repository, settings)).await;
    })
}
