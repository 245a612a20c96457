//! WebSocket connection state machine.
//!
//! Each connection owns one [`DashboardSession`]. Commands from the client
//! are applied to the session and answered with the fresh view; whenever
//! one of the session's subscriptions publishes, the view is pushed as an
//! event.

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::json;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::error::MonitorError;
use crate::monitor::DashboardSession;
use crate::service::{SeverityFilter, StatusFilter};

enum Step {
    Incoming(Option<Result<Message, axum::Error>>),
    Changed,
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Sends the initial view as an event.
/// - Reads commands from the client and answers each with a response or
///   an error envelope.
/// - Pushes the view whenever a subscription of the session changes.
pub async fn run_connection(socket: WebSocket, mut session: DashboardSession) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let initial = WsMessage::event(json!({ "view": session.view(Utc::now()) }));
    if send(&mut ws_tx, &initial).await.is_err() {
        return;
    }

    loop {
        let step = tokio::select! {
            msg = ws_rx.next() => Step::Incoming(msg),
            () = session.changed() => Step::Changed,
        };

        let outgoing = match step {
            Step::Incoming(Some(Ok(Message::Text(text)))) => {
                handle_text_message(&text, &mut session).await
            }
            Step::Incoming(Some(Ok(Message::Close(_))) | None) => break,
            Step::Incoming(Some(Err(e))) => {
                tracing::debug!(error = %e, "ws receive failed");
                break;
            }
            Step::Incoming(Some(Ok(_))) => continue,
            Step::Changed => WsMessage::event(json!({ "view": session.view(Utc::now()) })),
        };

        if send(&mut ws_tx, &outgoing).await.is_err() {
            break;
        }
    }

    tracing::debug!(monitor_open = session.is_monitor_open(), "ws connection closed");
}

async fn send<S>(ws_tx: &mut S, msg: &WsMessage) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let Ok(text) = serde_json::to_string(msg) else {
        return Err(());
    };
    ws_tx.send(Message::text(text)).await.map_err(|_| ())
}

/// Parses one client envelope, applies it, and builds the reply.
pub(crate) async fn handle_text_message(text: &str, session: &mut DashboardSession) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = MonitorError::InvalidRequest("malformed JSON".to_string());
        return error_reply(String::new(), &err, session);
    };

    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(e) => {
            let err = MonitorError::InvalidRequest(format!("unknown command: {e}"));
            return error_reply(msg.id, &err, session);
        }
    };

    let name = command.name();
    match dispatch(session, command).await {
        Ok(()) => WsMessage::new(
            msg.id,
            WsMessageType::Response,
            json!({ "command": name, "view": session.view(Utc::now()) }),
        ),
        Err(err) => {
            tracing::debug!(command = name, error = %err, "ws command rejected");
            error_reply(msg.id, &err, session)
        }
    }
}

fn error_reply(id: String, err: &MonitorError, session: &DashboardSession) -> WsMessage {
    let body = err.to_body();
    WsMessage::new(
        id,
        WsMessageType::Error,
        json!({
            "code": body.code,
            "message": body.message,
            "view": session.view(Utc::now()),
        }),
    )
}

async fn dispatch(session: &mut DashboardSession, command: WsCommand) -> Result<(), MonitorError> {
    match command {
        WsCommand::GetView => {}
        WsCommand::OpenMonitor => {
            session.open_monitor();
        }
        WsCommand::CloseMonitor => {
            session.close_monitor();
        }
        WsCommand::Retry => session.retry(),
        WsCommand::SetTab { tab } => session.monitor_mut()?.set_tab(tab),
        WsCommand::Search { term } => session.monitor_mut()?.search(term),
        WsCommand::SetStatusFilter { status } => {
            let status = StatusFilter::parse(&status)?;
            session.monitor_mut()?.set_status_filter(status);
        }
        WsCommand::SetSeverityFilter { severity } => {
            let severity = SeverityFilter::parse(&severity)?;
            session.monitor_mut()?.set_severity_filter(severity);
        }
        WsCommand::SetMaxResults { max_results } => {
            session.monitor_mut()?.set_max_results(max_results);
        }
        WsCommand::OpenDetails { purchase_id } => {
            session.monitor_mut()?.open_details(&purchase_id).await?;
        }
        WsCommand::CloseDetails => session.monitor_mut()?.close_details(),
        WsCommand::TogglePayload => session.monitor_mut()?.toggle_payload()?,
        WsCommand::ResolveAlert { alert_id, notes } => {
            session.monitor_mut()?.resolve_alert(&alert_id, &notes).await?;
        }
        WsCommand::SetAutoRefresh { enabled } => session.monitor_mut()?.set_auto_refresh(enabled),
        WsCommand::RefreshStats => session.monitor_mut()?.refresh_stats().await,
        WsCommand::DismissNotice => session.monitor_mut()?.dismiss_notice(),
    }
    Ok(())
}
