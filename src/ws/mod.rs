//! WebSocket layer: connection handling and the dashboard command protocol.
//!
//! The endpoint at `/ws` gives each client its own dashboard session.
//! Clients send `command` envelopes and receive `response`/`error` replies
//! carrying the rendered view, plus `event` envelopes whenever the
//! underlying data changes.

pub mod connection;
pub mod handler;
pub mod messages;
