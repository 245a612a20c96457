//! Data Transfer Objects for REST request/response serialization.
//!
//! Row and badge shapes are shared with the WebSocket views
//! ([`crate::monitor::view`]) so both surfaces render identically.

pub mod alert_dto;
pub mod stats_dto;
pub mod webhook_dto;

pub use alert_dto::*;
pub use stats_dto::*;
pub use webhook_dto::*;
