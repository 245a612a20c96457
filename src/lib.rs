//! # webhook-monitor
//!
//! REST API and WebSocket monitor for the Shopify purchase webhook log.
//!
//! A separate webhook handler writes purchase records, alerts, and daily
//! counters into a document store. This crate is the read side: it serves
//! paged and filtered views of those records, keeps live views current for
//! connected admins, and lets them resolve alerts.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/) ── DashboardSession / MonitorSession (monitor/)
//!     │
//!     ├── WebhookRepository, LiveQuery, StatsPoller (service/)
//!     ├── Records, presentation, EventBus (domain/)
//!     │
//!     └── DocumentStore (store/)
//!             ├── MemoryDocumentStore
//!             └── PostgresDocumentStore ── LISTEN/NOTIFY → EventBus
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod service;
pub mod store;
pub mod ws;
