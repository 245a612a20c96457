//! Shared harness: an in-memory store behind a live server on an
//! ephemeral port.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use webhook_monitor::app::build_app;
use webhook_monitor::app_state::AppState;
use webhook_monitor::config::StorefrontConfig;
use webhook_monitor::domain::{CollectionPath, EventBus};
use webhook_monitor::monitor::MonitorSettings;
use webhook_monitor::service::WebhookRepository;
use webhook_monitor::store::{DocumentStore, MemoryDocumentStore};

/// Running server plus the store behind it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryDocumentStore>,
}

pub async fn spawn_server() -> TestServer {
    let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
    let state = AppState {
        repository: WebhookRepository::new(Arc::clone(&store) as Arc<dyn DocumentStore>, "ops"),
        settings: MonitorSettings {
            stats_refresh_interval: Duration::from_secs(3600),
            ..MonitorSettings::default()
        },
        storefront: StorefrontConfig::new(None, None),
        store_backend: "memory",
    };
    let app = build_app(state, Duration::from_secs(5));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    TestServer { addr, store }
}

pub async fn seed(store: &MemoryDocumentStore, collection: CollectionPath, id: &str, data: Value) {
    let Ok(()) = store.set(&collection.doc(id), data).await else {
        panic!("seed {id} failed");
    };
}
