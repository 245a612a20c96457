//! webhook-monitor server entry point.
//!
//! Loads configuration, picks the document store, and starts the Axum
//! HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use webhook_monitor::app::build_app;
use webhook_monitor::app_state::AppState;
use webhook_monitor::config::{LogFormat, MonitorConfig};
use webhook_monitor::domain::EventBus;
use webhook_monitor::monitor::MonitorSettings;
use webhook_monitor::service::WebhookRepository;
use webhook_monitor::store::{DocumentStore, MemoryDocumentStore, PostgresDocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MonitorConfig::from_env().context("loading configuration")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting webhook-monitor");

    let event_bus = EventBus::new(config.event_bus_capacity);

    let (store, store_backend): (Arc<dyn DocumentStore>, &'static str) =
        if config.persistence_enabled {
            let store = PostgresDocumentStore::connect(&config, event_bus.clone())
                .await
                .context("connecting to PostgreSQL")?;
            store.migrate().await.context("running migrations")?;
            // Detached: lives as long as the process.
            let _listener = store
                .spawn_change_listener(config.database_connect_timeout())
                .await
                .context("starting change listener")?;
            tracing::info!("using PostgreSQL document store");
            (Arc::new(store) as Arc<dyn DocumentStore>, "postgres")
        } else {
            tracing::warn!("persistence disabled, using in-memory document store");
            (
                Arc::new(MemoryDocumentStore::new(event_bus)) as Arc<dyn DocumentStore>,
                "memory",
            )
        };

    let state = AppState {
        repository: WebhookRepository::new(store, config.alert_resolved_by.clone()),
        settings: MonitorSettings::from(&config),
        storefront: config.storefront.clone(),
        store_backend,
    };
    if !state.storefront.is_configured() {
        tracing::warn!("storefront settings are incomplete");
    }

    let app = build_app(state, config.request_timeout());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
