//! PostgreSQL implementation of the document store.
//!
//! Documents live in one `documents` table as JSONB. Writes do not publish
//! on the [`EventBus`] directly; a trigger announces every insert, update and
//! delete on the `document_changes` channel, and
//! [`PostgresDocumentStore::spawn_change_listener`] forwards those
//! notifications to the bus. Rows written by other processes (the webhook
//! writer) are therefore observed the same way as local writes.
//!
//! `NOTIFY` is not durable: anything sent while the listener connection is
//! down is gone. After every reconnect the listener publishes a
//! [`ChangeKind::Resync`] marker for each monitored collection so live
//! queries re-read instead of waiting for the next write.
//!
//! # Query pushdown
//!
//! Equality filters and the sort field's presence are evaluated in SQL.
//! Sorting and the limit are not, except for unsorted limited queries: the
//! writer stores timestamps as RFC 3339 strings, epoch milliseconds, or
//! `{seconds, nanos}` objects, and no single SQL ordering agrees with
//! [`Query::apply`] across all of them. Each read therefore fetches every
//! matching row and sorts it in Rust. That costs one pass over the filtered
//! collection per re-read, which is fine at webhook-log sizes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::{PgListener, PgPoolOptions};
use sqlx::types::Json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::document::apply_patch;
use super::{Document, DocumentStore, Query, StoreError, ensure_object};
use crate::config::MonitorConfig;
use crate::domain::{ChangeKind, CollectionPath, DocumentChange, DocumentPath, EventBus};

/// Notification channel written by the `notify_document_change` trigger.
pub const CHANGE_CHANNEL: &str = "document_changes";

/// Payload of a `document_changes` notification.
#[derive(Debug, Deserialize)]
struct ChangeNotification {
    collection: String,
    id: String,
    op: String,
}

impl ChangeNotification {
    fn into_change(self) -> Option<DocumentChange> {
        let kind = ChangeKind::from_trigger_op(&self.op)?;
        Some(DocumentChange::now(
            CollectionPath::new(self.collection),
            self.id,
            kind,
        ))
    }
}

/// PostgreSQL-backed [`DocumentStore`] using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    event_bus: EventBus,
}

impl PostgresDocumentStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database is unreachable.
    pub async fn connect(config: &MonitorConfig, event_bus: EventBus) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.database_connect_timeout())
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool, event_bus))
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Starts forwarding `document_changes` notifications onto the bus.
    ///
    /// On connection loss sqlx re-establishes the connection and re-issues
    /// `LISTEN`; the listener then publishes a resync for every monitored
    /// collection. After an error it waits `retry_delay` first. Malformed
    /// payloads are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the first `LISTEN` fails.
    pub async fn spawn_change_listener(
        &self,
        retry_delay: Duration,
    ) -> Result<JoinHandle<()>, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        let event_bus = self.event_bus.clone();

        Ok(tokio::spawn(async move {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        forward_notification(&event_bus, notification.payload());
                    }
                    Ok(None) => {
                        tracing::warn!("change listener connection lost, reconnected");
                        announce_resync(&event_bus);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "change listener failed");
                        tokio::time::sleep(retry_delay).await;
                        announce_resync(&event_bus);
                    }
                }
            }
        }))
    }
}

fn forward_notification(event_bus: &EventBus, payload: &str) {
    match serde_json::from_str::<ChangeNotification>(payload) {
        Ok(payload) => {
            if let Some(change) = payload.into_change() {
                event_bus.publish(change);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed change notification");
        }
    }
}

/// Makes every live query over a monitored collection re-read.
fn announce_resync(event_bus: &EventBus) -> usize {
    event_bus.publish_resync(CollectionPath::monitored())
}

/// Builds a `text[]` path for the `#>` operator from a dotted field path.
fn json_path(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

/// Renders the `SELECT` for `query`.
///
/// Placeholders: `$1` is the collection, then a path and a value per filter,
/// then the sort field path, then the limit (unsorted queries only).
fn select_sql(query: &Query) -> String {
    let mut sql = String::from("SELECT id, data FROM documents WHERE collection = $1");
    let mut arg = 2;
    for _ in &query.filters {
        sql.push_str(&format!(" AND data #> ${arg}::text[] = ${}::jsonb", arg + 1));
        arg += 2;
    }
    match (&query.order_by, query.limit) {
        (Some(_), _) => {
            sql.push_str(&format!(" AND jsonb_typeof(data #> ${arg}::text[]) <> 'null'"));
        }
        (None, Some(_)) => {
            sql.push_str(&format!(" ORDER BY id LIMIT ${arg}"));
        }
        (None, None) => {}
    }
    sql
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let sql = select_sql(query);
        let mut statement =
            sqlx::query_as::<_, (String, Json<Value>)>(&sql).bind(query.collection.as_str());
        for filter in &query.filters {
            statement = statement
                .bind(json_path(&filter.field))
                .bind(Json(filter.value.clone()));
        }
        match (&query.order_by, query.limit) {
            (Some(order), _) => statement = statement.bind(json_path(&order.field)),
            (None, Some(limit)) => {
                statement = statement.bind(i64::try_from(limit).unwrap_or(i64::MAX));
            }
            (None, None) => {}
        }

        let rows = statement.fetch_all(&self.pool).await?;
        Ok(query.apply(
            rows.into_iter()
                .map(|(id, Json(data))| Document::new(id, data)),
        ))
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(path.collection().as_str())
        .bind(path.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(data)| Document::new(path.id(), data)))
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        ensure_object(path, &data)?;
        sqlx::query(
            "INSERT INTO documents (collection, id, data, updated_at) VALUES ($1, $2, $3, now()) \
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
        )
        .bind(path.collection().as_str())
        .bind(path.id())
        .bind(Json(data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        path: &DocumentPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(path.collection().as_str())
        .bind(path.id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(Json(mut data)) = current else {
            return Err(StoreError::NotFound(path.to_string()));
        };
        apply_patch(&mut data, fields);

        sqlx::query(
            "UPDATE documents SET data = $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(path.collection().as_str())
        .bind(path.id())
        .bind(Json(data))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.event_bus.subscribe()
    }
}
