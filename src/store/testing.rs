//! Fault-injecting store wrapper for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::{Document, DocumentStore, MemoryDocumentStore, Query, StoreError};
use crate::domain::{CollectionPath, DocumentChange, DocumentPath, EventBus};

/// Wraps a [`MemoryDocumentStore`] and fails selected operations on demand.
///
/// Subscribers listen on [`FaultyStore::feed`], not on the inner store's bus.
/// Writes are relayed to the feed unless [`FaultyStore::drop_changes`] is set.
#[derive(Debug)]
pub(crate) struct FaultyStore {
    pub(crate) inner: MemoryDocumentStore,
    feed: EventBus,
    tap: std::sync::Mutex<broadcast::Receiver<DocumentChange>>,
    drop_changes: AtomicBool,
    fail_queries_on: std::sync::Mutex<Option<CollectionPath>>,
    fail_updates: AtomicBool,
    fail_gets: AtomicBool,
}

impl FaultyStore {
    pub(crate) fn new() -> Arc<Self> {
        let inner = MemoryDocumentStore::new(EventBus::new(256));
        let tap = std::sync::Mutex::new(inner.changes());
        Arc::new(Self {
            inner,
            feed: EventBus::new(256),
            tap,
            drop_changes: AtomicBool::new(false),
            fail_queries_on: std::sync::Mutex::new(None),
            fail_updates: AtomicBool::new(false),
            fail_gets: AtomicBool::new(false),
        })
    }

    /// The bus subscribers of this store listen on.
    pub(crate) const fn feed(&self) -> &EventBus {
        &self.feed
    }

    /// Stops (or resumes) relaying write notifications, as if they were lost.
    pub(crate) fn drop_changes(&self, lost: bool) {
        self.drop_changes.store(lost, Ordering::SeqCst);
    }

    fn relay_changes(&self) {
        let Ok(mut tap) = self.tap.lock() else {
            return;
        };
        while let Ok(change) = tap.try_recv() {
            if !self.drop_changes.load(Ordering::SeqCst) {
                self.feed.publish(change);
            }
        }
    }

    /// Makes queries against `collection` fail (`None` clears).
    pub(crate) fn fail_queries_on(&self, collection: Option<CollectionPath>) {
        if let Ok(mut guard) = self.fail_queries_on.lock() {
            *guard = collection;
        }
    }

    pub(crate) fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    fn query_fails(&self, collection: &CollectionPath) -> bool {
        self.fail_queries_on
            .lock()
            .map(|guard| guard.as_ref() == Some(collection))
            .unwrap_or(false)
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        if self.query_fails(&query.collection) {
            return Err(StoreError::Backend("permission denied".to_string()));
        }
        self.inner.query(query).await
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("unavailable".to_string()));
        }
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        self.inner.set(path, data).await?;
        self.relay_changes();
        Ok(())
    }

    async fn update(
        &self,
        path: &DocumentPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write rejected".to_string()));
        }
        self.inner.update(path, fields).await?;
        self.relay_changes();
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.feed.subscribe()
    }
}
