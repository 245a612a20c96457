//! In-process document store.
//!
//! [`MemoryDocumentStore`] keeps every collection in a `BTreeMap` behind one
//! [`tokio::sync::RwLock`] and publishes a [`DocumentChange`] on the
//! [`EventBus`] after each write, once the lock is released.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, broadcast};

use super::document::apply_patch;
use super::{Document, DocumentStore, Query, StoreError, ensure_object};
use crate::domain::{ChangeKind, CollectionPath, DocumentChange, DocumentPath, EventBus};

/// Process-local [`DocumentStore`].
///
/// # Concurrency
///
/// - Reads of any collection run concurrently.
/// - Writes are serialized by the outer lock.
/// - Change notifications are published after the write lock is dropped.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionPath, BTreeMap<String, Value>>>,
    event_bus: EventBus,
}

impl MemoryDocumentStore {
    /// Creates an empty store publishing on `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            event_bus,
        }
    }

    /// Returns the bus this store publishes on.
    #[must_use]
    pub const fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &CollectionPath) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns `true` if the collection holds no documents.
    pub async fn is_empty(&self, collection: &CollectionPath) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let map = self.collections.read().await;
        let candidates: Vec<Document> = map
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default();
        drop(map);
        Ok(query.apply(candidates))
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let map = self.collections.read().await;
        Ok(map
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .map(|data| Document::new(path.id(), data.clone())))
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        ensure_object(path, &data)?;
        let mut map = self.collections.write().await;
        let previous = map
            .entry(path.collection().clone())
            .or_default()
            .insert(path.id().to_string(), data);
        drop(map);

        let kind = if previous.is_some() {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        self.event_bus.publish(DocumentChange::now(
            path.collection().clone(),
            path.id(),
            kind,
        ));
        Ok(())
    }

    async fn update(
        &self,
        path: &DocumentPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut map = self.collections.write().await;
        let data = map
            .get_mut(path.collection())
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        apply_patch(data, fields);
        drop(map);

        self.event_bus.publish(DocumentChange::now(
            path.collection().clone(),
            path.id(),
            ChangeKind::Updated,
        ));
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.event_bus.subscribe()
    }
}
