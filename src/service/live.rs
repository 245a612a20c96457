//! Live queries: a store query kept current by the change feed.
//!
//! A [`LiveQuery`] owns one tokio task. The task subscribes to the store's
//! change feed *before* the initial read, publishes each result through a
//! `watch` channel as a [`SubscriptionState`], and re-reads the whole query
//! whenever a change for its collection arrives. Results are always full
//! replacements; nothing is patched incrementally. A resync marker or a
//! lagged receiver counts as a change.
//!
//! A failed read ends the task in [`SubscriptionState::Failed`]. There is no
//! automatic retry; the owner drops the query and spawns a new one.
//!
//! Dropping a [`LiveQuery`] aborts its task and releases its bus receiver.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::domain::DocumentChange;
use crate::store::{Document, DocumentStore, Query};

/// Lifecycle of a subscription, as seen by its consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum SubscriptionState<T> {
    /// No snapshot has arrived yet.
    Loading,
    /// Latest snapshot.
    Ready(T),
    /// The subscription failed and stopped.
    Failed(String),
}

impl<T> SubscriptionState<T> {
    /// `true` until the first snapshot or failure.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// `true` once the subscription has failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The latest snapshot, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    /// The failure message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// A query whose results follow the store.
#[derive(Debug)]
pub struct LiveQuery<T> {
    state: Arc<watch::Sender<SubscriptionState<T>>>,
    receiver: watch::Receiver<SubscriptionState<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Send + Sync + 'static,
{
    /// Starts a live query. `map` turns each result set into the published
    /// value.
    pub fn spawn<F>(store: Arc<dyn DocumentStore>, query: Query, map: F) -> Self
    where
        F: Fn(Vec<Document>) -> T + Send + Sync + 'static,
    {
        let (sender, receiver) = watch::channel(SubscriptionState::Loading);
        let state = Arc::new(sender);
        let changes = store.changes();
        let task = tokio::spawn(run(store, query, map, Arc::clone(&state), changes));
        Self {
            state,
            receiver,
            task,
        }
    }

    /// Applies a local edit to the current snapshot and notifies watchers.
    ///
    /// Does nothing unless the query is [`SubscriptionState::Ready`]. The
    /// next re-read replaces the edited value.
    pub fn modify(&self, edit: impl FnOnce(&mut T)) {
        self.state.send_if_modified(|state| match state {
            SubscriptionState::Ready(value) => {
                edit(value);
                true
            }
            _ => false,
        });
    }

    /// Borrows the current state.
    #[must_use]
    pub fn borrow(&self) -> watch::Ref<'_, SubscriptionState<T>> {
        self.receiver.borrow()
    }

    /// Waits until a new state is published.
    pub async fn changed(&mut self) {
        if self.receiver.changed().await.is_err() {
            // The sender lives in `self`; this branch is unreachable while
            // the query exists.
            std::future::pending::<()>().await;
        }
    }
}

impl<T: Clone> LiveQuery<T> {
    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> SubscriptionState<T> {
        self.receiver.borrow().clone()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T, F>(
    store: Arc<dyn DocumentStore>,
    query: Query,
    map: F,
    state: Arc<watch::Sender<SubscriptionState<T>>>,
    mut changes: broadcast::Receiver<DocumentChange>,
) where
    F: Fn(Vec<Document>) -> T,
{
    loop {
        match store.query(&query).await {
            Ok(docs) => {
                state.send_replace(SubscriptionState::Ready(map(docs)));
            }
            Err(e) => {
                tracing::warn!(
                    collection = %query.collection,
                    error = %e,
                    "live query failed"
                );
                state.send_replace(SubscriptionState::Failed(e.to_string()));
                return;
            }
        }

        if !wait_for_change(&query, &mut changes).await {
            return;
        }
    }
}

/// Waits for a change touching the query's collection, then drains any
/// queued changes so a burst of writes causes one re-read.
///
/// Returns `false` when the bus is closed.
async fn wait_for_change(query: &Query, changes: &mut broadcast::Receiver<DocumentChange>) -> bool {
    loop {
        match changes.recv().await {
            Ok(change) if change.collection == query.collection => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(
                    collection = %query.collection,
                    skipped,
                    "live query lagged, re-reading"
                );
                break;
            }
            Err(RecvError::Closed) => return false,
        }
    }
    loop {
        match changes.try_recv() {
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(broadcast::error::TryRecvError::Empty) => return true,
            Err(broadcast::error::TryRecvError::Closed) => return false,
        }
    }
}
