//! Change feed shared by stores and live queries.
//!
//! Stores publish one [`DocumentChange`] per observed write. Live queries
//! only care about *which collection* moved, so a burst of changes or a
//! [`ChangeKind::Resync`] marker both end in a single re-read.

use tokio::sync::broadcast;

use super::{ChangeKind, CollectionPath, DocumentChange};

/// Fan-out channel for [`DocumentChange`]s.
///
/// A receiver that falls more than `capacity` changes behind loses the
/// oldest ones and sees `RecvError::Lagged`, which live queries treat like a
/// resync.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DocumentChange>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` changes per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announces a write. Returns how many subscribers were reached; with
    /// none the change is dropped.
    pub fn publish(&self, change: DocumentChange) -> usize {
        if change.kind != ChangeKind::Resync {
            tracing::trace!(
                collection = %change.collection,
                id = %change.document_id,
                kind = change.kind.as_str(),
                "document changed"
            );
        }
        self.sender.send(change).unwrap_or(0)
    }

    /// Tells subscribers of each collection that changes may have been
    /// missed and the collection must be re-read.
    ///
    /// Returns the number of markers published.
    pub fn publish_resync<I>(&self, collections: I) -> usize
    where
        I: IntoIterator<Item = CollectionPath>,
    {
        let mut published = 0;
        for collection in collections {
            tracing::debug!(%collection, "resync");
            self.publish(DocumentChange::resync(collection));
            published += 1;
        }
        published
    }

    /// Subscribes to changes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
