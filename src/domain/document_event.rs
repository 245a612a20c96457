//! Change notifications emitted by document stores.
//!
//! Every write observed by a store publishes a [`DocumentChange`] through the
//! [`super::EventBus`]. Live queries re-read their collection when a change
//! for it arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CollectionPath;

/// Kind of write that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A new document was written.
    Created,
    /// An existing document was replaced or patched.
    Updated,
    /// A document was removed (only observed from external writers).
    Deleted,
    /// Changes to the collection may have been missed; re-read it.
    Resync,
}

impl ChangeKind {
    /// Maps a PostgreSQL trigger operation (`TG_OP`) to a change kind.
    #[must_use]
    pub fn from_trigger_op(op: &str) -> Option<Self> {
        match op {
            "INSERT" => Some(Self::Created),
            "UPDATE" => Some(Self::Updated),
            "DELETE" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Resync => "resync",
        }
    }
}

/// A single document write, as seen by subscribers.
///
/// [`ChangeKind::Resync`] changes name no document; their `document_id` is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChange {
    /// Collection the document lives in.
    pub collection: CollectionPath,
    /// Id of the written document.
    pub document_id: String,
    /// What happened to the document.
    pub kind: ChangeKind,
    /// When the change was observed.
    pub timestamp: DateTime<Utc>,
}

impl DocumentChange {
    /// Creates a change stamped with the current time.
    #[must_use]
    pub fn now(collection: CollectionPath, document_id: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            collection,
            document_id: document_id.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Creates a resync marker for a whole collection.
    #[must_use]
    pub fn resync(collection: CollectionPath) -> Self {
        Self::now(collection, String::new(), ChangeKind::Resync)
    }
}
