//! Type-safe collection and document paths.
//!
//! The external webhook writer owns the `shopifyWebhooks/*` layout, so the
//! collection names below must stay bit-exact.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Collection holding one document per processed purchase webhook.
pub const PURCHASES_COLLECTION: &str = "shopifyWebhooks/purchases/orders";

/// Collection holding operator alerts raised by the webhook writer.
pub const ALERTS_COLLECTION: &str = "shopifyWebhooks/alerts/active";

/// Collection holding one aggregate document per calendar day.
pub const DAILY_STATS_COLLECTION: &str = "shopifyWebhooks/stats/daily";

/// Maximum length of a document id in bytes.
const MAX_DOCUMENT_ID_LEN: usize = 1500;

/// Slash-separated path of a collection in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Creates a collection path from a raw string.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Purchase records collection.
    #[must_use]
    pub fn purchases() -> Self {
        Self::new(PURCHASES_COLLECTION)
    }

    /// Alert records collection.
    #[must_use]
    pub fn alerts() -> Self {
        Self::new(ALERTS_COLLECTION)
    }

    /// Daily stats collection.
    #[must_use]
    pub fn daily_stats() -> Self {
        Self::new(DAILY_STATS_COLLECTION)
    }

    /// The three collections written by the webhook writer.
    #[must_use]
    pub fn monitored() -> [Self; 3] {
        [Self::purchases(), Self::alerts(), Self::daily_stats()]
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path of the document `id` inside this collection.
    #[must_use]
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a single document: its collection plus an opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// Creates a document path.
    #[must_use]
    pub fn new(collection: CollectionPath, id: impl Into<String>) -> Self {
        collection.doc(id)
    }

    /// Collection that contains the document.
    #[must_use]
    pub const fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Document id within the collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Returns `true` if `id` can name a document: non-empty, no `/`, not
/// `.` or `..`, and at most 1500 bytes.
#[must_use]
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_DOCUMENT_ID_LEN
        && !id.contains('/')
        && id != "."
        && id != ".."
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn collection_paths_match_writer_layout() {
        assert_eq!(
            CollectionPath::purchases().as_str(),
            "shopifyWebhooks/purchases/orders"
        );
        assert_eq!(
            CollectionPath::alerts().as_str(),
            "shopifyWebhooks/alerts/active"
        );
        assert_eq!(
            CollectionPath::daily_stats().as_str(),
            "shopifyWebhooks/stats/daily"
        );
    }

    #[test]
    fn document_path_display() {
        let path = CollectionPath::daily_stats().doc("2026-10-18");
        assert_eq!(path.to_string(), "shopifyWebhooks/stats/daily/2026-10-18");
        assert_eq!(path.id(), "2026-10-18");
        assert_eq!(path.collection(), &CollectionPath::daily_stats());
    }

    #[test]
    fn document_id_validation() {
        assert!(is_valid_document_id("abc123"));
        assert!(!is_valid_document_id(""));
        assert!(!is_valid_document_id("a/b"));
        assert!(!is_valid_document_id(".."));
        assert!(!is_valid_document_id(&"x".repeat(1501)));
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&CollectionPath::alerts()).unwrap_or_default();
        assert_eq!(json, "\"shopifyWebhooks/alerts/active\"");
    }
}
