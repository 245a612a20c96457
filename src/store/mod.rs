//! Document store abstraction and its backends.
//!
//! [`DocumentStore`] is the seam between the repository and the managed
//! document database: collection queries, point reads, point writes, and a
//! change feed. Two backends are provided:
//!
//! - [`MemoryDocumentStore`]: process-local, used by default and in tests.
//! - [`PostgresDocumentStore`]: JSONB rows in PostgreSQL with change
//!   notifications delivered through `LISTEN/NOTIFY`, so writes made by the
//!   external webhook writer are observed live.

pub mod document;
pub mod memory;
pub mod postgres;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::domain::{DocumentChange, DocumentPath};

pub use document::Document;
pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{Direction, Query};

/// Errors raised by store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Document data was not a JSON object.
    #[error("invalid document {path}: {reason}")]
    InvalidDocument {
        /// Document path.
        path: String,
        /// Why the document was rejected.
        reason: String,
    },

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure (connection, query, transaction).
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A schemaless document database with a change feed.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Runs a collection query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on transport failure.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Reads one document, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on transport failure.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Creates or replaces a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if `data` is not an object,
    /// or [`StoreError::Backend`] on transport failure.
    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError>;

    /// Patches an existing document. Keys are dotted field paths.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist, or
    /// [`StoreError::Backend`] on transport failure.
    async fn update(&self, path: &DocumentPath, fields: Map<String, Value>)
    -> Result<(), StoreError>;

    /// Subscribes to all future document changes.
    fn changes(&self) -> broadcast::Receiver<DocumentChange>;
}

/// Rejects non-object document bodies.
fn ensure_object(path: &DocumentPath, data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument {
            path: path.to_string(),
            reason: "document data must be a JSON object".to_string(),
        })
    }
}
