//! Document store port - abstraction over the hosted document database.

use async_trait::async_trait;

use super::Subscription;
use crate::document::{Document, DocumentId, Fields, Query};
use crate::error::StoreError;

/// Live snapshots of a query's full result set.
pub type SnapshotStream = Subscription<Vec<Document>, StoreError>;

/// Document store trait - schemaless collections with live queries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for diagnostics (`memory`, `redis`, ...).
    fn backend(&self) -> &'static str;

    /// Insert a new document under a store-assigned id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError>;

    /// Merge fields into a document; supplied keys overwrite, others stay.
    /// A missing document is created from the supplied fields.
    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run a query once.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Run a query live. The current result set is the first snapshot.
    async fn watch(&self, query: Query) -> Result<SnapshotStream, StoreError>;
}
