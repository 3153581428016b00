//! In-memory document store.
//!
//! Single process only; data is lost on restart. Writes fan out over a
//! broadcast channel and each watch runs in its own task.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

use folio_core::StoreError;
use folio_core::document::{ChangeEvent, Document, DocumentId, Fields, Query};
use folio_core::ports::{DocumentStore, SnapshotStream, Subscription};

type Collections = HashMap<String, BTreeMap<DocumentId, Document>>;

/// In-memory document store with live queries.
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    changes: broadcast::Sender<ChangeEvent>,
    buffer_size: usize,
}

impl InMemoryDocumentStore {
    pub fn new(buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        let (changes, _) = broadcast::channel(buffer_size.max(16));
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            changes,
            buffer_size,
        }
    }

    async fn run_query(collections: &RwLock<Collections>, query: &Query) -> Vec<Document> {
        let collections = collections.read().await;
        match collections.get(&query.collection) {
            Some(docs) => query.apply(docs.values().cloned()),
            None => Vec::new(),
        }
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers just means no live queries.
        let _ = self.changes.send(event);
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let doc = Document::new(id.clone(), fields);

        // Publish under the write lock so watchers see events in write order.
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc.clone());
        self.publish(ChangeEvent {
            collection: collection.to_string(),
            id: id.clone(),
            before: None,
            after: Some(doc),
        });

        tracing::debug!(collection = %collection, id = %id, "Document added");
        Ok(id)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let before = docs.get(id).cloned();
        let mut after = before
            .clone()
            .unwrap_or_else(|| Document::new(id, Fields::new()));
        after.merge(fields);
        docs.insert(id.to_string(), after.clone());

        if before.is_none() {
            tracing::debug!(collection = %collection, id = %id, "Merge created a new document");
        }

        self.publish(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            before,
            after: Some(after),
        });
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));

        match removed {
            Some(before) => {
                self.publish(ChangeEvent {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    before: Some(before),
                    after: None,
                });
                tracing::debug!(collection = %collection, id = %id, "Document deleted");
            }
            None => tracing::debug!(collection = %collection, id = %id, "Delete of missing document"),
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        Ok(Self::run_query(&self.collections, query).await)
    }

    async fn watch(&self, query: Query) -> Result<SnapshotStream, StoreError> {
        // Subscribe before reading so no write slips between the two.
        let mut changes = self.changes.subscribe();
        let initial = Self::run_query(&self.collections, &query).await;

        let (tx, rx) = mpsc::channel(self.buffer_size);
        tx.try_send(Ok(initial))
            .map_err(|e| StoreError::Subscription(e.to_string()))?;

        let collections = Arc::clone(&self.collections);
        tokio::spawn(async move {
            tracing::debug!(query = %query, "Watch started");

            loop {
                let resync = tokio::select! {
                    _ = tx.closed() => break,
                    event = changes.recv() => match event {
                        Ok(change) => change.affects(&query),
                        Err(broadcast::error::RecvError::Lagged(count)) => {
                            tracing::warn!(query = %query, lagged = count, "Watch lagged, resending snapshot");
                            true
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };

                if resync {
                    let snapshot = Self::run_query(&collections, &query).await;
                    if tx.send(Ok(snapshot)).await.is_err() {
                        break;
                    }
                }
            }

            tracing::debug!(query = %query, "Watch closed");
        });

        Ok(Subscription::from_receiver(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use folio_core::document::{Direction, Value};

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    async fn expect_quiet(sub: &mut SnapshotStream) {
        let next = tokio::time::timeout(Duration::from_millis(50), sub.next_snapshot()).await;
        assert!(next.is_err(), "unexpected snapshot: {next:?}");
    }

    async fn next(sub: &mut SnapshotStream) -> Vec<Document> {
        tokio::time::timeout(Duration::from_secs(1), sub.next_snapshot())
            .await
            .expect("snapshot in time")
            .expect("watch still open")
            .expect("snapshot ok")
    }

    #[tokio::test]
    async fn test_add_query_delete() {
        let store = InMemoryDocumentStore::default();
        let id = store
            .add("posts", fields(&[("slug", "a"), ("locale", "en")]))
            .await
            .unwrap();

        let found = store
            .query(&Query::collection("posts").where_eq("slug", "a"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);

        store.delete("posts", &id).await.unwrap();
        store.delete("posts", &id).await.unwrap();
        assert!(store.query(&Query::collection("posts")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields_and_upserts() {
        let store = InMemoryDocumentStore::default();
        let id = store
            .add("posts", fields(&[("title", "Old"), ("slug", "a")]))
            .await
            .unwrap();

        store.merge("posts", &id, fields(&[("title", "New")])).await.unwrap();
        store.merge("posts", "ghost", fields(&[("title", "Ghost")])).await.unwrap();

        let docs = store.query(&Query::collection("posts")).await.unwrap();
        let updated = docs.iter().find(|d| d.id == id).unwrap();
        assert_eq!(updated.get_str("title"), Some("New"));
        assert_eq!(updated.get_str("slug"), Some("a"));
        assert!(docs.iter().any(|d| d.id == "ghost"));
    }

    #[tokio::test]
    async fn test_watch_emits_initial_then_matching_changes_only() {
        let store = InMemoryDocumentStore::default();
        store
            .add("posts", fields(&[("locale", "en"), ("slug", "first")]))
            .await
            .unwrap();

        let query = Query::collection("posts")
            .where_eq("locale", "en")
            .order_by("slug", Direction::Ascending);
        let mut sub = store.watch(query).await.unwrap();

        assert_eq!(next(&mut sub).await.len(), 1);

        store
            .add("posts", fields(&[("locale", "fr"), ("slug", "autre")]))
            .await
            .unwrap();
        store
            .add("pages", fields(&[("locale", "en"), ("slug", "about")]))
            .await
            .unwrap();
        expect_quiet(&mut sub).await;

        let id = store
            .add("posts", fields(&[("locale", "en"), ("slug", "second")]))
            .await
            .unwrap();
        let snapshot = next(&mut sub).await;
        let slugs: Vec<_> = snapshot.iter().filter_map(|d| d.get_str("slug")).collect();
        assert_eq!(slugs, vec!["first", "second"]);

        // Moving a document out of the match set is a change to it.
        store.merge("posts", &id, fields(&[("locale", "fr")])).await.unwrap();
        assert_eq!(next(&mut sub).await.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_watch_stops_task() {
        let store = InMemoryDocumentStore::default();
        let sub = store.watch(Query::collection("posts")).await.unwrap();
        assert_eq!(store.changes.receiver_count(), 1);

        sub.close();
        // The watcher notices on its next poll.
        for _ in 0..20 {
            if store.changes.receiver_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.changes.receiver_count(), 0);
    }
}
