//! Redis-backed document store.
//!
//! Each collection is one hash (`{namespace}:{collection}`, field = document
//! id, value = JSON field map). Every write publishes a [`ChangeEvent`] on
//! `{namespace}:{collection}:changes`, which live queries listen to.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::mpsc;
use uuid::Uuid;

use folio_core::StoreError;
use folio_core::document::{ChangeEvent, Document, DocumentId, Fields, Query};
use folio_core::ports::{DocumentStore, SnapshotStream, Subscription};

/// Redis-backed document store.
pub struct RedisDocumentStore {
    conn: ConnectionManager,
    client: Client,
    namespace: String,
    buffer_size: usize,
}

fn connection_error(e: RedisError) -> StoreError {
    StoreError::Connection(e.to_string())
}

fn read_error(e: RedisError) -> StoreError {
    if e.is_connection_dropped() || e.is_io_error() {
        connection_error(e)
    } else {
        StoreError::Query(e.to_string())
    }
}

fn write_error(e: RedisError) -> StoreError {
    if e.is_connection_dropped() || e.is_io_error() {
        connection_error(e)
    } else {
        StoreError::Write(e.to_string())
    }
}

fn decode_document(id: String, raw: &str) -> Result<Document, StoreError> {
    let fields: Fields =
        serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(Document::new(id, fields))
}

/// Decode a whole collection hash. Entries that are not a JSON field map are
/// skipped with a warning so one bad row cannot fail every query.
fn decode_entries(raw: HashMap<String, String>) -> Vec<Document> {
    raw.into_iter()
        .filter_map(|(id, raw)| match decode_document(id.clone(), &raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Skipping undecodable document");
                None
            }
        })
        .collect()
}

impl RedisDocumentStore {
    pub async fn connect(
        url: &str,
        namespace: &str,
        connect_timeout: Duration,
        buffer_size: usize,
    ) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(connection_error)?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
            .map_err(connection_error)?;

        tracing::info!(namespace = %namespace, "Connected to Redis document store");

        Ok(Self {
            conn,
            client,
            namespace: namespace.to_string(),
            buffer_size: buffer_size.max(1),
        })
    }

    fn collection_key(&self, collection: &str) -> String {
        format!("{}:{}", self.namespace, collection)
    }

    fn changes_channel(&self, collection: &str) -> String {
        format!("{}:{}:changes", self.namespace, collection)
    }

    async fn load(
        conn: &mut ConnectionManager,
        key: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let raw: Option<String> = conn.hget(key, id).await.map_err(read_error)?;
        raw.map(|raw| decode_document(id.to_string(), &raw))
            .transpose()
    }

    async fn run_query(
        conn: &mut ConnectionManager,
        key: &str,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let raw: HashMap<String, String> = conn.hgetall(key).await.map_err(read_error)?;
        Ok(query.apply(decode_entries(raw)))
    }

    async fn write(&self, key: &str, doc: &Document) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&doc.fields)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, &doc.id, raw)
            .await
            .map_err(write_error)
    }

    async fn publish(&self, event: &ChangeEvent) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(event).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(self.changes_channel(&event.collection), payload)
            .await
            .map_err(write_error)
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        let doc = Document::new(Uuid::new_v4().simple().to_string(), fields);
        self.write(&self.collection_key(collection), &doc).await?;

        let id = doc.id.clone();
        self.publish(&ChangeEvent {
            collection: collection.to_string(),
            id: id.clone(),
            before: None,
            after: Some(doc),
        })
        .await?;

        tracing::debug!(collection = %collection, id = %id, "Document added");
        Ok(id)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let key = self.collection_key(collection);
        let mut conn = self.conn.clone();

        // Read-modify-write; concurrent writers race and the last one wins.
        let before = Self::load(&mut conn, &key, id).await?;
        let mut after = before
            .clone()
            .unwrap_or_else(|| Document::new(id, Fields::new()));
        after.merge(fields);
        self.write(&key, &after).await?;

        self.publish(&ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            before,
            after: Some(after),
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let key = self.collection_key(collection);
        let mut conn = self.conn.clone();

        let Some(before) = Self::load(&mut conn, &key, id).await? else {
            tracing::debug!(collection = %collection, id = %id, "Delete of missing document");
            return Ok(());
        };

        conn.hdel::<_, _, i64>(&key, id).await.map_err(write_error)?;
        self.publish(&ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            before: Some(before),
            after: None,
        })
        .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut conn = self.conn.clone();
        Self::run_query(&mut conn, &self.collection_key(&query.collection), query).await
    }

    async fn watch(&self, query: Query) -> Result<SnapshotStream, StoreError> {
        let key = self.collection_key(&query.collection);
        let channel = self.changes_channel(&query.collection);

        // Listen first, then read, so no write falls between the two.
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(connection_error)?;
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| StoreError::Subscription(e.to_string()))?;

        let mut conn = self.conn.clone();
        let initial = Self::run_query(&mut conn, &key, &query).await?;

        let (tx, rx) = mpsc::channel(self.buffer_size);
        tx.try_send(Ok(initial))
            .map_err(|e| StoreError::Subscription(e.to_string()))?;

        tokio::spawn(async move {
            tracing::debug!(channel = %channel, query = %query, "Watch started");
            let mut messages = pubsub.on_message();

            loop {
                let resync = tokio::select! {
                    _ = tx.closed() => break,
                    msg = messages.next() => match msg {
                        Some(msg) => {
                            let event = msg
                                .get_payload::<String>()
                                .map_err(|e| e.to_string())
                                .and_then(|payload| {
                                    serde_json::from_str::<ChangeEvent>(&payload)
                                        .map_err(|e| e.to_string())
                                });
                            match event {
                                Ok(event) => event.affects(&query),
                                Err(e) => {
                                    tracing::warn!(channel = %channel, error = %e, "Unreadable change event, resending snapshot");
                                    true
                                }
                            }
                        }
                        None => {
                            tracing::warn!(channel = %channel, "Change feed closed");
                            let _ = tx
                                .send(Err(StoreError::Subscription("change feed closed".to_string())))
                                .await;
                            break;
                        }
                    },
                };

                if resync {
                    let snapshot = Self::run_query(&mut conn, &key, &query).await;
                    if tx.send(snapshot).await.is_err() {
                        break;
                    }
                }
            }

            tracing::debug!(channel = %channel, "Watch closed");
        });

        Ok(Subscription::from_receiver(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::document::Value;

    async fn get_test_store() -> Option<RedisDocumentStore> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6389".to_string());
        let namespace = format!("folio-test-{}", Uuid::new_v4().simple());
        RedisDocumentStore::connect(&url, &namespace, Duration::from_secs(1), 8)
            .await
            .ok()
    }

    #[test]
    fn test_undecodable_entries_are_skipped() {
        let raw = HashMap::from([
            ("good".to_string(), r#"{"slug":{"stringValue":"hello"}}"#.to_string()),
            ("bad".to_string(), "not json".to_string()),
        ]);

        let docs = decode_entries(raw);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "good");
        assert_eq!(docs[0].get_str("slug"), Some("hello"));
    }

    #[tokio::test]
    async fn test_redis_watch_round() {
        let store = match get_test_store().await {
            Some(s) => s,
            None => return,
        };

        let query = Query::collection("posts").where_eq("locale", "en");
        let mut sub = store.watch(query).await.unwrap();
        assert!(sub.next_snapshot().await.unwrap().unwrap().is_empty());

        let fields = Fields::from([
            ("locale".to_string(), Value::from("en")),
            ("slug".to_string(), Value::from("hello")),
        ]);
        let id = store.add("posts", fields).await.unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(2), sub.next_snapshot())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);

        store.delete("posts", &id).await.unwrap();
        store.delete("posts", &id).await.unwrap();
        sub.close();
    }
}
