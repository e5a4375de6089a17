//! In-memory document store backend.
//!
//! Keeps every collection in a [`DashMap`] and fans out document changes on a
//! per-document broadcast channel, so each subscriber observes the document's
//! successive versions in order, its own writes included. Slow subscribers
//! that lag behind skip to the newest retained version rather than stalling
//! the writer.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use futures::StreamExt;
use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use crate::store::{Document, DocumentStore, DocumentStream, StoreError, StoreResult};

/// Versions retained per document for laggy subscribers.
const CHANGE_BUFFER: usize = 16;

struct Entry {
    document: Document,
    changes: broadcast::Sender<Document>,
}

impl Entry {
    fn new(document: Document) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self { document, changes }
    }
}

/// Process-local [`DocumentStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, DashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> BoxFuture<'static, StoreResult<Option<Document>>> {
        let store = self.clone();
        let collection = collection.to_owned();
        let id = id.to_owned();
        Box::pin(async move {
            let document = store
                .collections
                .get(&collection)
                .and_then(|docs| docs.get(&id).map(|entry| entry.document.clone()));
            Ok(document)
        })
    }

    fn create(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        let collection = collection.to_owned();
        let id = id.to_owned();
        Box::pin(async move {
            let docs = store.collections.entry(collection.clone()).or_default();
            match docs.entry(id.clone()) {
                MapEntry::Occupied(_) => Err(StoreError::already_exists(&collection, &id)),
                MapEntry::Vacant(slot) => {
                    slot.insert(Entry::new(document));
                    Ok(())
                }
            }
        })
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        let collection = collection.to_owned();
        let id = id.to_owned();
        Box::pin(async move {
            let Some(docs) = store.collections.get(&collection) else {
                return Err(StoreError::not_found(&collection, &id));
            };
            let Some(mut entry) = docs.get_mut(&id) else {
                return Err(StoreError::not_found(&collection, &id));
            };

            for (key, value) in fields {
                entry.document.insert(key, value);
            }
            // Broadcast while the entry lock is held so subscribers see
            // versions in write order.
            let _ = entry.changes.send(entry.document.clone());
            Ok(())
        })
    }

    fn list(&self, collection: &str) -> BoxFuture<'static, StoreResult<Vec<Document>>> {
        let store = self.clone();
        let collection = collection.to_owned();
        Box::pin(async move {
            let documents = store
                .collections
                .get(&collection)
                .map(|docs| {
                    docs.iter()
                        .map(|entry| entry.document.clone())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            Ok(documents)
        })
    }

    fn subscribe(
        &self,
        collection: &str,
        id: &str,
    ) -> BoxFuture<'static, StoreResult<DocumentStream>> {
        let store = self.clone();
        let collection = collection.to_owned();
        let id = id.to_owned();
        Box::pin(async move {
            let Some(docs) = store.collections.get(&collection) else {
                return Err(StoreError::not_found(&collection, &id));
            };
            let Some(entry) = docs.get(&id) else {
                return Err(StoreError::not_found(&collection, &id));
            };

            // Snapshot and receiver are taken under the same entry guard, so
            // no version can slip between the initial delivery and the first
            // change notification.
            let current = entry.document.clone();
            let mut changes = BroadcastStream::new(entry.changes.subscribe());
            drop(entry);
            drop(docs);

            let stream = async_stream::stream! {
                yield Ok(current);
                while let Some(result) = changes.next().await {
                    match result {
                        Ok(document) => yield Ok(document),
                        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                            // Skip to the newest retained version but keep
                            // the subscription alive.
                            warn!(collection = %collection, id = %id, skipped, "subscriber lagged");
                        }
                    }
                }
            };
            Ok(stream.boxed())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .create("games", "g1", doc(json!({"phase": "start"})))
            .await
            .unwrap();

        let fetched = store.get("games", "g1").await.unwrap().unwrap();
        assert_eq!(fetched["phase"], json!("start"));
    }

    #[tokio::test]
    async fn create_fails_when_document_exists() {
        let store = MemoryStore::new();
        store.create("games", "g1", Document::new()).await.unwrap();

        let err = store.create("games", "g1", Document::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn update_merges_named_fields_only() {
        let store = MemoryStore::new();
        store
            .create("games", "g1", doc(json!({"phase": "start", "pot": 0})))
            .await
            .unwrap();

        store
            .update("games", "g1", doc(json!({"phase": "opening"})))
            .await
            .unwrap();

        let fetched = store.get("games", "g1").await.unwrap().unwrap();
        assert_eq!(fetched["phase"], json!("opening"));
        assert_eq!(fetched["pot"], json!(0));
    }

    #[tokio::test]
    async fn update_with_null_overwrites_the_field() {
        let store = MemoryStore::new();
        store
            .create("games", "g1", doc(json!({"selectedCategory": "sport"})))
            .await
            .unwrap();

        store
            .update("games", "g1", doc(json!({"selectedCategory": null})))
            .await
            .unwrap();

        let fetched = store.get("games", "g1").await.unwrap().unwrap();
        assert_eq!(fetched["selectedCategory"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("games", "nope", Document::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn subscribe_delivers_current_then_changes_in_order() {
        let store = MemoryStore::new();
        store
            .create("games", "g1", doc(json!({"pot": 0})))
            .await
            .unwrap();

        let mut stream = store.subscribe("games", "g1").await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first["pot"], json!(0));

        store
            .update("games", "g1", doc(json!({"pot": 40})))
            .await
            .unwrap();
        store
            .update("games", "g1", doc(json!({"pot": 60})))
            .await
            .unwrap();

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second["pot"], json!(40));
        let third = stream.next().await.unwrap().unwrap();
        assert_eq!(third["pot"], json!(60));
    }

    #[tokio::test]
    async fn subscribe_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = match store.subscribe("games", "nope").await {
            Ok(_) => panic!("expected subscribe to a missing document to fail"),
            Err(err) => err,
        };
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
