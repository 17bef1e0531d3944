//! In-memory document store, used by tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapter::{Document, DocumentStore, StoreError, StoreResult};

/// Process-local `DocumentStore` keyed by `(partition_key, id)`.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents across all partitions.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, id: &str, partition_key: &str) -> StoreResult<Document> {
        self.documents
            .read()
            .await
            .get(&(partition_key.to_string(), id.to_string()))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn upsert(&self, document: Document) -> StoreResult<()> {
        let key = (document.partition_key.clone(), document.id.clone());
        self.documents.write().await.insert(key, document);
        Ok(())
    }

    async fn delete(&self, id: &str, partition_key: &str) -> StoreResult<()> {
        self.documents
            .write()
            .await
            .remove(&(partition_key.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn query_by_doc_type(
        &self,
        partition_key: &str,
        doc_type: &str,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|document| {
                document.partition_key == partition_key
                    && document.doc_type.as_deref() == Some(doc_type)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn read_of_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store.read("nope", "user-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn upsert_replaces_and_query_filters_by_partition_and_type() {
        let store = MemoryDocumentStore::new();
        store
            .upsert(Document::new(
                "a",
                "user-1",
                json!({ "docType": "sync_preset", "v": 1 }),
            ))
            .await
            .unwrap();
        store
            .upsert(Document::new(
                "a",
                "user-1",
                json!({ "docType": "sync_preset", "v": 2 }),
            ))
            .await
            .unwrap();
        store
            .upsert(Document::new(
                "b",
                "user-1",
                json!({ "docType": "sync_meta" }),
            ))
            .await
            .unwrap();
        store
            .upsert(Document::new(
                "a",
                "user-2",
                json!({ "docType": "sync_preset" }),
            ))
            .await
            .unwrap();

        let docs = store.query_by_doc_type("user-1", "sync_preset").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body["v"], json!(2));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn delete_of_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        store
            .upsert(Document::new("a", "user-1", json!({})))
            .await
            .unwrap();
        store.delete("a", "user-1").await.unwrap();
        let err = store.delete("a", "user-1").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
