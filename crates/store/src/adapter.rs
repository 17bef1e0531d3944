//! Partitioned document-store boundary.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a document-store driver.
///
/// `NotFound` is a normal, expected outcome and stays distinguishable from
/// every other failure; callers decide where it is tolerable.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error from a driver-specific failure.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Generic envelope for persisted documents. Typed records serialize into
/// and out of `body`; `doc_type` discriminates document kinds sharing one
/// partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub partition_key: String,
    pub doc_type: Option<String>,
    pub body: Value,
}

impl Document {
    /// Build an envelope from a serialized record, lifting its `docType`
    /// discriminator (when present) for query filtering.
    pub fn new(id: impl Into<String>, partition_key: impl Into<String>, body: Value) -> Self {
        let doc_type = body
            .get("docType")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            id: id.into(),
            partition_key: partition_key.into(),
            doc_type,
            body,
        }
    }
}

/// Partitioned key-value document store.
///
/// Items are addressed by `(id, partition_key)`; all of one user's documents
/// share a partition keyed by the user id. Per-item writes are last-write-
/// wins; no multi-item atomicity is assumed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document. `Err(StoreError::NotFound)` when absent.
    async fn read(&self, id: &str, partition_key: &str) -> StoreResult<Document>;

    /// Insert or replace a document.
    async fn upsert(&self, document: Document) -> StoreResult<()>;

    /// Delete a document. `Err(StoreError::NotFound)` when absent.
    async fn delete(&self, id: &str, partition_key: &str) -> StoreResult<()>;

    /// All documents of one type within a partition. Implementations must
    /// return the complete set: backends with paginated queries own the
    /// page-exhaustion loop.
    async fn query_by_doc_type(
        &self,
        partition_key: &str,
        doc_type: &str,
    ) -> StoreResult<Vec<Document>>;
}
