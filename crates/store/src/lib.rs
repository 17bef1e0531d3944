//! Document-store boundary and per-user sync repository.
//!
//! The store itself is an external collaborator: a partitioned key-value
//! document store addressed by `(id, partition_key)`. This crate owns the
//! trait describing that boundary, an in-memory implementation, the persisted
//! document shapes, and the repository that reconciles incoming snapshots
//! against persisted per-preset documents.

mod adapter;
mod documents;
mod memory;
mod sync_repository;

pub use adapter::{Document, DocumentStore, StoreError, StoreResult};
pub use documents::{
    entitlement_doc_id, sync_meta_doc_id, sync_preset_doc_id, sync_snapshot_doc_id,
    EntitlementDocument, SyncMetaDocument, SyncPresetDocument, SyncSnapshot, SYNC_META_DOC_TYPE,
    SYNC_PRESET_DOC_TYPE,
};
pub use memory::MemoryDocumentStore;
pub use sync_repository::{SyncChangeSummary, SyncRepository, EPOCH_FLOOR};
