//! Persisted document shapes and id derivation for the sync partition.
//!
//! All of one user's documents live in the partition keyed by the user id.
//! Ids embed the user id so the same derivation works on every store that
//! requires globally unique ids within a container.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document-type discriminator for per-preset sync documents.
pub const SYNC_PRESET_DOC_TYPE: &str = "sync_preset";
/// Document-type discriminator for the per-user sync meta record.
pub const SYNC_META_DOC_TYPE: &str = "sync_meta";

pub fn sync_preset_doc_id(user_id: &str, preset_id: &str) -> String {
    format!("sync:preset:{user_id}:{preset_id}")
}

pub fn sync_meta_doc_id(user_id: &str) -> String {
    format!("sync:meta:{user_id}")
}

/// Id of the legacy monolithic snapshot document (pre-migration format).
pub fn sync_snapshot_doc_id(user_id: &str) -> String {
    format!("sync:{user_id}")
}

pub fn entitlement_doc_id(user_id: &str) -> String {
    format!("entitlement:{user_id}")
}

/// One preset plus its sales ledger, stamped with the version and timestamp
/// of the write that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPresetDocument {
    pub id: String,
    pub doc_type: String,
    pub user_id: String,
    pub preset_id: String,
    pub preset: Value,
    #[serde(default)]
    pub sales: Vec<Value>,
    #[serde(default)]
    pub version: i64,
    pub updated_at: String,
}

/// Per-user singleton carrying the authoritative version/timestamp. Written
/// only on accepted changes, deleted only by full account erasure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetaDocument {
    pub id: String,
    pub doc_type: String,
    pub user_id: String,
    #[serde(default)]
    pub version: i64,
    pub updated_at: String,
}

/// Logical read view of a user's full sync state: all presets, all sales,
/// and the highest version/timestamp observed. Derived from per-preset
/// documents when any exist, otherwise read verbatim from the legacy
/// monolithic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub presets: Vec<Value>,
    pub sales_by_preset: BTreeMap<String, Vec<Value>>,
    pub version: i64,
    pub updated_at: Option<String>,
}

impl SyncSnapshot {
    /// Default snapshot for users with no synced state yet.
    pub fn empty() -> Self {
        Self {
            presets: Vec::new(),
            sales_by_preset: BTreeMap::new(),
            version: 0,
            updated_at: None,
        }
    }
}

/// Per-user pro-access flag, maintained by the entitlements flow and read
/// here because it gates sync eligibility in the wider app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementDocument {
    pub id: String,
    pub user_id: String,
    pub has_pro_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_source: Option<String>,
    pub updated_at: String,
}
