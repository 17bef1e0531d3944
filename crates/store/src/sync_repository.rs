//! Per-user sync repository: snapshot assembly, incremental reconciliation,
//! account erasure, and entitlement access over the document-store boundary.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::debug;
use serde_json::Value;

use resellkit_core::sync::{
    calculate_preset_diff, normalize_incoming, PresetUnit, SyncPushPayload,
};

use crate::adapter::{Document, DocumentStore, StoreError, StoreResult};
use crate::documents::{
    entitlement_doc_id, sync_meta_doc_id, sync_preset_doc_id, sync_snapshot_doc_id,
    EntitlementDocument, SyncMetaDocument, SyncPresetDocument, SyncSnapshot, SYNC_META_DOC_TYPE,
    SYNC_PRESET_DOC_TYPE,
};

/// Floor timestamp used when no document carries one. Lexicographic
/// comparison of timestamps is valid because every write stamps the same
/// zero-padded ISO-8601 form.
pub const EPOCH_FLOOR: &str = "1970-01-01T00:00:00.000Z";

/// Which persisted format a user's state was read from. The legacy variant
/// survives only as a migration bridge for users who never pushed since the
/// per-preset format landed.
enum SnapshotSource {
    PerPreset(SyncSnapshot),
    Legacy(SyncSnapshot),
    Absent,
}

/// Outcome of one incremental push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncChangeSummary {
    pub changed: bool,
    pub upserted_count: usize,
    pub deleted_count: usize,
}

/// Repository scoping all sync and entitlement documents to one store.
///
/// The store handle is injected at construction and shared for the process
/// lifetime; the repository itself keeps no per-user state between calls.
#[derive(Clone)]
pub struct SyncRepository {
    store: Arc<dyn DocumentStore>,
}

impl SyncRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All per-preset documents in the user's partition.
    pub async fn get_preset_documents(&self, user_id: &str) -> StoreResult<Vec<Document>> {
        self.store
            .query_by_doc_type(user_id, SYNC_PRESET_DOC_TYPE)
            .await
    }

    async fn get_meta_body(&self, user_id: &str) -> StoreResult<Option<Value>> {
        match self.store.read(&sync_meta_doc_id(user_id), user_id).await {
            Ok(document) => Ok(Some(document.body)),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// The pre-migration monolithic snapshot, if one exists.
    pub async fn get_legacy_snapshot(&self, user_id: &str) -> StoreResult<Option<SyncSnapshot>> {
        match self
            .store
            .read(&sync_snapshot_doc_id(user_id), user_id)
            .await
        {
            Ok(document) => Ok(Some(snapshot_from_legacy_body(&document.body))),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Assemble the logical snapshot from per-preset documents, or `None`
    /// when the user has none. Read-only; never partially applies anything.
    ///
    /// The preset query and the meta read are independent and run
    /// concurrently. A missing meta record is tolerated (version 0, floor
    /// timestamp); any other read failure propagates.
    pub async fn assemble_from_preset_documents(
        &self,
        user_id: &str,
    ) -> StoreResult<Option<SyncSnapshot>> {
        let (preset_documents, meta_body) = tokio::join!(
            self.get_preset_documents(user_id),
            self.get_meta_body(user_id),
        );
        let preset_documents = preset_documents?;
        let meta_body = meta_body?;

        if preset_documents.is_empty() {
            return Ok(None);
        }

        let mut snapshot = SyncSnapshot::empty();
        let mut latest_updated_at = EPOCH_FLOOR.to_string();

        for document in &preset_documents {
            snapshot
                .presets
                .push(document.body.get("preset").cloned().unwrap_or(Value::Null));
            let preset_id = field_string(&document.body, "presetId").unwrap_or_default();
            snapshot
                .sales_by_preset
                .insert(preset_id, field_array(&document.body, "sales"));
            snapshot.version = snapshot.version.max(field_version(&document.body));
            if let Some(updated_at) = field_string(&document.body, "updatedAt") {
                if updated_at > latest_updated_at {
                    latest_updated_at = updated_at;
                }
            }
        }

        if let Some(meta) = &meta_body {
            snapshot.version = snapshot.version.max(field_version(meta));
            if let Some(updated_at) = field_string(meta, "updatedAt") {
                if updated_at > latest_updated_at {
                    latest_updated_at = updated_at;
                }
            }
        }

        snapshot.updated_at = Some(latest_updated_at);
        Ok(Some(snapshot))
    }

    /// Resolve which persisted format a user's state lives in. Once the
    /// per-preset migration has happened for a user, the legacy document is
    /// never consulted again.
    async fn resolve_snapshot(&self, user_id: &str) -> StoreResult<SnapshotSource> {
        if let Some(snapshot) = self.assemble_from_preset_documents(user_id).await? {
            return Ok(SnapshotSource::PerPreset(snapshot));
        }
        match self.get_legacy_snapshot(user_id).await? {
            Some(snapshot) => Ok(SnapshotSource::Legacy(snapshot)),
            None => Ok(SnapshotSource::Absent),
        }
    }

    /// Effective read view: per-preset documents when any exist, the legacy
    /// monolithic snapshot otherwise, `None` when neither exists.
    pub async fn get_effective_snapshot(&self, user_id: &str) -> StoreResult<Option<SyncSnapshot>> {
        Ok(match self.resolve_snapshot(user_id).await? {
            SnapshotSource::PerPreset(snapshot) | SnapshotSource::Legacy(snapshot) => {
                Some(snapshot)
            }
            SnapshotSource::Absent => None,
        })
    }

    /// Apply one push: diff the incoming units against persisted ones, write
    /// only the deltas, and write the meta record last and only when
    /// something actually changed. A no-op push therefore never bumps the
    /// version, so idle background re-pushes don't make every other client
    /// perceive a spurious update.
    ///
    /// The store offers no multi-item atomicity; a failure mid-loop leaves a
    /// partially applied partition. Every unit write is individually
    /// idempotent, so a client retry re-diffs against whatever landed and
    /// converges.
    pub async fn apply_incremental_sync(
        &self,
        user_id: &str,
        payload: &SyncPushPayload,
        new_version: i64,
        updated_at: &str,
    ) -> StoreResult<SyncChangeSummary> {
        let existing_documents = self.get_preset_documents(user_id).await?;
        let existing: Vec<PresetUnit> = existing_documents
            .iter()
            .map(|document| preset_unit_from_body(&document.body))
            .collect();
        let incoming = normalize_incoming(&payload.presets, &payload.sales_by_preset);
        let diff = calculate_preset_diff(&existing, &incoming);

        let incoming_by_id: HashMap<&str, &PresetUnit> = incoming
            .iter()
            .map(|unit| (unit.preset_id.as_str(), unit))
            .collect();

        let mut upserted_count = 0;
        for preset_id in &diff.upsert_ids {
            let Some(unit) = incoming_by_id.get(preset_id.as_str()) else {
                continue;
            };
            let record = SyncPresetDocument {
                id: sync_preset_doc_id(user_id, preset_id),
                doc_type: SYNC_PRESET_DOC_TYPE.to_string(),
                user_id: user_id.to_string(),
                preset_id: preset_id.clone(),
                preset: unit.preset.clone(),
                sales: unit.sales.clone(),
                version: new_version,
                updated_at: updated_at.to_string(),
            };
            let body = serde_json::to_value(&record)?;
            self.store
                .upsert(Document::new(record.id.clone(), user_id, body))
                .await?;
            upserted_count += 1;
        }

        let mut deleted_count = 0;
        for preset_id in &diff.delete_ids {
            match self
                .store
                .delete(&sync_preset_doc_id(user_id, preset_id), user_id)
                .await
            {
                Ok(()) => deleted_count += 1,
                // Already gone; deletion is idempotent.
                Err(StoreError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }

        let changed = upserted_count > 0 || deleted_count > 0;
        if changed {
            let meta = SyncMetaDocument {
                id: sync_meta_doc_id(user_id),
                doc_type: SYNC_META_DOC_TYPE.to_string(),
                user_id: user_id.to_string(),
                version: new_version,
                updated_at: updated_at.to_string(),
            };
            let body = serde_json::to_value(&meta)?;
            self.store
                .upsert(Document::new(meta.id.clone(), user_id, body))
                .await?;
        }

        debug!(
            "incremental sync for {}: upserted={} deleted={}",
            user_id, upserted_count, deleted_count
        );

        Ok(SyncChangeSummary {
            changed,
            upserted_count,
            deleted_count,
        })
    }

    /// Erase every sync document for a user: each preset unit, then the meta
    /// record, then the legacy snapshot. Not-found is tolerated at every
    /// step, so erasure is idempotent.
    pub async fn delete_all_sync_data(&self, user_id: &str) -> StoreResult<()> {
        let preset_documents = self.get_preset_documents(user_id).await?;
        for document in &preset_documents {
            self.delete_tolerating_not_found(&document.id, user_id)
                .await?;
        }

        self.delete_tolerating_not_found(&sync_meta_doc_id(user_id), user_id)
            .await?;
        self.delete_tolerating_not_found(&sync_snapshot_doc_id(user_id), user_id)
            .await?;
        Ok(())
    }

    pub async fn get_entitlement(
        &self,
        user_id: &str,
    ) -> StoreResult<Option<EntitlementDocument>> {
        match self.store.read(&entitlement_doc_id(user_id), user_id).await {
            Ok(document) => Ok(Some(serde_json::from_value(document.body)?)),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn upsert_entitlement(&self, entitlement: &EntitlementDocument) -> StoreResult<()> {
        let body = serde_json::to_value(entitlement)?;
        self.store
            .upsert(Document::new(
                entitlement_doc_id(&entitlement.user_id),
                entitlement.user_id.clone(),
                body,
            ))
            .await
    }

    pub async fn delete_entitlement(&self, user_id: &str) -> StoreResult<()> {
        self.delete_tolerating_not_found(&entitlement_doc_id(user_id), user_id)
            .await
    }

    async fn delete_tolerating_not_found(&self, id: &str, partition_key: &str) -> StoreResult<()> {
        match self.store.delete(id, partition_key).await {
            Ok(()) | Err(StoreError::NotFound) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn field_string(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

fn field_array(body: &Value, key: &str) -> Vec<Value> {
    body.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

// Missing or non-numeric versions read as 0.
fn field_version(body: &Value) -> i64 {
    body.get("version").and_then(Value::as_i64).unwrap_or(0)
}

fn preset_unit_from_body(body: &Value) -> PresetUnit {
    PresetUnit {
        preset_id: field_string(body, "presetId").unwrap_or_default(),
        preset: body.get("preset").cloned().unwrap_or(Value::Null),
        sales: field_array(body, "sales"),
    }
}

fn snapshot_from_legacy_body(body: &Value) -> SyncSnapshot {
    let mut sales_by_preset = BTreeMap::new();
    if let Some(entries) = body.get("salesByPreset").and_then(Value::as_object) {
        for (preset_id, sales) in entries {
            sales_by_preset.insert(
                preset_id.clone(),
                sales.as_array().cloned().unwrap_or_default(),
            );
        }
    }
    SyncSnapshot {
        presets: field_array(body, "presets"),
        sales_by_preset,
        version: field_version(body),
        updated_at: field_string(body, "updatedAt"),
    }
}
