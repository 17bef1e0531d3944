//! Push payload validation and normalization.
//!
//! Validation is strict and runs before any storage access: a rejected push
//! is never partially applied. Normalization, used later by the incremental
//! writer, is deliberately lenient and drops malformed entries instead of
//! failing the whole request.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::errors::SyncValidationError;
use crate::sync::PresetUnit;

/// Validated body of a `POST /sync/push` request.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPushPayload {
    pub presets: Vec<Value>,
    pub sales_by_preset: BTreeMap<String, Vec<Value>>,
    pub client_version: Option<f64>,
}

impl SyncPushPayload {
    /// Validate a raw request body.
    ///
    /// Requires: `presets` an array of objects each carrying a string or
    /// numeric `id`, no duplicate ids, `salesByPreset` an object whose every
    /// value is an array, and a finite `clientVersion` when one is present.
    pub fn parse(body: &Value) -> Result<Self, SyncValidationError> {
        let Value::Object(map) = body else {
            return Err(SyncValidationError::BodyNotObject);
        };

        let presets = match map.get("presets") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(SyncValidationError::PresetsNotArray),
        };
        validate_preset_ids(&presets)?;

        let sales_by_preset = match map.get("salesByPreset") {
            Some(Value::Object(entries)) => {
                let mut out = BTreeMap::new();
                for (preset_id, sales) in entries {
                    let Value::Array(items) = sales else {
                        return Err(SyncValidationError::SalesByPresetInvalid);
                    };
                    out.insert(preset_id.clone(), items.clone());
                }
                out
            }
            _ => return Err(SyncValidationError::SalesByPresetInvalid),
        };

        let client_version = match map.get("clientVersion") {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => {
                let value = number.as_f64().unwrap_or(f64::NAN);
                if !value.is_finite() {
                    return Err(SyncValidationError::ClientVersionInvalid);
                }
                Some(value)
            }
            Some(_) => return Err(SyncValidationError::ClientVersionInvalid),
        };

        Ok(Self {
            presets,
            sales_by_preset,
            client_version,
        })
    }
}

/// Extract the stringified preset id from a raw preset object. Accepts
/// string and numeric ids, mirroring what clients have historically sent.
pub fn preset_id_of(value: &Value) -> Option<String> {
    match value.as_object()?.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

fn validate_preset_ids(presets: &[Value]) -> Result<(), SyncValidationError> {
    let mut seen = HashSet::new();
    for preset in presets {
        let Some(preset_id) = preset_id_of(preset) else {
            return Err(SyncValidationError::PresetMissingId);
        };
        if !seen.insert(preset_id.clone()) {
            return Err(SyncValidationError::DuplicatePresetId(preset_id));
        }
    }
    Ok(())
}

/// Turn a validated payload's raw presets into diffable units, pairing each
/// with its sales ledger (empty when absent). Entries that are not objects
/// or lack a usable id are dropped silently.
pub fn normalize_incoming(
    presets: &[Value],
    sales_by_preset: &BTreeMap<String, Vec<Value>>,
) -> Vec<PresetUnit> {
    let mut units = Vec::with_capacity(presets.len());
    for preset in presets {
        let Some(preset_id) = preset_id_of(preset) else {
            continue;
        };
        let sales = sales_by_preset.get(&preset_id).cloned().unwrap_or_default();
        units.push(PresetUnit {
            preset_id,
            preset: preset.clone(),
            sales,
        });
    }
    units
}
