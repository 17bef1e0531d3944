//! Preset-unit diffing for incremental cloud sync.
//!
//! Units are compared whole, by canonical serialization of both the preset
//! and its sales ledger. This is deliberately coarse: a one-cent change in a
//! single sale rewrites the whole unit. Units are small, so the rewrite is
//! cheap, and whole-unit comparison rules out partial-field merge bugs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Atomic syncable entity: one preset plus its sales ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetUnit {
    pub preset_id: String,
    pub preset: Value,
    #[serde(default)]
    pub sales: Vec<Value>,
}

/// Ids to upsert or delete to bring persisted state in line with an incoming
/// payload. No ordering guarantee on either list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetDiff {
    pub upsert_ids: Vec<String>,
    pub delete_ids: Vec<String>,
}

/// Serialize a JSON value deterministically: object keys sorted at every
/// nesting level, array order preserved. Structurally equal values produce
/// identical strings regardless of key insertion order, so key-order noise
/// never causes a false-positive upsert.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

fn units_equal(a: &PresetUnit, b: &PresetUnit) -> bool {
    if a.sales.len() != b.sales.len() {
        return false;
    }
    canonical_json(&a.preset) == canonical_json(&b.preset)
        && a.sales
            .iter()
            .zip(&b.sales)
            .all(|(left, right)| canonical_json(left) == canonical_json(right))
}

/// Compute which preset units must be written or removed given the persisted
/// state and an incoming full snapshot.
///
/// Incoming duplicates resolve last-occurrence-wins; payload validation
/// rejects duplicates before they normally reach this point.
pub fn calculate_preset_diff(existing: &[PresetUnit], incoming: &[PresetUnit]) -> PresetDiff {
    let mut existing_by_id: HashMap<&str, &PresetUnit> = HashMap::with_capacity(existing.len());
    for unit in existing {
        existing_by_id.insert(unit.preset_id.as_str(), unit);
    }

    let mut incoming_by_id: HashMap<&str, &PresetUnit> = HashMap::with_capacity(incoming.len());
    for unit in incoming {
        incoming_by_id.insert(unit.preset_id.as_str(), unit);
    }

    let mut upsert_ids = Vec::new();
    let mut delete_ids = Vec::new();

    for (preset_id, incoming_unit) in &incoming_by_id {
        match existing_by_id.get(preset_id) {
            None => upsert_ids.push((*preset_id).to_string()),
            Some(existing_unit) if !units_equal(existing_unit, incoming_unit) => {
                upsert_ids.push((*preset_id).to_string());
            }
            Some(_) => {}
        }
    }

    for preset_id in existing_by_id.keys() {
        if !incoming_by_id.contains_key(preset_id) {
            delete_ids.push((*preset_id).to_string());
        }
    }

    PresetDiff {
        upsert_ids,
        delete_ids,
    }
}
