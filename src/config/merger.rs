//! Merge algorithm for layered manifests.
//!
//! devrig layers a user global manifest, the project manifest and local
//! overrides. This module implements the merge semantics on raw YAML values
//! before they are parsed into a [`Manifest`](super::Manifest).
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - `steps` and `checks` lists are merged by `name`: an overlay entry
//!   replaces the base entry with the same name in place, new names are
//!   appended
//! - Other arrays are replaced entirely
//! - Null values in overlay delete the corresponding key from base
//! - Scalars in overlay replace scalars in base

use serde_yaml::{Mapping, Value};

/// Top-level keys whose lists are merged by entry name.
const NAMED_LISTS: &[&str] = &["steps", "checks"];

/// Deep merge two YAML values.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Merge two manifest documents.
///
/// Like [`deep_merge`], but `steps` and `checks` are merged by entry name
/// so an override file only needs to restate the entries it changes.
pub fn merge_manifest(base: &Value, overlay: &Value) -> Value {
    let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (base, overlay) else {
        return deep_merge(base, overlay);
    };

    let mut result = match deep_merge(
        &Value::Mapping(without_named_lists(base_map)),
        &Value::Mapping(without_named_lists(overlay_map)),
    ) {
        Value::Mapping(merged) => merged,
        _ => Mapping::new(),
    };

    for list in NAMED_LISTS {
        let key = Value::String((*list).to_string());
        let merged = match (base_map.get(&key), overlay_map.get(&key)) {
            (Some(Value::Sequence(base_seq)), Some(Value::Sequence(overlay_seq))) => {
                Some(Value::Sequence(merge_by_name(base_seq, overlay_seq)))
            }
            (_, Some(Value::Null)) => None,
            (_, Some(overlay_value)) => Some(overlay_value.clone()),
            (Some(base_value), None) => Some(base_value.clone()),
            (None, None) => None,
        };
        if let Some(value) = merged {
            result.insert(key, value);
        }
    }

    Value::Mapping(result)
}

fn without_named_lists(map: &Mapping) -> Mapping {
    map.iter()
        .filter(|(k, _)| !k.as_str().is_some_and(|k| NAMED_LISTS.contains(&k)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn merge_by_name(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    let mut result = base.to_vec();

    for entry in overlay {
        let existing = entry_name(entry)
            .and_then(|name| result.iter().position(|e| entry_name(e) == Some(name)));
        match existing {
            Some(index) => result[index] = entry.clone(),
            None => result.push(entry.clone()),
        }
    }

    result
}

fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

/// Merge multiple manifests in order (later overrides earlier).
pub fn merge_manifests(manifests: &[Value]) -> Value {
    manifests
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, manifest| {
            merge_manifest(&acc, manifest)
        })
}
