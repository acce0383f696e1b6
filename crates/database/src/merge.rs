//! JSON merge-patch semantics shared by every store.
//!
//! Follows RFC 7396, which is also what SQLite's `json_patch()` implements:
//! objects merge recursively, `null` removes a key, anything else replaces.

use serde_json::{Map, Value};

/// Apply `patch` onto `target` in place.
pub fn merge_patch(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(patch_obj) => {
                let entry = target
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(target_obj) = entry {
                    merge_patch(target_obj, patch_obj);
                }
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}
