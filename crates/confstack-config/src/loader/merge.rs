//! Deep-merge helpers for layered configuration.

use serde_json::{Map, Value};

/// Merge overlay values into the base, recursively overriding mappings.
///
/// Scalars and sequences in the overlay replace whatever the base held.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Merge a scope section into the accumulated tree.
pub(super) fn merge_section(base: &mut Value, section: &Map<String, Value>) {
    if section.is_empty() {
        return;
    }
    let overlay = Value::Object(section.clone());
    merge_json_values(base, &overlay);
}

/// Wrap a value in nested single-key mappings, outermost segment first.
pub(super) fn nest(segments: &[String], value: Value) -> Value {
    segments.iter().rev().fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.clone(), inner);
        Value::Object(map)
    })
}
