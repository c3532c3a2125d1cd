//! YAML merge helpers for layered agent config.

use serde_yaml::Value;

/// Merge overlay values into the base, recursively merging mappings.
///
/// Unset overlay values (`null` or an empty string) never replace a base value.
pub(super) fn merge_yaml_values(base: &mut Value, overlay: &Value) {
    if is_unset(overlay) {
        return;
    }
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_yaml_values(existing, value),
                    None => {
                        if !is_unset(value) {
                            base_map.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(value) => value.is_empty(),
        _ => false,
    }
}
