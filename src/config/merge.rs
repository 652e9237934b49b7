//! Field-by-field merging of configuration tiers.
//!
//! Objects merge recursively with the overlay winning; arrays and scalars are
//! replaced wholesale; a null in the overlay leaves the base untouched.

use serde_json::Value;

/// Merge `overlay` onto `base`, returning the result.
///
/// # Example
/// ```
/// use serde_json::json;
/// use followup_engine::config::deep_merge;
///
/// let defaults = json!({ "engine": { "week_start": "sunday", "default_kind": "followup" } });
/// let project = json!({ "engine": { "week_start": "monday" } });
/// let merged = deep_merge(defaults, project);
/// assert_eq!(merged["engine"]["week_start"], "monday");
/// assert_eq!(merged["engine"]["default_kind"], "followup");
/// ```
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Merge `overlay` into `target` in place.
///
/// Null overlay entries are skipped entirely, so they never introduce a key
/// the target lacks.
pub fn merge_into(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (_, Value::Null) => {}
        (Value::Object(fields), Value::Object(layer)) => {
            for (key, value) in layer {
                if value.is_null() {
                    continue;
                }
                match fields.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge tiers ordered lowest to highest priority.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for layer in values {
        merge_into(&mut merged, layer);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_section_merge() {
        let base = json!({
            "tracking": {"debounce_ms": 1000, "min_phone_digits": 11},
            "ingest": {"mode": "lenient"}
        });
        let overlay = json!({"tracking": {"debounce_ms": 250}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({
                "tracking": {"debounce_ms": 250, "min_phone_digits": 11},
                "ingest": {"mode": "lenient"}
            })
        );
    }

    #[test]
    fn test_arrays_are_replaced() {
        let merged = deep_merge(json!({"keys": ["data", "tasks"]}), json!({"keys": ["items"]}));
        assert_eq!(merged, json!({"keys": ["items"]}));
    }

    #[test]
    fn test_null_keeps_base() {
        let merged = deep_merge(
            json!({"storage": {"data_dir": "/tmp/a"}}),
            json!({"storage": {"data_dir": null}}),
        );
        assert_eq!(merged, json!({"storage": {"data_dir": "/tmp/a"}}));
    }

    #[test]
    fn test_null_does_not_add_missing_key() {
        let mut target = json!({"ingest": {"mode": "strict"}});
        merge_into(&mut target, json!({"storage": null, "ingest": {"extra": null}}));
        assert_eq!(target, json!({"ingest": {"mode": "strict"}}));
    }

    #[test]
    fn test_scalar_and_object_replace_each_other() {
        assert_eq!(deep_merge(json!({"v": 1}), json!({"v": {"x": 2}})), json!({"v": {"x": 2}}));
        assert_eq!(deep_merge(json!({"v": {"x": 2}}), json!({"v": 1})), json!({"v": 1}));
    }

    #[test]
    fn test_merge_all_later_tiers_win() {
        let merged = deep_merge_all(vec![
            json!({"engine": {"week_start": "sunday"}}),
            json!({"engine": {"default_format": "markdown"}}),
            json!({"engine": {"week_start": "monday"}}),
        ]);
        assert_eq!(
            merged,
            json!({"engine": {"week_start": "monday", "default_format": "markdown"}})
        );
    }
}
