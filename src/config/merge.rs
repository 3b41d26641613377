//! Right-biased recursive document merge.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Recursion only happens where both sides are mappings; on any other
/// conflict the overlay value replaces the base value wholly (lists are
/// replaced, never concatenated). An empty or null overlay leaves `base`
/// untouched.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (_, Value::Null) => base.clone(),
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            if overlay_map.is_empty() {
                return base.clone();
            }
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                let replacement = match merged.get(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), replacement);
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_overlay_is_identity() {
        let base = json!({"a": 1, "b": {"c": [1, 2]}});
        assert_eq!(deep_merge(&base, &json!({})), base);
        assert_eq!(deep_merge(&base, &Value::Null), base);
    }

    #[test]
    fn test_overlay_is_right_biased() {
        let base = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let overlay = json!({"a": 9, "b": {"c": 8}});
        assert_eq!(
            deep_merge(&base, &overlay),
            json!({"a": 9, "b": {"c": 8, "d": 3}})
        );
    }

    #[test]
    fn test_lists_are_replaced_not_concatenated() {
        let base = json!({"handlers": ["console", "file"]});
        let overlay = json!({"handlers": ["syslog"]});
        assert_eq!(deep_merge(&base, &overlay), json!({"handlers": ["syslog"]}));
    }

    #[test]
    fn test_scalar_replaces_mapping_and_vice_versa() {
        let base = json!({"a": {"nested": true}});
        assert_eq!(deep_merge(&base, &json!({"a": 5})), json!({"a": 5}));

        let base = json!({"a": 5});
        assert_eq!(
            deep_merge(&base, &json!({"a": {"nested": true}})),
            json!({"a": {"nested": true}})
        );
    }

    #[test]
    fn test_new_keys_are_added() {
        let base = json!({"a": 1});
        assert_eq!(
            deep_merge(&base, &json!({"b": 2})),
            json!({"a": 1, "b": 2})
        );
    }
}
