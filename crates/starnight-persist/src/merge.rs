//! Deep merge of imported data onto the current snapshot.

use serde_json::Value;

/// Merge `incoming` into `base`.
///
/// Objects merge key by key, recursively. Any other incoming value, arrays
/// and `null` included, replaces what `base` holds at that position. Arrays
/// are not merged index by index, so an imported list replaces the local one
/// whole.
pub fn deep_merge(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_merge_recursively() {
        let mut base = json!({
            "global": {"achievement": {"1": true, "2": false}},
            "config": {"language": "zh-CN", "textspeed": 50},
        });
        deep_merge(
            &mut base,
            json!({
                "global": {"achievement": {"2": true, "7": true}},
                "config": {"textspeed": 90},
            }),
        );
        assert_eq!(
            base,
            json!({
                "global": {"achievement": {"1": true, "2": true, "7": true}},
                "config": {"language": "zh-CN", "textspeed": 90},
            })
        );
    }

    #[test]
    fn non_objects_replace() {
        let mut base = json!({"list": [1, 2, 3], "flag": {"nested": true}, "keep": 1});
        deep_merge(&mut base, json!({"list": [9], "flag": null}));
        assert_eq!(base, json!({"list": [9], "flag": null, "keep": 1}));
    }
}
