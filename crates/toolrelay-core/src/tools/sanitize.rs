//! Argument sanitizing
//!
//! Models often emit optional parameters as `null` or `""` instead of leaving
//! them out, which strict servers reject. Sanitizing drops those keys unless
//! the schema marks them required. It never coerces types and never checks
//! that required keys are present.

use serde_json::{Map, Value};

/// Remove `null` and `""` values for keys not listed in `required`.
///
/// Keys unknown to the schema pass through unchanged. Non-object arguments
/// are returned as they are.
pub fn sanitize_arguments(arguments: &Value, required: &[String]) -> Value {
    let Value::Object(map) = arguments else {
        return arguments.clone();
    };

    let kept: Map<String, Value> = map
        .iter()
        .filter(|(key, value)| !is_blank(value) || required.iter().any(|r| r == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(kept)
}

/// Bring model-emitted arguments into object form.
///
/// `null` becomes `{}` and a string holding a JSON object is decoded.
/// Anything else is left alone.
pub fn normalize_arguments(arguments: Value) -> Value {
    match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(decoded @ Value::Object(_)) => decoded,
            _ => Value::String(raw),
        },
        other => other,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_strips_blank_optionals() {
        let args = json!({"q": "rust", "lang": null, "region": "", "limit": 0, "safe": false});
        let clean = sanitize_arguments(&args, &required(&["q"]));
        assert_eq!(clean, json!({"q": "rust", "limit": 0, "safe": false}));
    }

    #[test]
    fn test_required_keys_bypass_stripping() {
        let args = json!({"a": 2, "b": null});
        let clean = sanitize_arguments(&args, &required(&["a", "b"]));
        assert_eq!(clean, json!({"a": 2, "b": null}));

        let args = json!({"name": ""});
        assert_eq!(sanitize_arguments(&args, &required(&["name"])), json!({"name": ""}));
    }

    #[test]
    fn test_unknown_keys_and_nested_values_pass_through() {
        let args = json!({"extra": {"inner": null}, "list": [null, ""], "ws": " "});
        let clean = sanitize_arguments(&args, &[]);
        assert_eq!(clean, args);
    }

    #[test]
    fn test_missing_required_is_not_added() {
        let clean = sanitize_arguments(&json!({"b": 1}), &required(&["a"]));
        assert_eq!(clean, json!({"b": 1}));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            json!({"a": null, "b": "", "c": 1, "d": "x"}),
            json!({"a": null, "b": ""}),
            json!({}),
            json!("not an object"),
        ];
        let req = required(&["b"]);
        for args in samples {
            let once = sanitize_arguments(&args, &req);
            let twice = sanitize_arguments(&once, &req);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_arguments() {
        assert_eq!(normalize_arguments(Value::Null), json!({}));
        assert_eq!(
            normalize_arguments(json!(r#"{"city": "Oslo"}"#)),
            json!({"city": "Oslo"})
        );
        assert_eq!(normalize_arguments(json!("[1, 2]")), json!("[1, 2]"));
        assert_eq!(normalize_arguments(json!("plain")), json!("plain"));
        assert_eq!(normalize_arguments(json!({"a": 1})), json!({"a": 1}));
    }
}
