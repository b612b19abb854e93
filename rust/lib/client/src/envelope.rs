//! Response envelope normalization.
//!
//! The backend is inconsistent about wrapping: most endpoints answer
//! `{"data": ...}`, some answer the bare array or object, and some
//! single-entity endpoints answer a one-element array. Everything is
//! normalized here before typed decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Strip the `{data: ...}` wrapper if present.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Decode a collection response.
pub fn decode_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, ApiError> {
    match unwrap_data(body) {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).map_err(|e| ApiError::Decode(format!("item {i}: {e}")))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::Decode(format!("expected a list, got {}", kind(&other)))),
    }
}

/// Decode a single-entity response.
pub fn decode_one<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let value = match unwrap_data(body) {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(ApiError::Decode(format!("expected an object, got {}", kind(&other))));
        }
    };
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn kind(v: &Value) -> String {
    match v {
        Value::Null => "null".into(),
        Value::Bool(_) => "a boolean".into(),
        Value::Number(_) => "a number".into(),
        Value::String(_) => "a string".into(),
        Value::Array(a) => format!("an array of {}", a.len()),
        Value::Object(_) => "an object".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h10cm_tracking::model::ProductionStep;
    use serde_json::json;

    fn step(id: i64) -> Value {
        json!({"step_id": id, "step_name": "Solder", "step_order": 1})
    }

    #[test]
    fn list_accepts_wrapped_and_bare() {
        let wrapped: Vec<ProductionStep> = decode_list(json!({"data": [step(1), step(2)]})).unwrap();
        let bare: Vec<ProductionStep> = decode_list(json!([step(1), step(2)])).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped[1].step_id, "2");
        assert!(decode_list::<ProductionStep>(json!({"data": null})).unwrap().is_empty());
    }

    #[test]
    fn list_rejects_other_shapes() {
        assert!(matches!(decode_list::<ProductionStep>(json!({"items": []})), Err(ApiError::Decode(_))));
        assert!(matches!(decode_list::<ProductionStep>(json!("oops")), Err(ApiError::Decode(_))));
    }

    #[test]
    fn one_unwraps_single_element_array() {
        let a: ProductionStep = decode_one(json!([step(7)])).unwrap();
        let b: ProductionStep = decode_one(json!({"data": [step(7)]})).unwrap();
        let c: ProductionStep = decode_one(json!({"data": step(7)})).unwrap();
        let d: ProductionStep = decode_one(step(7)).unwrap();
        assert!(a == b && b == c && c == d);
        assert!(matches!(decode_one::<ProductionStep>(json!([])), Err(ApiError::Decode(_))));
        assert!(matches!(decode_one::<ProductionStep>(json!([step(1), step(2)])), Err(ApiError::Decode(_))));
    }
}
