/*
[INPUT]:  Decoded JSON payloads (or nothing)
[OUTPUT]: The `data` field, the raw mapping, or an empty list
[POS]:    HTTP layer - response unwrapping contract used by every endpoint
[UPDATE]: Never without checking every caller; the fallback order is relied upon
*/

use serde_json::Value;

/// Unwrap an endpoint payload.
///
/// `{"data": x}` gives `x`; any other mapping is returned as is; anything
/// that is not a mapping (including no payload at all) gives `[]`.
pub fn unwrap_data(payload: Option<Value>) -> Value {
    match payload {
        Some(Value::Object(mut map)) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        _ => Value::Array(Vec::new()),
    }
}

/// Truthiness of a validation payload; empty containers and `false` are falsy
pub(crate) fn is_truthy(payload: Option<&Value>) -> bool {
    match payload {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Number(_)) => true,
    }
}
