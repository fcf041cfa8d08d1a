use serde_json::Value;

/// Reads a string-ish value at a JSON pointer; numbers are stringified and
/// empty strings count as absent.
pub fn string_at(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty value among `pointers`, in order.
pub fn first_string_at(body: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|pointer| string_at(body, pointer))
}
