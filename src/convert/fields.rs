// convert/fields.rs — JSON field helpers shared by both transformers.
//
// Every accessor takes a default instead of failing: the translator is
// total over partially malformed input, so a missing or mistyped field
// always resolves to something the other format can carry.

use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;

pub fn field_f64(fields: &Fields, key: &str, default: f64) -> f64 {
    fields.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

pub fn field_str<'a>(fields: &'a Fields, key: &str, default: &'a str) -> &'a str {
    fields.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

/// Read a `{Min, Max}` record with defaults.
pub fn field_range(fields: &Fields, key: &str, dmin: f64, dmax: f64) -> (f64, f64) {
    match fields.get(key) {
        Some(Value::Object(obj)) => (
            obj.get("Min").and_then(|v| v.as_f64()).unwrap_or(dmin),
            obj.get("Max").and_then(|v| v.as_f64()).unwrap_or(dmax),
        ),
        _ => (dmin, dmax),
    }
}

/// The `Type` tag of a JSON object node, if any.
pub fn node_type(value: &Value) -> Option<&str> {
    value.as_object().and_then(|o| o.get("Type")).and_then(|v| v.as_str())
}

/// Build an `{x, y, z}` record.
pub fn vec3_object(x: f64, y: f64, z: f64) -> Value {
    let mut obj = Map::new();
    obj.insert("x".to_string(), json_f64(x));
    obj.insert("y".to_string(), json_f64(y));
    obj.insert("z".to_string(), json_f64(z));
    Value::Object(obj)
}

/// Build a `{Min, Max}` record.
pub fn range_object(min: f64, max: f64) -> Value {
    let mut obj = Map::new();
    obj.insert("Min".to_string(), json_f64(min));
    obj.insert("Max".to_string(), json_f64(max));
    Value::Object(obj)
}

/// A float JSON number. Integral values stay integral so re-serialized
/// trees diff cleanly against hand-authored files.
pub fn json_f64(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

/// Does this object's key set (ignoring translator metadata) match
/// exactly the given names? Used for shape detection on the reverse path.
pub fn keys_match(obj: &Fields, names: &[&str]) -> bool {
    let meaningful = obj
        .keys()
        .filter(|k| !matches!(k.as_str(), "$NodeId" | "Skip" | "$Comment"))
        .count();
    meaningful == names.len() && names.iter().all(|n| obj.contains_key(*n))
}
