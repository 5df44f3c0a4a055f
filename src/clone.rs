//! Structural deep copy over the closed set of supported value shapes.

use serde_json::{Map, Value};

/// Produce a structurally independent copy of `value`.
///
/// Objects and arrays are rebuilt entry by entry; primitives (null, bool,
/// number, string) copy by value. The shape set is closed: anything a
/// `serde_json::Value` can hold is plain data, so nothing is refused. The
/// writer hook is handed one of these copies so it can transform or strip
/// fields without the caller's record ever observing the change.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut copy = Map::with_capacity(map.len());
            for (key, field) in map {
                copy.insert(key.clone(), deep_clone(field));
            }
            Value::Object(copy)
        }
        Value::Array(items) => Value::Array(items.iter().map(deep_clone).collect()),
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.clone()),
    }
}

/// Deep-copy a record field set.
pub(crate) fn clone_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, field)| (key.clone(), deep_clone(field)))
        .collect()
}
