//! Record - an identity-bearing document managed by a collection.

use serde_json::{Map, Value};

/// A structured document plus its collection-assigned identity.
///
/// The identity lives outside the field set: it is readable through [`id`],
/// never serialized with the fields, and assigned exactly once by the
/// collection on first save — callers cannot supply or reassign it.
///
/// [`id`]: Record::id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    id: Option<u64>,
    fields: Map<String, Value>,
}

impl Record {
    /// Create an empty, unsaved record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Create an unsaved record from an existing field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Record { id: None, fields }
    }

    /// Create an unsaved record from a JSON object value. Returns None for
    /// non-object values.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Record { id: None, fields }),
            _ => None,
        }
    }

    /// Rebuild a record loaded from storage, identity attached.
    pub(crate) fn with_id(id: u64, fields: Map<String, Value>) -> Self {
        Record {
            id: Some(id),
            fields,
        }
    }

    /// Attach the identity assigned on first save.
    pub(crate) fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    /// The collection-assigned identity, if this record was ever saved.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field, returning `&mut self` for chaining.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Remove a field, returning its previous value.
    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// The record's serializable face: its fields as a JSON object, identity
    /// excluded.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Anything `remove` accepts as a record designator: a bare id or a record
/// exposing one.
pub trait RecordKey {
    fn record_id(&self) -> Option<u64>;
}

impl RecordKey for u64 {
    fn record_id(&self) -> Option<u64> {
        Some(*self)
    }
}

impl RecordKey for &Record {
    fn record_id(&self) -> Option<u64> {
        self.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_has_no_identity() {
        let record = Record::new();
        assert_eq!(record.id(), None);
        assert!(record.fields().is_empty());
    }

    #[test]
    fn set_and_get_fields() {
        let mut record = Record::new();
        record.set("name", "a").set("count", 3);
        assert_eq!(record.get("name"), Some(&json!("a")));
        assert_eq!(record.get("count"), Some(&json!(3)));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Record::from_value(json!({"a": 1})).is_some());
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(json!("text")).is_none());
    }

    #[test]
    fn identity_is_excluded_from_the_value_face() {
        let record = Record::with_id(7, Map::new());
        assert_eq!(record.id(), Some(7));
        assert_eq!(record.to_value(), json!({}));
    }

    #[test]
    fn record_key_designators() {
        let record = Record::with_id(5, Map::new());
        assert_eq!(5u64.record_id(), Some(5));
        assert_eq!((&record).record_id(), Some(5));
        assert_eq!((&Record::new()).record_id(), None);
    }
}
