//! Transform hooks applied at the storage boundary.

use serde_json::{Map, Value};

use crate::error::{CollectionError, Hook};

/// Load-time transform: receives the decoded stored value, returns the
/// record-shaped value to materialize, or `None` to exclude this record from
/// the collection without touching its persisted bytes.
pub type ReadHook = Box<dyn Fn(Value) -> Option<Value>>;

/// Save-time transform: receives a deep clone of the record's fields, returns
/// the value to persist, or `None` to abort the save entirely.
pub type WriteHook = Box<dyn Fn(Value) -> Option<Value>>;

/// Enforce the hook contract: `None` is the skip/reject sentinel, an object
/// is the transformed record, anything else is a configuration error.
pub(crate) fn checked(
    hook: Hook,
    outcome: Option<Value>,
) -> Result<Option<Map<String, Value>>, CollectionError> {
    match outcome {
        None => Ok(None),
        Some(Value::Object(fields)) => Ok(Some(fields)),
        Some(other) => Err(CollectionError::HookViolation {
            hook,
            got: other.to_string(),
        }),
    }
}
