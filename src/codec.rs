//! Codec - pluggable encode/decode between record values and stored strings.

use serde_json::Value;

use crate::error::CollectionError;

/// Encode/decode between a structured value and the store's string
/// representation. Implementations must round-trip objects, arrays and
/// primitives.
pub trait Codec {
    fn encode(&self, value: &Value) -> Result<String, CollectionError>;
    fn decode(&self, raw: &str) -> Result<Value, CollectionError>;
}

/// The default codec: a serde_json round-trip.
#[derive(Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CollectionError> {
        serde_json::to_string(value).map_err(|e| CollectionError::Codec(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<Value, CollectionError> {
        serde_json::from_str(raw).map_err(|e| CollectionError::Codec(e.to_string()))
    }
}
