//! Metadata - per-collection bookkeeping and id allocation.

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::CollectionError;
use crate::store::Store;

/// Key the metadata record persists under.
pub(crate) fn meta_key(name: &str) -> String {
    format!("{}_meta", name)
}

/// Key an individual record persists under.
pub(crate) fn record_key(name: &str, id: u64) -> String {
    format!("{}_{}", name, id)
}

/// Per-collection bookkeeping, persisted under `{name}_meta`.
///
/// Invariants after every completed mutation: `length == map.len()`, and
/// `last_id` is the highest id ever allocated — it survives deletions and
/// never decreases, so ids are never reused.
///
/// Metadata is written back after every mutating operation (save, remove,
/// clear), so a crash between mutations never leaves `map` pointing at keys
/// that were already deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub length: usize,
    #[serde(rename = "lastId")]
    pub last_id: u64,
    pub map: Vec<u64>,
}

impl Metadata {
    pub(crate) fn fresh(name: &str) -> Self {
        Metadata {
            name: name.to_string(),
            length: 0,
            last_id: 0,
            map: Vec::new(),
        }
    }

    /// Load the metadata for `name`, or initialize fresh bookkeeping if none
    /// was ever persisted. Absence is the normal first-run state, not an
    /// error; a present-but-undecodable value is a codec error.
    pub fn load<S: Store, C: Codec>(
        store: &S,
        codec: &C,
        name: &str,
    ) -> Result<Self, CollectionError> {
        match store.get(&meta_key(name)) {
            Some(raw) => {
                let value = codec.decode(&raw)?;
                serde_json::from_value(value).map_err(|e| CollectionError::Codec(e.to_string()))
            }
            None => Ok(Metadata::fresh(name)),
        }
    }

    /// Write the bookkeeping back under `{name}_meta`.
    pub fn persist<S: Store, C: Codec>(
        &self,
        store: &S,
        codec: &C,
    ) -> Result<(), CollectionError> {
        let value =
            serde_json::to_value(self).map_err(|e| CollectionError::Codec(e.to_string()))?;
        store.set(&meta_key(&self.name), &codec.encode(&value)?);
        Ok(())
    }

    /// Allocate the next record id: strictly increasing, independent of
    /// deletions. The caller persists the updated metadata.
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}
