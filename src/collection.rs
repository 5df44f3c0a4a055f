//! Collection - the facade composing store, codec, metadata, records and view.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::clone::clone_fields;
use crate::codec::{Codec, JsonCodec};
use crate::error::{CollectionError, Hook};
use crate::hooks::{checked, ReadHook, WriteHook};
use crate::meta::{meta_key, record_key, Metadata};
use crate::record::{Record, RecordKey};
use crate::store::Store;
use crate::view::{Predicate, View};

/// Bucket key `group` uses for records whose property is absent or not a
/// string. A genuine property value equal to this string lands in the same
/// bucket; callers needing that value must group on another property.
pub const UNGROUPED: &str = "_ungrouped";

/// A named collection of identifiable records over a string-keyed store.
///
/// Each record persists under `{name}_{id}`, bookkeeping under `{name}_meta`.
/// One instance exclusively owns the in-memory state for its name; the
/// execution model is single-threaded and fully synchronous.
pub struct Collection<S: Store, C: Codec = JsonCodec> {
    name: String,
    store: S,
    codec: C,
    meta: Metadata,
    records: HashMap<u64, Record>,
    view: View,
    filter: Option<Predicate>,
    reader: Option<ReadHook>,
    writer: Option<WriteHook>,
}

impl<S: Store, C: Codec> std::fmt::Debug for Collection<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl<S: Store> Collection<S> {
    /// Open (or create) the collection `name` on `store` with the default
    /// JSON codec and no transform hooks. Probes the store once and performs
    /// the initial load.
    pub fn new(name: impl Into<String>, store: S) -> Result<Self, CollectionError> {
        Self::with_hooks(name, store, None, None)
    }

    /// Open with optional reader/writer transform hooks.
    pub fn with_hooks(
        name: impl Into<String>,
        store: S,
        reader: Option<ReadHook>,
        writer: Option<WriteHook>,
    ) -> Result<Self, CollectionError> {
        Self::with_codec(name, store, JsonCodec, reader, writer)
    }
}

impl<S: Store, C: Codec> Collection<S, C> {
    /// Open with an explicit codec.
    pub fn with_codec(
        name: impl Into<String>,
        store: S,
        codec: C,
        reader: Option<ReadHook>,
        writer: Option<WriteHook>,
    ) -> Result<Self, CollectionError> {
        let name = name.into();
        probe(&store)?;
        let mut collection = Collection {
            meta: Metadata::fresh(&name),
            name,
            store,
            codec,
            records: HashMap::new(),
            view: View::default(),
            filter: None,
            reader,
            writer,
        };
        collection.read()?;
        Ok(collection)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bookkeeping record: live length, last allocated id, live id order.
    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Point lookup by identity.
    pub fn id(&self, id: u64) -> Option<&Record> {
        self.records.get(&id)
    }

    // ----- view surface -------------------------------------------------

    /// Records currently visible, position 0..len-1.
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.len() == 0
    }

    /// Record at `index` in the current view.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(&self.view.get(index)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.view.ids().iter().filter_map(move |id| self.records.get(id))
    }

    /// The current view as an ordered sequence.
    pub fn view(&self) -> Vec<&Record> {
        self.current()
    }

    // ----- persistence --------------------------------------------------

    /// (Re)initialize from persistent storage: reload metadata, decode every
    /// live record through the reader hook, rematerialize the view.
    ///
    /// Ids the reader hook skips stay persisted and stay in the metadata map;
    /// they are only excluded from this materialization.
    pub fn read(&mut self) -> Result<(), CollectionError> {
        self.meta = Metadata::load(&self.store, &self.codec, &self.name)?;
        self.records.clear();
        for id in self.meta.map.clone() {
            let key = record_key(&self.name, id);
            let Some(raw) = self.store.get(&key) else {
                continue;
            };
            let decoded = self.codec.decode(&raw)?;
            let materialized = match &self.reader {
                Some(hook) => checked(Hook::Reader, hook(decoded))?,
                None => match decoded {
                    Value::Object(fields) => Some(fields),
                    other => {
                        return Err(CollectionError::Codec(format!(
                            "stored value under {} is not an object: {}",
                            key, other
                        )))
                    }
                },
            };
            let Some(fields) = materialized else {
                debug!(collection = %self.name, id, "reader hook skipped record");
                continue;
            };
            self.records.insert(id, Record::with_id(id, fields));
        }
        self.rematerialize();
        debug!(
            collection = %self.name,
            live = self.meta.map.len(),
            materialized = self.records.len(),
            "loaded collection"
        );
        Ok(())
    }

    /// Install a new reader hook, then reload from persistent storage.
    pub fn read_with(
        &mut self,
        reader: impl Fn(Value) -> Option<Value> + 'static,
    ) -> Result<(), CollectionError> {
        self.reader = Some(Box::new(reader));
        self.read()
    }

    /// Create or update a record.
    ///
    /// A record without identity gets the next monotonic id, which is
    /// attached to `record` itself. A record with a known identity is
    /// persisted over its existing key, view position preserved. Returns
    /// `Ok(None)` when the writer hook rejects the save (nothing persisted,
    /// no id allocated); a record carrying an unknown identity is a stale-id
    /// error.
    pub fn save(&mut self, record: &mut Record) -> Result<Option<u64>, CollectionError> {
        match record.id() {
            Some(id) if self.records.contains_key(&id) => self.save_existing(id, record),
            Some(id) => Err(CollectionError::StaleId {
                collection: self.name.clone(),
                id,
            }),
            None => self.save_new(record),
        }
    }

    /// Delete a record by id or by the record itself. Returns `Ok(false)`
    /// when nothing is tracked under that identity.
    pub fn remove<K: RecordKey>(&mut self, key: K) -> Result<bool, CollectionError> {
        let Some(id) = key.record_id() else {
            return Ok(false);
        };
        if self.records.remove(&id).is_none() {
            return Ok(false);
        }
        self.store.remove(&record_key(&self.name, id));
        self.view.remove(id);
        self.meta.map.retain(|held| *held != id);
        self.meta.length -= 1;
        self.meta.persist(&self.store, &self.codec)?;
        debug!(collection = %self.name, id, "removed record");
        Ok(true)
    }

    /// Delete every persisted key for this collection (records plus
    /// metadata) and reset to the freshly created state. The collection
    /// remains usable.
    pub fn clear(&mut self) -> Result<(), CollectionError> {
        for id in &self.meta.map {
            self.store.remove(&record_key(&self.name, *id));
        }
        self.store.remove(&meta_key(&self.name));
        self.records.clear();
        self.view.clear();
        self.filter = None;
        self.meta = Metadata::load(&self.store, &self.codec, &self.name)?;
        debug!(collection = %self.name, "cleared collection");
        Ok(())
    }

    // ----- queries ------------------------------------------------------

    /// Install `predicate` as the active filter (replacing any prior one)
    /// and rebuild the view from the records passing it, in discovery order.
    pub fn find<P>(&mut self, predicate: P) -> Vec<&Record>
    where
        P: Fn(&Record) -> bool + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self.rematerialize();
        self.current()
    }

    /// `find` plus a one-shot ordering of the filtered view. The comparator
    /// is not retained.
    pub fn find_sorted<P, F>(&mut self, predicate: P, comparator: F) -> Vec<&Record>
    where
        P: Fn(&Record) -> bool + 'static,
        F: Fn(&Record, &Record) -> Ordering,
    {
        self.filter = Some(Box::new(predicate));
        self.rematerialize();
        self.view.sort_with(&self.records, &comparator);
        self.current()
    }

    /// Clear any active filter and restore the full view. A no-op when no
    /// filter is active.
    pub fn find_all(&mut self) -> Vec<&Record> {
        if self.filter.take().is_some() {
            self.rematerialize();
        }
        self.current()
    }

    /// Clear any active filter and rebuild the full view in a one-shot
    /// ordering. The comparator is not retained.
    pub fn find_all_sorted<F>(&mut self, comparator: F) -> Vec<&Record>
    where
        F: Fn(&Record, &Record) -> Ordering,
    {
        self.filter = None;
        self.rematerialize();
        self.view.sort_with(&self.records, &comparator);
        self.current()
    }

    /// Reorder the current view in place. Membership is unchanged; stability
    /// for equal keys is unspecified.
    pub fn sort<F>(&mut self, comparator: F) -> Vec<&Record>
    where
        F: Fn(&Record, &Record) -> Ordering,
    {
        self.view.sort_with(&self.records, &comparator);
        self.current()
    }

    /// Partition the current view by the string value of `property`.
    /// Records where the property is absent or non-string collect under
    /// [`UNGROUPED`]. Bucket members keep view order.
    pub fn group(&self, property: &str) -> HashMap<String, Vec<&Record>> {
        let mut buckets: HashMap<String, Vec<&Record>> = HashMap::new();
        for id in self.view.ids() {
            let Some(record) = self.records.get(id) else {
                continue;
            };
            let bucket = match record.get(property) {
                Some(Value::String(value)) => value.clone(),
                _ => UNGROUPED.to_string(),
            };
            buckets.entry(bucket).or_default().push(record);
        }
        buckets
    }

    // ----- internals ----------------------------------------------------

    fn rematerialize(&mut self) {
        self.view
            .rebuild(&self.meta.map, &self.records, self.filter.as_ref());
    }

    fn current(&self) -> Vec<&Record> {
        self.view
            .ids()
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Run the writer hook over a detached copy of the record's fields.
    /// `Ok(None)` means the hook rejected the save.
    fn transformed(&self, record: &Record) -> Result<Option<Value>, CollectionError> {
        let detached = Value::Object(clone_fields(record.fields()));
        match &self.writer {
            Some(hook) => Ok(checked(Hook::Writer, hook(detached))?.map(Value::Object)),
            None => Ok(Some(detached)),
        }
    }

    fn save_new(&mut self, record: &mut Record) -> Result<Option<u64>, CollectionError> {
        let Some(stored) = self.transformed(record)? else {
            debug!(collection = %self.name, "writer hook rejected save");
            return Ok(None);
        };
        let encoded = self.codec.encode(&stored)?;
        let id = self.meta.next_id();
        self.store.set(&record_key(&self.name, id), &encoded);
        record.assign_id(id);
        self.records.insert(id, record.clone());
        self.meta.map.push(id);
        self.meta.length += 1;
        self.meta.persist(&self.store, &self.codec)?;
        if self.filter.as_ref().map_or(true, |accepts| accepts(record)) {
            self.view.push(id);
        }
        debug!(collection = %self.name, id, "saved new record");
        Ok(Some(id))
    }

    fn save_existing(&mut self, id: u64, record: &Record) -> Result<Option<u64>, CollectionError> {
        let Some(stored) = self.transformed(record)? else {
            debug!(collection = %self.name, id, "writer hook rejected update");
            return Ok(None);
        };
        let encoded = self.codec.encode(&stored)?;
        self.store.set(&record_key(&self.name, id), &encoded);
        // length, last_id and map are untouched by an update, so the
        // metadata on disk is already current.
        self.records.insert(id, record.clone());
        debug!(collection = %self.name, id, "updated record");
        Ok(Some(id))
    }
}

fn probe<S: Store>(store: &S) -> Result<(), CollectionError> {
    const PROBE_KEY: &str = "__docshelf_probe";
    store.set(PROBE_KEY, "ok");
    let alive = store.get(PROBE_KEY).as_deref() == Some("ok");
    store.remove(PROBE_KEY);
    if alive {
        Ok(())
    } else {
        Err(CollectionError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        Record::from_value(fields).unwrap()
    }

    /// A store that silently drops every write.
    struct DeadStore;

    impl Store for DeadStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&self, _key: &str, _value: &str) {}
        fn remove(&self, _key: &str) {}
    }

    #[test]
    fn construction_fails_on_dead_store() {
        let err = Collection::new("todos", DeadStore).unwrap_err();
        assert_eq!(err, CollectionError::StorageUnavailable);
    }

    #[test]
    fn probe_leaves_no_key_behind() {
        let store = MemoryStore::new();
        let _ = Collection::new("todos", store.clone()).unwrap();
        assert_eq!(store.get("__docshelf_probe"), None);
    }

    #[test]
    fn save_assigns_identity_and_persists() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store.clone()).unwrap();

        let mut rec = record(json!({"name": "a"}));
        let id = todos.save(&mut rec).unwrap();
        assert_eq!(id, Some(1));
        assert_eq!(rec.id(), Some(1));
        assert_eq!(todos.len(), 1);
        assert_eq!(store.get("todos_1"), Some(r#"{"name":"a"}"#.to_string()));
        assert!(store.get("todos_meta").is_some());
    }

    #[test]
    fn update_preserves_identity_and_position() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store).unwrap();

        let mut a = record(json!({"name": "a"}));
        let mut b = record(json!({"name": "b"}));
        todos.save(&mut a).unwrap();
        todos.save(&mut b).unwrap();

        a.set("name", "a2");
        let id = todos.save(&mut a).unwrap();
        assert_eq!(id, Some(1));
        assert_eq!(todos.len(), 2);
        assert_eq!(todos.get(0).unwrap().get("name"), Some(&json!("a2")));
        assert_eq!(todos.metadata().last_id, 2);
    }

    #[test]
    fn save_with_foreign_identity_is_stale() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store).unwrap();

        let mut foreign = Record::with_id(99, serde_json::Map::new());
        let err = todos.save(&mut foreign).unwrap_err();
        assert_eq!(
            err,
            CollectionError::StaleId {
                collection: "todos".into(),
                id: 99
            }
        );
        assert_eq!(todos.len(), 0);
        assert_eq!(todos.metadata().last_id, 0);
    }

    #[test]
    fn remove_by_id_and_by_record() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store.clone()).unwrap();

        let mut a = record(json!({"name": "a"}));
        let mut b = record(json!({"name": "b"}));
        todos.save(&mut a).unwrap();
        todos.save(&mut b).unwrap();

        assert!(todos.remove(1u64).unwrap());
        assert!(todos.remove(&b).unwrap());
        assert!(!todos.remove(1u64).unwrap());
        assert_eq!(todos.len(), 0);
        assert_eq!(store.get("todos_1"), None);
        assert_eq!(store.get("todos_2"), None);
    }

    #[test]
    fn remove_unsaved_record_is_not_found() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store).unwrap();
        assert!(!todos.remove(&Record::new()).unwrap());
    }

    #[test]
    fn remove_persists_metadata() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store.clone()).unwrap();
        let mut a = record(json!({"name": "a"}));
        todos.save(&mut a).unwrap();
        todos.remove(1u64).unwrap();

        let reopened = Collection::new("todos", store).unwrap();
        assert_eq!(reopened.metadata().length, 0);
        assert!(reopened.metadata().map.is_empty());
        assert_eq!(reopened.metadata().last_id, 1);
    }

    #[test]
    fn id_lookup() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store).unwrap();
        let mut a = record(json!({"name": "a"}));
        todos.save(&mut a).unwrap();

        assert_eq!(todos.id(1).unwrap().get("name"), Some(&json!("a")));
        assert!(todos.id(2).is_none());
    }

    #[test]
    fn clear_leaves_an_empty_usable_collection() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store.clone()).unwrap();
        let mut a = record(json!({"name": "a"}));
        let mut b = record(json!({"name": "b"}));
        todos.save(&mut a).unwrap();
        todos.save(&mut b).unwrap();

        todos.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(todos.len(), 0);
        assert_eq!(todos.metadata().last_id, 0);

        // usable again, ids restart from a fresh allocator
        let mut c = record(json!({"name": "c"}));
        assert_eq!(todos.save(&mut c).unwrap(), Some(1));
    }

    #[test]
    fn group_buckets_by_string_property() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store).unwrap();
        let mut x = record(json!({"category": "x"}));
        let mut y = record(json!({"category": "y"}));
        let mut none = record(json!({"name": "no category"}));
        let mut numeric = record(json!({"category": 7}));
        todos.save(&mut x).unwrap();
        todos.save(&mut y).unwrap();
        todos.save(&mut none).unwrap();
        todos.save(&mut numeric).unwrap();

        let groups = todos.group("category");
        assert_eq!(groups["x"].len(), 1);
        assert_eq!(groups["y"].len(), 1);
        assert_eq!(groups[UNGROUPED].len(), 2);
    }

    #[test]
    fn group_partitions_the_current_view_only() {
        let store = MemoryStore::new();
        let mut todos = Collection::new("todos", store).unwrap();
        let mut x = record(json!({"category": "x", "done": true}));
        let mut y = record(json!({"category": "y", "done": false}));
        todos.save(&mut x).unwrap();
        todos.save(&mut y).unwrap();

        todos.find(|r| r.get("done") == Some(&json!(true)));
        let groups = todos.group("category");
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("x"));
    }
}
