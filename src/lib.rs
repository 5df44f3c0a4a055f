//! docshelf - named document collections over any synchronous string-keyed
//! key-value store.
//!
//! A [`Collection`] treats a flat set of keys (local-storage semantics:
//! string keys, string values, no queries) as a named collection of
//! identifiable records: create/update, point lookup, deletion, filtering,
//! sorting and grouping. Each record persists under its own key plus one
//! metadata record per collection; ids are monotonic and never reused.
//!
//! ## Example
//!
//! ```
//! use docshelf::{Collection, MemoryStore, Record};
//! use serde_json::json;
//!
//! let mut todos = Collection::new("todos", MemoryStore::new()).unwrap();
//!
//! let mut walk = Record::from_value(json!({"task": "walk the dog"})).unwrap();
//! let id = todos.save(&mut walk).unwrap();
//! assert_eq!(id, Some(1));
//!
//! let open = todos.find(|r| r.get("done").is_none());
//! assert_eq!(open.len(), 1);
//! ```

mod clone;
mod codec;
mod collection;
mod error;
mod hooks;
mod meta;
mod record;
mod store;
mod view;

pub use clone::deep_clone;
pub use codec::{Codec, JsonCodec};
pub use collection::{Collection, UNGROUPED};
pub use error::{CollectionError, Hook};
pub use hooks::{ReadHook, WriteHook};
pub use meta::Metadata;
pub use record::{Record, RecordKey};
pub use store::{MemoryStore, Store};
