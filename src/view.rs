//! View - the materialized, ordered projection callers iterate over.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::record::Record;

/// The active filter installed by `find`, if any.
pub type Predicate = Box<dyn Fn(&Record) -> bool>;

/// Three-way ordering over records. Stability for equal keys is unspecified.
pub type Comparator<'a> = &'a dyn Fn(&Record, &Record) -> Ordering;

/// Ordered sequence of the ids currently visible to callers.
///
/// Derived state only: it is always rebuildable from the record map plus the
/// active predicate, and is rebuilt (not patched) whenever a query changes
/// what it must reflect. Save and remove use the append/remove fast paths.
#[derive(Debug, Default)]
pub(crate) struct View {
    order: Vec<u64>,
}

impl View {
    /// Rematerialize from the live id sequence, honoring the active
    /// predicate. Discovery order is the metadata map's insertion order.
    pub fn rebuild(
        &mut self,
        live: &[u64],
        records: &HashMap<u64, Record>,
        filter: Option<&Predicate>,
    ) {
        self.order.clear();
        for id in live {
            let Some(record) = records.get(id) else {
                continue;
            };
            if filter.map_or(true, |accepts| accepts(record)) {
                self.order.push(*id);
            }
        }
    }

    /// Append a newly saved id.
    pub fn push(&mut self, id: u64) {
        self.order.push(id);
    }

    /// Drop an id, preserving the order of the rest.
    pub fn remove(&mut self, id: u64) {
        self.order.retain(|held| *held != id);
    }

    /// Reorder in place; membership unchanged.
    pub fn sort_with(&mut self, records: &HashMap<u64, Record>, comparator: Comparator<'_>) {
        self.order.sort_by(|a, b| match (records.get(a), records.get(b)) {
            (Some(ra), Some(rb)) => comparator(ra, rb),
            _ => Ordering::Equal,
        });
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn ids(&self) -> &[u64] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.order.get(index).copied()
    }
}
