//! Concurrent keyed record store.
//!
//! A thin wrapper over [`DashMap`], which shards the key space behind
//! independent read/write locks. Single-key operations lock one shard for
//! the duration of the call; listing walks the shards one at a time and
//! copies values out, so writers are never held up for the whole map.
//!
//! Read-modify-write sequences go through [`RecordStore::update`] or
//! [`RecordStore::try_update`], which run the mutation while holding the
//! key's entry lock. Two concurrent updates of one key are serialized and
//! neither is lost.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::trace;

/// Thread-safe map from string id to record.
///
/// Values handed out are clones: mutating them never affects the store.
#[derive(Debug)]
pub struct RecordStore<T> {
    data: DashMap<String, T>,
}

impl<T: Clone> RecordStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Insert or overwrite the record at `id`. Returns the previous record.
    pub fn put(&self, id: impl Into<String>, record: T) -> Option<T> {
        let id = id.into();
        trace!(id = %id, "put");
        self.data.insert(id, record)
    }

    /// Insert only if `id` is vacant. Returns `false` (and drops `record`)
    /// when the key is already taken.
    pub fn insert_new(&self, id: impl Into<String>, record: T) -> bool {
        match self.data.entry(id.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                trace!(id = %slot.key(), "insert_new");
                slot.insert(record);
                true
            }
        }
    }

    /// Current record at `id`, if any.
    pub fn get(&self, id: &str) -> Option<T> {
        self.data.get(id).map(|entry| entry.value().clone())
    }

    /// Whether a record exists at `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    /// Delete the record at `id`. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.data.remove(id).is_some();
        trace!(id, removed, "remove");
        removed
    }

    /// Mutate the record at `id` under its entry lock.
    ///
    /// Returns `None` without calling `f` if the key is absent. `f` must not
    /// call back into this store.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut entry = self.data.get_mut(id)?;
        trace!(id, "update");
        Some(f(entry.value_mut()))
    }

    /// Fallible variant of [`update`](Self::update).
    ///
    /// `f` works on a copy that is written back only if it returns `Ok`, so
    /// a failed mutation leaves the stored record untouched.
    pub fn try_update<R, E>(
        &self,
        id: &str,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<Option<R>, E> {
        let Some(mut entry) = self.data.get_mut(id) else {
            return Ok(None);
        };
        let mut draft = entry.value().clone();
        let out = f(&mut draft)?;
        *entry.value_mut() = draft;
        trace!(id, "try_update");
        Ok(Some(out))
    }

    /// Point-in-time copy of every record.
    ///
    /// Shards are visited one after another, so writes racing with the
    /// listing may or may not be reflected.
    pub fn list_all(&self) -> Vec<T> {
        self.data.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot, then keep the records matching `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.list_all().into_iter().filter(|record| pred(record)).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Replace the whole content, e.g. when loading a persisted snapshot.
    ///
    /// Not atomic with respect to concurrent writers; call before the store
    /// is shared.
    pub fn replace_all(&self, records: impl IntoIterator<Item = (String, T)>) {
        self.data.clear();
        for (id, record) in records {
            self.data.insert(id, record);
        }
    }
}

impl<T: Clone> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn put_get_remove() {
        let store = RecordStore::new();
        assert_eq!(store.put("a", 1), None);
        assert_eq!(store.put("a", 2), Some(1));
        assert_eq!(store.get("a"), Some(2));
        assert!(store.contains("a"));

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.get("a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn removed_id_can_be_reused() {
        let store = RecordStore::new();
        assert!(store.insert_new("a", 1));
        assert!(!store.insert_new("a", 2));
        assert_eq!(store.get("a"), Some(1));

        store.remove("a");
        assert!(store.insert_new("a", 3));
        assert_eq!(store.get("a"), Some(3));
    }

    #[test]
    fn snapshot_is_independent() {
        let store = RecordStore::new();
        store.put("a", vec![1]);

        let mut snapshot = store.list_all();
        snapshot[0].push(99);
        store.put("b", vec![2]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get("a"), Some(vec![1]));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_absent_key_is_none() {
        let store: RecordStore<i32> = RecordStore::new();
        let mut called = false;
        assert_eq!(store.update("missing", |_| called = true), None);
        assert!(!called);
        assert!(store.is_empty());
    }

    #[test]
    fn try_update_failure_leaves_record() {
        let store = RecordStore::new();
        store.put("a", 10);

        let res: Result<Option<()>, &str> = store.try_update("a", |v| {
            *v = 0;
            Err("nope")
        });
        assert_eq!(res, Err("nope"));
        assert_eq!(store.get("a"), Some(10));

        let res: Result<Option<i32>, &str> = store.try_update("a", |v| {
            *v += 1;
            Ok(*v)
        });
        assert_eq!(res, Ok(Some(11)));
        assert_eq!(store.get("a"), Some(11));
    }

    #[test]
    fn filter_and_replace_all() {
        let store = RecordStore::new();
        store.replace_all((0..10).map(|i| (i.to_string(), i)));
        let mut even = store.filter(|v| v % 2 == 0);
        even.sort();
        assert_eq!(even, vec![0, 2, 4, 6, 8]);

        store.replace_all([("x".to_string(), 42)]);
        assert_eq!(store.list_all(), vec![42]);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_puts_to_distinct_keys_are_all_kept() {
        let store = RecordStore::new();
        std::thread::scope(|s| {
            for worker in 0..8 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..250 {
                        store.put(format!("{worker}-{i}"), i);
                    }
                });
            }
        });
        assert_eq!(store.len(), 2000);
        let keys: HashSet<_> = store.data.iter().map(|e| e.key().clone()).collect();
        assert_eq!(keys.len(), 2000);
    }

    #[test]
    fn concurrent_same_key_puts_leave_one_whole_value() {
        let store = RecordStore::new();
        std::thread::scope(|s| {
            for worker in 0..8u32 {
                let store = &store;
                s.spawn(move || {
                    for _ in 0..200 {
                        store.put("k", (worker, worker.to_string()));
                    }
                });
            }
        });
        let (n, text) = store.get("k").unwrap();
        assert_eq!(n.to_string(), text);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = RecordStore::new();
        store.put("counter", 0u64);
        std::thread::scope(|s| {
            for _ in 0..8 {
                let store = &store;
                s.spawn(move || {
                    for _ in 0..1000 {
                        store.update("counter", |n| *n += 1);
                    }
                });
            }
        });
        assert_eq!(store.get("counter"), Some(8000));
    }

    #[test]
    fn listing_while_writing_sees_a_consistent_subset() {
        let store = RecordStore::new();
        std::thread::scope(|s| {
            let writer = &store;
            s.spawn(move || {
                for i in 0..1000 {
                    writer.put(format!("k{i}"), i);
                }
            });
            for _ in 0..20 {
                let snapshot = store.list_all();
                assert!(snapshot.len() <= 1000);
                let unique: HashSet<_> = snapshot.iter().collect();
                assert_eq!(unique.len(), snapshot.len());
            }
        });
        assert_eq!(store.len(), 1000);
    }
}
