//! IntMap: dense entry storage indexed by a `hashbrown::HashTable`.
//!
//! Entries live contiguously in a `Vec`; the table stores positions into it
//! and each entry keeps its precomputed hash, so the index never re-hashes
//! keys on growth. Removal swaps the last entry into the hole and repoints
//! its index slot.
//!
//! A version counter changes on every structural mutation (new key, removal,
//! drain). A `Cursor` records the version it was opened at and refuses to
//! move once the map has changed shape underneath it.

use crate::error::MapError;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub struct IntMap<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<usize>,
    entries: Vec<Entry<K, V>>,
    version: u64,
}

/// Resumable position over an `IntMap`'s keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Cursor {
    pos: usize,
    version: u64,
}

impl Cursor {
    /// Number of keys already yielded.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<K, V> IntMap<K, V>
where
    K: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(0, Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for IntMap<K, V>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowing iterator over `(key, value)` pairs in storage order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V, S> IntMap<K, V, S>
where
    K: Copy + Eq + Hash,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            version: 0,
        }
    }

    fn make_hash(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    fn position(&self, key: &K) -> Option<usize> {
        let hash = self.make_hash(key);
        let entries = &self.entries;
        self.index.find(hash, |&i| entries[i].key == *key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Structural version; changes whenever the key set changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.position(key).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = self.position(key)?;
        Some(&mut self.entries[i].value)
    }

    /// Insert or overwrite. On overwrite the new value is stored first and
    /// the previous one is returned to the caller to drop.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let entries = &self.entries;
        match self.index.entry(
            hash,
            |&i| entries[i].key == key,
            |&i| entries[i].hash,
        ) {
            TableEntry::Occupied(o) => {
                let i = *o.get();
                Some(core::mem::replace(&mut self.entries[i].value, value))
            }
            TableEntry::Vacant(v) => {
                let pos = self.entries.len();
                v.insert(pos);
                self.entries.push(Entry { key, value, hash });
                bump(&mut self.version);
                None
            }
        }
    }

    /// Remove `key`, returning the owned pair. The map is consistent again
    /// before the pair is handed out, so dropping it may reenter the map.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.make_hash(key);
        let entries = &self.entries;
        let pos = match self.index.find_entry(hash, |&i| entries[i].key == *key) {
            Ok(occupied) => occupied.remove().0,
            Err(_) => return None,
        };

        let last = self.entries.len() - 1;
        if pos != last {
            let moved_hash = self.entries[last].hash;
            let slot = self
                .index
                .find_mut(moved_hash, |&i| i == last)
                .expect("last entry must be indexed");
            *slot = pos;
        }
        let entry = self.entries.swap_remove(pos);
        bump(&mut self.version);
        Some((entry.key, entry.value))
    }

    /// Remove every entry, handing them out in storage order.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        self.index.clear();
        if !self.entries.is_empty() {
            bump(&mut self.version);
        }
        core::mem::take(&mut self.entries)
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.entries.iter(),
        }
    }

    /// Open a cursor at the first key.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            pos: 0,
            version: self.version,
        }
    }

    /// Whether `cursor` has a key left. A stale cursor reports `true` so the
    /// following `advance` surfaces the invalidation.
    pub fn has_next(&self, cursor: &Cursor) -> bool {
        cursor.version != self.version || cursor.pos < self.entries.len()
    }

    /// Yield the key under `cursor` and move past it.
    pub fn advance(&self, cursor: &mut Cursor) -> Result<K, MapError> {
        if cursor.version != self.version {
            return Err(MapError::IteratorInvalidated);
        }
        let entry = self
            .entries
            .get(cursor.pos)
            .ok_or(MapError::IteratorExhausted)?;
        cursor.pos += 1;
        Ok(entry.key)
    }
}

fn bump(version: &mut u64) {
    *version = version.wrapping_add(1);
}
