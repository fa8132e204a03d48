// Copyright © 2024 Pathway

use std::collections::HashMap;
use std::hash::Hash;
use std::mem;

use id_arena::{Arena, ArenaBehavior};

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub(crate) struct BucketHandle {
    arena_id: u32,
    index: usize,
}

impl ArenaBehavior for BucketHandle {
    type Id = Self;

    fn new_id(arena_id: u32, index: usize) -> Self {
        Self { arena_id, index }
    }

    fn arena_id(handle: Self) -> u32 {
        handle.arena_id
    }

    fn index(handle: Self) -> usize {
        handle.index
    }
}

/// Left records of a single key, in arrival order.
struct Bucket<T> {
    records: Vec<T>,
    matched: bool,
}

/// Left-side storage: every key points at one bucket in an append-only arena.
///
/// A bucket starts unmatched and is flipped to matched the first time a right
/// record refers to its key. The flip is the only change a bucket sees after
/// the left side is sealed, so a matched bucket serves every later right
/// record with the same key unchanged.
pub(crate) struct Buckets<K, T> {
    index: HashMap<K, BucketHandle>,
    arena: Arena<Bucket<T>, BucketHandle>,
}

impl<K, T> Default for Buckets<K, T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            arena: Arena::new(),
        }
    }
}

impl<K: Eq + Hash, T> Buckets<K, T> {
    /// Appends `record` to the bucket of `key`. Returns `true` if the key
    /// was seen for the first time.
    pub(crate) fn insert(&mut self, key: K, record: T) -> bool {
        let mut created = false;
        let handle = *self.index.entry(key).or_insert_with(|| {
            created = true;
            self.arena.alloc(Bucket {
                records: Vec::new(),
                matched: false,
            })
        });
        self.arena[handle].records.push(record);
        created
    }

    /// Looks up `key` for a right record, marking its bucket as matched.
    /// The flag tells whether this was the first reference to the key.
    pub(crate) fn mark_matched(&mut self, key: &K) -> Option<(&[T], bool)> {
        let handle = *self.index.get(key)?;
        let bucket = &mut self.arena[handle];
        let first_reference = !mem::replace(&mut bucket.matched, true);
        Some((bucket.records.as_slice(), first_reference))
    }

    pub(crate) fn keys(&self) -> usize {
        self.index.len()
    }

    /// Records of every bucket that was never matched, grouped by key in the
    /// order the keys first arrived.
    pub(crate) fn into_unmatched(mut self) -> Vec<Vec<T>> {
        self.arena
            .iter_mut()
            .filter(|(_handle, bucket)| !bucket.matched)
            .map(|(_handle, bucket)| mem::take(&mut bucket.records))
            .collect()
    }
}
