//! `Map<K, V, S>`: hash map keyed by the rendered bytes of its keys.
//!
//! Design
//! - Storage is a `SlotMap` of entries; a `HashTable<DefaultKey>` indexes
//!   them by hash. Iteration, `keys()` and `values()` follow slot order.
//! - Each entry stores its precomputed `u64` hash; rehashing the index uses
//!   the stored hash and never calls back into `MapKey`.
//! - Hashing feeds `MapKey::key_bytes` through the `S: BuildHasher`. The
//!   default `ByteSumState` sums `byte % 7`, which collides heavily but is
//!   deterministic across runs; pass any other `BuildHasher` through
//!   `with_hasher` for real workloads.
//!
//! Constraints
//! - Keys are unique; `set` on a present key replaces the value.
//! - A key and every borrowed form of it (`String`/`str`, `Str`/`[u8]`)
//!   must render to the same bytes and compare equal consistently.

use crate::slice::Slice;
use crate::str::Str;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use hashbrown::hash_table;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::borrow::Cow;

/// Byte rendering of a key used as hash input.
pub trait MapKey {
    fn key_bytes(&self) -> Cow<'_, [u8]>;
}

impl MapKey for Str {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl MapKey for [u8] {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl MapKey for str {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl MapKey for String {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

macro_rules! map_key_by_display {
    ($($t:ty),+ $(,)?) => {
        $(
            impl MapKey for $t {
                fn key_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Owned(self.to_string().into_bytes())
                }
            }
        )+
    };
}

map_key_by_display!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, bool, char);

/// Hasher that sums each input byte modulo 7.
#[derive(Copy, Clone, Debug, Default)]
pub struct ByteSumHasher {
    sum: u64,
}

impl Hasher for ByteSumHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.sum = self.sum.wrapping_add(u64::from(b % 7));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.sum
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct ByteSumState;

impl BuildHasher for ByteSumState {
    type Hasher = ByteSumHasher;

    fn build_hasher(&self) -> ByteSumHasher {
        ByteSumHasher::default()
    }
}

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

#[derive(Clone)]
pub struct Map<K, V, S = ByteSumState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> Map<K, V>
where
    K: Eq + MapKey,
{
    pub fn new() -> Self {
        Self::with_hasher(ByteSumState)
    }
}

impl<K, V, S> Default for Map<K, V, S>
where
    K: Eq + MapKey,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Iterator over `(key, value)` pairs in slot order.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &e.value))
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Eq + MapKey,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + MapKey,
    {
        let mut h = self.hasher.build_hasher();
        h.write(&q.key_bytes());
        h.finish()
    }

    fn find_slot<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + MapKey + Eq,
    {
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map_or(false, |e| e.key.borrow() == q)
            })
            .copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A map compares equal to nil when it has no entries.
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.is_empty()
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + MapKey + Eq,
    {
        self.find_slot(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + MapKey + Eq,
    {
        let k = self.find_slot(key)?;
        self.slots.get(k).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + MapKey + Eq,
    {
        let k = self.find_slot(key)?;
        self.slots.get_mut(k).map(|e| &mut e.value)
    }

    /// Insert or replace; returns the previous value if the key was present.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&k| slots.get(k).map_or(false, |e| e.key == key),
            |&k| slots.get(k).map_or(0, |e| e.hash),
        ) {
            hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                slots
                    .get_mut(k)
                    .map(|e| core::mem::replace(&mut e.value, value))
            }
            hash_table::Entry::Vacant(v) => {
                let k = slots.insert(Entry { key, value, hash });
                v.insert(k);
                None
            }
        }
    }

    /// `m[key]` for writing: the value under `key`, inserting the default
    /// first when absent.
    pub fn slot(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let hash = self.make_hash(&key);
        let slots = &mut self.slots;
        let k = match self.index.entry(
            hash,
            |&k| slots.get(k).map_or(false, |e| e.key == key),
            |&k| slots.get(k).map_or(0, |e| e.hash),
        ) {
            hash_table::Entry::Occupied(o) => *o.get(),
            hash_table::Entry::Vacant(v) => {
                let k = slots.insert(Entry {
                    key,
                    value: V::default(),
                    hash,
                });
                v.insert(k);
                k
            }
        };
        &mut slots[k].value
    }

    /// Remove `key`; returns its value if it was present.
    pub fn del<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + MapKey + Eq,
    {
        let hash = self.make_hash(key);
        let slots = &self.slots;
        let found = self
            .index
            .find_entry(hash, |&k| slots.get(k).map_or(false, |e| e.key.borrow() == key))
            .ok()?;
        let (k, _) = found.remove();
        self.slots.remove(k).map(|e| e.value)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn keys(&self) -> Slice<K>
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Slice<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }
}

impl<'a, K, V, S> IntoIterator for &'a Map<K, V, S>
where
    K: Eq + MapKey,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V, S> FromIterator<(K, V)> for Map<K, V, S>
where
    K: Eq + MapKey,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        for (k, v) in iter {
            m.set(k, v);
        }
        m
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Map<K, V>
where
    K: Eq + MapKey,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, S> PartialEq for Map<K, V, S>
where
    K: Eq + MapKey,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| ov == v))
    }
}

impl<K, V, S> Eq for Map<K, V, S>
where
    K: Eq + MapKey,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Display for Map<K, V, S>
where
    K: Eq + MapKey + fmt::Display,
    V: fmt::Display,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", k, v)?;
        }
        f.write_str("}")
    }
}

impl<K, V, S> fmt::Debug for Map<K, V, S>
where
    K: Eq + MapKey + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    #[test]
    fn byte_sum_matches_runtime_hash() {
        let m: Map<Str, i32> = Map::new();
        // 'a' = 97 -> 6, 'b' = 98 -> 0, 'c' = 99 -> 1
        assert_eq!(m.make_hash(&Str::from("abc")), 7);
        assert_eq!(m.make_hash(&Str::from("cba")), 7);
    }

    #[test]
    fn set_replaces_and_del_removes() {
        let mut m: Map<String, i32> = Map::new();
        assert_eq!(m.set("a".to_string(), 1), None);
        assert_eq!(m.set("a".to_string(), 2), Some(1));
        assert_eq!(m.get("a"), Some(&2));
        assert_eq!(m.len(), 1);
        assert_eq!(m.del("a"), Some(2));
        assert!(!m.has("a"));
        assert_eq!(m.del("a"), None);
        assert!(m.is_nil());
    }

    #[test]
    fn colliding_keys_resolve_by_equality() {
        // Permutations share a byte sum, so they land in one hash bucket.
        let mut m: Map<Str, usize> = Map::new();
        let keys = ["abc", "acb", "bac", "bca", "cab", "cba"];
        for (i, k) in keys.iter().enumerate() {
            m.set(Str::from(*k), i);
        }
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.get(k.as_bytes()), Some(&i));
        }
        m.del(b"bac".as_slice());
        assert!(!m.has(b"bac".as_slice()));
        assert_eq!(m.len(), 5);
    }

    #[test]
    fn slot_creates_on_miss() {
        let mut m: Map<i64, Vec<i64>> = Map::new();
        m.slot(3).push(1);
        m.slot(3).push(2);
        assert_eq!(m.get(&3), Some(&vec![1, 2]));
        *m.get_mut(&3).unwrap() = vec![];
        assert_eq!(m.get(&3).map(Vec::len), Some(0));
    }

    #[test]
    fn keys_values_and_display_follow_slot_order() {
        let m = Map::from([(1, "x"), (2, "y")]);
        assert_eq!(m.keys().len(), m.values().len());
        assert_eq!(m.keys(), [1, 2]);
        assert_eq!(m.to_string(), "{1:x, 2:y}");
    }

    #[test]
    fn equality_ignores_order_and_hasher_state() {
        let a: Map<i32, i32> = [(1, 1), (2, 2)].into_iter().collect();
        let b: Map<i32, i32> = [(2, 2), (1, 1)].into_iter().collect();
        assert_eq!(a, b);
        let mut c: Map<i32, i32, RandomState> = Map::default();
        c.set(1, 1);
        assert!(c.has(&1));
    }
}
