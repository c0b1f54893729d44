//! ChainedHashTable: separate chaining with load-factor driven doubling.
//!
//! The chain type is pluggable through [`Bucket`]. Every bucket is created
//! with `B::default()`, so swapping `Vec` for another container changes
//! how collisions are stored without touching the table logic.

use crate::config::TableConfig;
use crate::entry::Entry;
use crate::error::ConfigError;
use crate::map::Map;
use crate::reentrancy::ReentryCheck;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, warn};
use std::collections::VecDeque;

/// An entry together with the hash computed when it was inserted.
///
/// Rehashing reuses the cached hash, so `K: Hash` never runs during a resize.
pub struct Slot<K, V> {
    hash: u64,
    entry: Entry<K, V>,
}

impl<K, V> Slot<K, V> {
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn entry(&self) -> &Entry<K, V> {
        &self.entry
    }
}

/// Storage for one chain of colliding slots.
///
/// Order inside a bucket carries no meaning; the table only appends,
/// looks up by position and removes by swapping.
pub trait Bucket<K, V>: Default + IntoIterator<Item = Slot<K, V>> {
    type Iter<'a>: Iterator<Item = &'a Slot<K, V>> + Clone
    where
        Self: 'a, K: 'a, V: 'a;

    fn push(&mut self, slot: Slot<K, V>);

    fn slot(&self, pos: usize) -> Option<&Slot<K, V>>;

    fn slot_mut(&mut self, pos: usize) -> Option<&mut Slot<K, V>>;

    /// Remove the slot at `pos`; another slot may move into its place.
    fn swap_remove(&mut self, pos: usize) -> Option<Slot<K, V>>;

    fn len(&self) -> usize;

    fn iter(&self) -> Self::Iter<'_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the first slot matching `pred`.
    fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&Slot<K, V>) -> bool,
    {
        self.iter().position(pred)
    }
}

impl<K, V> Bucket<K, V> for Vec<Slot<K, V>> {
    type Iter<'a>
        = core::slice::Iter<'a, Slot<K, V>>
    where
        Self: 'a, K: 'a, V: 'a;

    fn push(&mut self, slot: Slot<K, V>) {
        Vec::push(self, slot)
    }

    fn slot(&self, pos: usize) -> Option<&Slot<K, V>> {
        self.as_slice().get(pos)
    }

    fn slot_mut(&mut self, pos: usize) -> Option<&mut Slot<K, V>> {
        self.as_mut_slice().get_mut(pos)
    }

    fn swap_remove(&mut self, pos: usize) -> Option<Slot<K, V>> {
        (pos < Vec::len(self)).then(|| Vec::swap_remove(self, pos))
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.as_slice().iter()
    }
}

impl<K, V> Bucket<K, V> for VecDeque<Slot<K, V>> {
    type Iter<'a>
        = std::collections::vec_deque::Iter<'a, Slot<K, V>>
    where
        Self: 'a, K: 'a, V: 'a;

    fn push(&mut self, slot: Slot<K, V>) {
        self.push_back(slot)
    }

    fn slot(&self, pos: usize) -> Option<&Slot<K, V>> {
        VecDeque::get(self, pos)
    }

    fn slot_mut(&mut self, pos: usize) -> Option<&mut Slot<K, V>> {
        VecDeque::get_mut(self, pos)
    }

    fn swap_remove(&mut self, pos: usize) -> Option<Slot<K, V>> {
        self.swap_remove_back(pos)
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        VecDeque::iter(self)
    }
}

/// Chained hash table whose buckets are ring buffers.
pub type DequeChainedHashTable<K, V> =
    ChainedHashTable<K, V, DefaultHashBuilder, VecDeque<Slot<K, V>>>;

fn new_buckets<B: Default>(count: usize) -> Vec<B> {
    (0..count).map(|_| B::default()).collect()
}

// Unsigned remainder: always a valid index, whatever the hash.
#[inline]
fn bucket_index(hash: u64, bucket_count: usize) -> usize {
    (hash % bucket_count as u64) as usize
}

fn exceeds_load_factor(len: usize, bucket_count: usize, max_load_factor: f64) -> bool {
    len as f64 / bucket_count as f64 > max_load_factor
}

// Smallest doubling of `old_count` that satisfies the load factor, or the
// largest doubling that fits in a usize.
fn grown_bucket_count(old_count: usize, len: usize, max_load_factor: f64) -> usize {
    let mut count = old_count;
    while let Some(next) = count.checked_mul(2) {
        count = next;
        if !exceeds_load_factor(len, count, max_load_factor) {
            break;
        }
    }
    count
}

// Move every slot to its bucket under the grown count. Bucket order is
// unspecified, so the chains are simply appended to.
fn grow<K, V, B>(buckets: &mut Vec<B>, len: usize, max_load_factor: f64)
where
    B: Bucket<K, V>,
{
    let old_count = buckets.len();
    let new_count = grown_bucket_count(old_count, len, max_load_factor);
    if new_count == old_count {
        warn!("chained hash table cannot grow past {} buckets", old_count);
        return;
    }

    let mut rehashed: Vec<B> = new_buckets(new_count);
    for slot in buckets.drain(..).flatten() {
        rehashed[bucket_index(slot.hash, new_count)].push(slot);
    }
    *buckets = rehashed;
    debug!(
        "chained hash table resized from {} to {} buckets ({} entries)",
        old_count, new_count, len
    );
}

/// Hash table whose buckets are unordered chains of entries.
///
/// After every insertion `len() / bucket_count() <= max_load_factor()`;
/// when an insertion breaks that, the bucket array is doubled and every
/// entry redistributed before `put` returns. Removal never shrinks it.
pub struct ChainedHashTable<K, V, S = DefaultHashBuilder, B = Vec<Slot<K, V>>> {
    hasher: S,
    buckets: Vec<B>,
    len: usize,
    max_load_factor: f64,
    reentrancy: ReentryCheck,
    _slots: core::marker::PhantomData<fn() -> (K, V)>,
}

impl<K, V> ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    /// 16 buckets, load factor 0.75.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(initial_capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::default().initial_capacity(initial_capacity))
    }

    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        max_load_factor: f64,
    ) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new(initial_capacity, max_load_factor))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V, S, B> Default for ChainedHashTable<K, V, S, B>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    B: Bucket<K, V>,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S, B> ChainedHashTable<K, V, S, B>
where
    K: Eq + Hash,
    S: BuildHasher,
    B: Bucket<K, V>,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(TableConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, hasher))
    }

    fn from_parts(config: TableConfig, hasher: S) -> Self {
        Self {
            hasher,
            buckets: new_buckets(config.initial_capacity),
            len: 0,
            max_load_factor: config.max_load_factor,
            reentrancy: ReentryCheck::new(),
            _slots: core::marker::PhantomData,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    // (bucket, position within bucket) of the entry for `q`.
    fn locate<Q>(&self, q: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let b = bucket_index(hash, self.buckets.len());
        self.buckets[b]
            .position(|s| s.hash == hash && s.entry.key().borrow() == q)
            .map(|pos| (b, pos))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (b, pos) = self.locate(q)?;
        self.buckets[b].slot(pos).map(|s| s.entry.value())
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = {
            let _g = self.reentrancy.enter();
            self.locate(q)
        };
        let (b, pos) = found?;
        self.buckets[b].slot_mut(pos).map(|s| s.entry.value_mut())
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).is_some()
    }

    /// Insert or replace; returns the replaced value. May trigger a full
    /// rehash into a larger bucket array.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        let b = bucket_index(hash, self.buckets.len());
        let bucket = &mut self.buckets[b];
        let found = bucket.position(|s| s.hash == hash && s.entry.key() == &key);
        if let Some(pos) = found {
            if let Some(slot) = bucket.slot_mut(pos) {
                return Some(slot.entry.replace_value(value));
            }
        }
        bucket.push(Slot {
            hash,
            entry: Entry::new(key, value),
        });
        self.len += 1;
        if exceeds_load_factor(self.len, self.buckets.len(), self.max_load_factor) {
            grow::<K, V, B>(&mut self.buckets, self.len, self.max_load_factor);
        }
        None
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (b, pos) = self.locate(q)?;
        let slot = self.buckets[b].swap_remove(pos)?;
        self.len -= 1;
        Some(slot.entry.into_parts())
    }

    /// Remove `q` only when its stored value equals `expected`.
    pub fn remove_if_eq<Q>(&mut self, q: &Q, expected: &V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let _g = self.reentrancy.enter();
        let (b, pos) = self.locate(q)?;
        if self.buckets[b].slot(pos)?.entry.value() != expected {
            return None;
        }
        let slot = self.buckets[b].swap_remove(pos)?;
        self.len -= 1;
        Some(slot.entry.into_parts().1)
    }

    /// Drop every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        let old = {
            let _g = self.reentrancy.enter();
            let count = self.buckets.len();
            debug!("clearing chained hash table ({} entries, {} buckets)", self.len, count);
            self.len = 0;
            core::mem::replace(&mut self.buckets, new_buckets(count))
        };
        // Entries drop after the table is consistent again.
        drop(old);
    }

    pub fn iter(&self) -> Iter<'_, K, V, B> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V, B> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let count = self.buckets.len();
        assert!(count > 0, "bucket array must never be empty");
        let mut total = 0;
        for (b, bucket) in self.buckets.iter().enumerate() {
            for (i, slot) in bucket.iter().enumerate() {
                assert_eq!(slot.hash(), self.make_hash(slot.entry().key()), "stale cached hash");
                assert_eq!(bucket_index(slot.hash(), count), b, "entry in wrong bucket");
                for other in bucket.iter().skip(i + 1) {
                    assert!(other.entry().key() != slot.entry().key(), "duplicate key");
                }
            }
            total += bucket.len();
        }
        assert_eq!(total, self.len, "len out of sync with stored entries");
        assert!(self.load_factor() <= self.max_load_factor, "load factor exceeded");
    }
}

/// Iterator over `(key, value)` pairs in bucket order.
pub struct Iter<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    buckets: core::slice::Iter<'a, B>,
    current: Option<B::Iter<'a>>,
    remaining: usize,
}

impl<'a, K, V, B> Iterator for Iter<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some(slot.entry.as_pair());
            }
            self.current = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, B> ExactSizeIterator for Iter<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
}

impl<'a, K, V, B> FusedIterator for Iter<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
}

impl<'a, K, V, B> Clone for Iter<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            current: self.current.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over keys, in no particular order.
pub struct Keys<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    inner: Iter<'a, K, V, B>,
}

impl<'a, K, V, B> Iterator for Keys<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, B> ExactSizeIterator for Keys<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
}

impl<'a, K, V, B> FusedIterator for Keys<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
}

impl<'a, K, V, B> Clone for Keys<'a, K, V, B>
where
    B: Bucket<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, S, B> IntoIterator for &'a ChainedHashTable<K, V, S, B>
where
    K: Eq + Hash + 'a,
    V: 'a,
    S: BuildHasher,
    B: Bucket<K, V> + 'a,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S, B> Extend<(K, V)> for ChainedHashTable<K, V, S, B>
where
    K: Eq + Hash,
    S: BuildHasher,
    B: Bucket<K, V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S, B> FromIterator<(K, V)> for ChainedHashTable<K, V, S, B>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    B: Bucket<K, V>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

impl<K, V, S, B> fmt::Debug for ChainedHashTable<K, V, S, B>
where
    K: fmt::Debug + Eq + Hash,
    V: fmt::Debug,
    S: BuildHasher,
    B: Bucket<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, B> Map<K, V> for ChainedHashTable<K, V, S, B>
where
    K: Eq + Hash,
    S: BuildHasher,
    B: Bucket<K, V>,
{
    type Keys<'a>
        = Keys<'a, K, V, B>
    where
        Self: 'a,
        K: 'a;

    fn put(&mut self, key: K, value: V) -> Option<V> {
        ChainedHashTable::put(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        ChainedHashTable::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        ChainedHashTable::get_mut(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        ChainedHashTable::contains_key(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        ChainedHashTable::remove(self, key)
    }

    fn remove_if_eq(&mut self, key: &K, expected: &V) -> Option<V>
    where
        V: PartialEq,
    {
        ChainedHashTable::remove_if_eq(self, key, expected)
    }

    fn clear(&mut self) {
        ChainedHashTable::clear(self)
    }

    fn keys(&self) -> Self::Keys<'_> {
        ChainedHashTable::keys(self)
    }
}
