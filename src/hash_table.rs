//! A byte-keyed hash table with chained collision resolution.
//!
//! Buckets hold the head of a singly linked chain. Chain nodes live in an
//! [`EntryArena`] owned by the table, so inserting a new key costs an arena
//! slot and a copy of the key bytes rather than a fresh node allocation.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::entry_arena::DEFAULT_BLOCK_SIZE;
use crate::entry_arena::EntryArena;
use crate::entry_arena::NodeHandle;
use crate::error::Error;
use crate::hash::DefaultKeyHasher;
use crate::hash::KeyHasher;

/// Bucket count of a table built with [`HashTable::new`]. Shrinking never goes
/// below this.
pub const MIN_BUCKETS: usize = 8;

/// Growing stops once the bucket count reaches this value.
pub const MAX_BUCKETS: usize = (1 << 31) - 1;

#[inline(always)]
fn check_buckets(buckets: usize) -> Result<(), Error> {
    // Masks are 32 bits wide, so the power of two just past MAX_BUCKETS is the
    // largest table that can exist.
    if buckets.is_power_of_two() && buckets <= MAX_BUCKETS + 1 {
        Ok(())
    } else {
        Err(Error::InvalidCapacity { requested: buckets })
    }
}

/// Construction parameters for a [`HashTable`].
///
/// # Examples
///
/// ```rust
/// # use chain_hash::Config;
/// # use chain_hash::HashTable;
/// # use chain_hash::hash::DefaultKeyHasher;
/// #
/// let config = Config {
///     buckets: 1024,
///     block_size: 256,
///     ..Config::default()
/// };
/// let table: HashTable<u32> = HashTable::with_config(config, DefaultKeyHasher).unwrap();
/// assert_eq!(table.bucket_count(), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Initial bucket count. Must be a power of two.
    pub buckets: usize,
    /// Number of nodes allocated together by the node arena.
    pub block_size: usize,
    /// Whether the table grows and shrinks on its own.
    pub resizable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buckets: MIN_BUCKETS,
            block_size: DEFAULT_BLOCK_SIZE,
            resizable: true,
        }
    }
}

/// Occupancy statistics reported by [`HashTable::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Number of live entries.
    pub elements: usize,
    /// Number of buckets.
    pub buckets: usize,
    /// Number of buckets holding at least one entry.
    pub occupied_slots: usize,
    /// Length of the longest chain.
    pub longest_chain: usize,
    /// Mean chain length over occupied buckets, `0.0` when all are empty.
    pub mean_chain: f64,
}

/// One stored association, as held by the table's arena.
#[derive(Clone)]
pub struct Node<V> {
    hash: u32,
    key: Box<[u8]>,
    value: V,
    next: Option<NodeHandle>,
}

impl<V> Node<V> {
    /// The cached hash of the key.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// The key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline(always)]
    fn matches(&self, hash: u32, key: &[u8]) -> bool {
        self.key.len() == key.len() && self.hash == hash && *self.key == *key
    }
}

/// A hash table keyed by byte strings.
///
/// The bucket count is always a power of two. With resizing enabled the table
/// doubles once it holds more entries than buckets and halves (down to
/// [`MIN_BUCKETS`]) once it holds fewer than a quarter as many.
///
/// Keys compare equal when they have the same length, the same hash and the
/// same bytes. Hash collisions between different keys never produce a match.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::HashTable;
/// #
/// let mut table = HashTable::new();
/// table.set(b"foo", "bar");
/// assert_eq!(table.get(b"foo"), Some(&"bar"));
///
/// table.set(b"foo", "baz");
/// assert_eq!(table.len(), 1);
///
/// assert_eq!(table.remove(b"foo"), Some("baz"));
/// assert_eq!(table.get(b"foo"), None);
/// ```
#[derive(Clone)]
pub struct HashTable<V, H = DefaultKeyHasher> {
    buckets: Vec<Option<NodeHandle>>,
    mask: u32,
    pub(crate) used: usize,
    hasher: H,
    resizable: bool,
    arena: EntryArena<Node<V>>,
}

impl<V, H> Debug for HashTable<V, H>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`MIN_BUCKETS`] buckets and the default
    /// hash function.
    pub fn new() -> Self {
        Self::with_hasher(DefaultKeyHasher)
    }

    /// Creates an empty table with `buckets` buckets and the default hash
    /// function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `buckets` is zero or not a power
    /// of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::Error;
    /// # use chain_hash::HashTable;
    /// #
    /// assert!(HashTable::<u8>::with_buckets(8).is_ok());
    /// assert_eq!(
    ///     HashTable::<u8>::with_buckets(3).unwrap_err(),
    ///     Error::InvalidCapacity { requested: 3 }
    /// );
    /// ```
    pub fn with_buckets(buckets: usize) -> Result<Self, Error> {
        Self::with_buckets_and_hasher(buckets, DefaultKeyHasher)
    }
}

impl<V, H> Default for HashTable<V, H>
where
    H: KeyHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<V, H> HashTable<V, H>
where
    H: KeyHasher,
{
    /// Creates an empty table with [`MIN_BUCKETS`] buckets that hashes keys
    /// with `hasher`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_hasher(|key: &[u8]| key.len() as u32);
    /// table.set(b"one", 1);
    /// table.set(b"two", 2);
    /// assert_eq!(table.get(b"two"), Some(&2));
    /// ```
    pub fn with_hasher(hasher: H) -> Self {
        Self::from_config(Config::default(), hasher)
    }

    /// Creates an empty table with `buckets` buckets that hashes keys with
    /// `hasher`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `buckets` is zero or not a power
    /// of two.
    pub fn with_buckets_and_hasher(buckets: usize, hasher: H) -> Result<Self, Error> {
        Self::with_config(
            Config {
                buckets,
                ..Config::default()
            },
            hasher,
        )
    }

    /// Creates an empty table from `config` that hashes keys with `hasher`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `config.buckets` is zero or not a
    /// power of two.
    pub fn with_config(config: Config, hasher: H) -> Result<Self, Error> {
        check_buckets(config.buckets)?;
        Ok(Self::from_config(config, hasher))
    }

    fn from_config(config: Config, hasher: H) -> Self {
        Self {
            buckets: vec![None; config.buckets],
            mask: (config.buckets - 1) as u32,
            used: 0,
            hasher,
            resizable: config.resizable,
            arena: EntryArena::with_block_size(config.block_size),
        }
    }

    /// Associates `value` with `key`, returning the value it replaces.
    ///
    /// A new key is copied into the table. An existing key keeps its node and
    /// only the value changes.
    pub fn set(&mut self, key: &[u8], value: V) -> Option<V> {
        let hash = self.hasher.hash(key);
        let index = self.bucket_index(hash);

        if let Some(handle) = self.find_in_chain(index, hash, key) {
            return Some(core::mem::replace(&mut self.arena[handle].value, value));
        }

        let handle = self.arena.acquire(Node {
            hash,
            key: Box::from(key),
            value,
            next: self.buckets[index],
        });
        self.buckets[index] = Some(handle);
        self.used += 1;

        if self.resizable && self.used > self.buckets.len() {
            self.grow();
        }

        None
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let hash = self.hasher.hash(key);
        let handle = self.find_in_chain(self.bucket_index(hash), hash, key)?;
        Some(&self.arena[handle].value)
    }

    /// Returns the value stored for `key` mutably.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let hash = self.hasher.hash(key);
        let handle = self.find_in_chain(self.bucket_index(hash), hash, key)?;
        Some(&mut self.arena[handle].value)
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key` from the table and returns its value.
    ///
    /// Removing an absent key does nothing.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let hash = self.hasher.hash(key);
        let index = self.bucket_index(hash);

        let mut prev: Option<NodeHandle> = None;
        let mut cursor = self.buckets[index];
        while let Some(handle) = cursor {
            let node = &self.arena[handle];
            let next = node.next;

            if node.matches(hash, key) {
                match prev {
                    Some(prev) => self.arena[prev].next = next,
                    None => self.buckets[index] = next,
                }
                let node = self.arena.release(handle);
                self.used -= 1;

                if self.resizable
                    && self.buckets.len() > MIN_BUCKETS
                    && self.used < self.buckets.len() >> 2
                {
                    self.shrink();
                }

                return Some(node.value);
            }

            prev = Some(handle);
            cursor = next;
        }

        None
    }

    #[inline(always)]
    fn find_in_chain(&self, index: usize, hash: u32, key: &[u8]) -> Option<NodeHandle> {
        self.chain(self.buckets[index])
            .find(|(_, node)| node.matches(hash, key))
            .map(|(handle, _)| handle)
    }
}

impl<V, H> HashTable<V, H> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.used
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The hash function in use.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The arena holding the table's nodes.
    pub fn arena(&self) -> &EntryArena<Node<V>> {
        &self.arena
    }

    /// Returns `true` if the table grows and shrinks on its own.
    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Turns automatic growing and shrinking on or off.
    pub fn set_resizable(&mut self, resizable: bool) {
        self.resizable = resizable;
    }

    /// Rebuilds the table with `buckets` buckets.
    ///
    /// Every node is relinked under the new mask; no node is reallocated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `buckets` is zero or not a power
    /// of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set(b"foo", 1);
    /// table.resize(64).unwrap();
    /// assert_eq!(table.bucket_count(), 64);
    /// assert_eq!(table.get(b"foo"), Some(&1));
    /// assert!(table.resize(48).is_err());
    /// ```
    pub fn resize(&mut self, buckets: usize) -> Result<(), Error> {
        check_buckets(buckets)?;
        if buckets != self.buckets.len() {
            self.rehash(buckets);
        }
        Ok(())
    }

    /// Removes every entry. The bucket count and the arena's blocks are kept.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.buckets.fill(None);
        self.used = 0;
    }

    /// Returns an iterator over `(key, value)` pairs in bucket order, then
    /// chain order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: self.chain(None),
            remaining: self.used,
        }
    }

    /// Returns an iterator over the keys, in the same order as [`iter`].
    ///
    /// [`iter`]: HashTable::iter
    pub fn keys(&self) -> Keys<'_, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in the same order as [`iter`].
    ///
    /// [`iter`]: HashTable::iter
    pub fn values(&self) -> Values<'_, V> {
        Values { inner: self.iter() }
    }

    /// Collects every key.
    pub fn all_keys(&self) -> Vec<&[u8]> {
        self.keys().collect()
    }

    /// Collects every value.
    pub fn all(&self) -> Vec<&V> {
        self.values().collect()
    }

    /// Reports element, bucket and chain statistics.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let table: HashTable<()> = HashTable::new();
    /// let stats = table.stats();
    /// assert_eq!(stats.buckets, 8);
    /// assert_eq!(stats.occupied_slots, 0);
    /// assert_eq!(stats.mean_chain, 0.0);
    /// ```
    pub fn stats(&self) -> Stats {
        let mut occupied_slots = 0;
        let mut longest_chain = 0;
        let mut total = 0;

        for &head in &self.buckets {
            let length = self.chain(head).count();
            if length > 0 {
                occupied_slots += 1;
            }
            longest_chain = longest_chain.max(length);
            total += length;
        }

        Stats {
            elements: self.used,
            buckets: self.buckets.len(),
            occupied_slots,
            longest_chain,
            mean_chain: if occupied_slots == 0 {
                0.0
            } else {
                total as f64 / occupied_slots as f64
            },
        }
    }

    /// Counts buckets by chain length: entry `n` is the number of buckets
    /// whose chain holds exactly `n` nodes.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = vec![0usize; 1];
        for &head in &self.buckets {
            let length = self.chain(head).count();
            if length >= hist.len() {
                hist.resize(length + 1, 0);
            }
            hist[length] += 1;
        }
        hist
    }

    /// Returns `true` if bucket `index` has a chain.
    pub(crate) fn is_bucket_occupied(&self, index: usize) -> bool {
        self.buckets[index].is_some()
    }

    /// Unlinks the head node of bucket `index` and returns its key and value.
    pub(crate) fn pop_bucket_head(&mut self, index: usize) -> Option<(Box<[u8]>, V)> {
        let handle = self.buckets[index]?;
        let node = self.arena.release(handle);
        self.buckets[index] = node.next;
        self.used -= 1;
        Some((node.key, node.value))
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u32) -> usize {
        (hash & self.mask) as usize
    }

    fn chain(&self, head: Option<NodeHandle>) -> Chain<'_, V> {
        Chain {
            arena: &self.arena,
            cursor: head,
        }
    }

    fn grow(&mut self) {
        if self.buckets.len() >= MAX_BUCKETS {
            return;
        }
        self.rehash(self.buckets.len() << 1);
    }

    fn shrink(&mut self) {
        if self.buckets.len() <= MIN_BUCKETS {
            return;
        }
        self.rehash(self.buckets.len() >> 1);
    }

    fn rehash(&mut self, buckets: usize) {
        let mask = (buckets - 1) as u32;
        let mut rehashed: Vec<Option<NodeHandle>> = vec![None; buckets];

        for &head in &self.buckets {
            let mut cursor = head;
            while let Some(handle) = cursor {
                let node = &mut self.arena[handle];
                cursor = node.next;

                let index = (node.hash & mask) as usize;
                node.next = rehashed[index];
                rehashed[index] = Some(handle);
            }
        }

        tracing::debug!(
            from = self.buckets.len(),
            to = buckets,
            elements = self.used,
            "hash table resized"
        );

        self.buckets = rehashed;
        self.mask = mask;
    }
}

/// Walks one chain, yielding each node with its handle.
struct Chain<'a, V> {
    arena: &'a EntryArena<Node<V>>,
    cursor: Option<NodeHandle>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = (NodeHandle, &'a Node<V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let node = &self.arena[handle];
        self.cursor = node.next;
        Some((handle, node))
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Option<NodeHandle>>,
    chain: Chain<'a, V>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, node)) = self.chain.next() {
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.chain.cursor = *self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// An iterator over the keys of a [`HashTable`].
///
/// This struct is created by the [`keys`] method on [`HashTable`].
///
/// [`keys`]: HashTable::keys
pub struct Keys<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}

/// An iterator over the values of a [`HashTable`].
///
/// This struct is created by the [`values`] method on [`HashTable`].
///
/// [`values`]: HashTable::values
pub struct Values<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    const INSERTED: usize = 100;
    const GROWN: usize = 128;
    const REMOVED: usize = 75;
    const SHRUNK: usize = 64;

    /// Inbox-style tokens: 13 random bytes, hex encoded.
    fn tokens(count: usize) -> Vec<Vec<u8>> {
        let mut rng = SmallRng::seed_from_u64(0x0123_4567_89ab_cdef);
        (0..count)
            .map(|_| {
                let mut raw = [0u8; 13];
                rng.fill(&mut raw);
                raw.iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<String>()
                    .into_bytes()
            })
            .collect()
    }

    fn fill(table: &mut HashTable<Vec<u8>>, toks: &[Vec<u8>]) {
        for tok in toks {
            table.set(tok, tok.clone());
            assert_eq!(table.get(tok), Some(tok), "{:?}", table.stats());
        }
    }

    #[test]
    fn bucket_count_validation() {
        assert_eq!(
            HashTable::<u8>::with_buckets(3).unwrap_err(),
            Error::InvalidCapacity { requested: 3 }
        );
        assert!(HashTable::<u8>::with_buckets(0).is_err());
        assert!(HashTable::<u8>::with_buckets(12).is_err());
        assert_eq!(HashTable::<u8>::with_buckets(8).unwrap().bucket_count(), 8);
        assert_eq!(HashTable::<u8>::with_buckets(1).unwrap().bucket_count(), 1);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn bucket_count_above_mask_width_is_rejected() {
        assert!(HashTable::<u8>::with_buckets(1 << 32).is_err());
    }

    #[test]
    fn basics() {
        let mut table = HashTable::new();
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());

        assert_eq!(table.set(b"foo", "bar"), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(b"foo"), Some(&"bar"));
        assert!(table.contains_key(b"foo"));

        assert_eq!(table.remove(b"foo"), Some("bar"));
        assert_eq!(table.len(), 0);
        assert_eq!(table.get(b"foo"), None);
        assert_eq!(table.remove(b"foo"), None);
    }

    #[test]
    fn empty_key_is_a_valid_key() {
        let mut table = HashTable::new();
        assert_eq!(table.get(b""), None);

        assert_eq!(table.set(b"", 9), None);
        table.set(b"a", 1);
        assert_eq!(table.get(b""), Some(&9));
        assert_eq!(table.len(), 2);

        assert_eq!(table.set(b"", 10), Some(9));
        assert_eq!(table.remove(b""), Some(10));
        assert_eq!(table.get(b""), None);
        assert_eq!(table.get(b"a"), Some(&1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn set_replaces_existing_value() {
        let mut table = HashTable::new();
        table.set(b"key", "foo");
        assert_eq!(table.set(b"key", "bar"), Some("foo"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.arena().len(), 1);

        let all = table.all();
        assert_eq!(all, vec![&"bar"]);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut table = HashTable::new();
        table.set(b"counter", 1u32);
        *table.get_mut(b"counter").unwrap() += 41;
        assert_eq!(table.get(b"counter"), Some(&42));
        assert!(table.get_mut(b"missing").is_none());
    }

    #[test]
    fn grows_by_doubling() {
        let mut table = HashTable::new();
        assert_eq!(table.bucket_count(), MIN_BUCKETS);

        fill(&mut table, &tokens(INSERTED));
        assert_eq!(table.bucket_count(), GROWN);
        assert_eq!(table.len(), INSERTED);
    }

    #[test]
    fn shrinks_by_halving() {
        let toks = tokens(INSERTED);
        let mut table = HashTable::new();
        fill(&mut table, &toks);
        assert_eq!(table.bucket_count(), GROWN);

        for tok in &toks[..REMOVED] {
            assert_eq!(table.remove(tok).as_ref(), Some(tok));
        }
        assert_eq!(table.bucket_count(), SHRUNK);
        assert_eq!(table.len(), INSERTED - REMOVED);

        for tok in &toks[REMOVED..] {
            assert_eq!(table.get(tok), Some(tok));
        }
    }

    #[test]
    fn shrink_stops_at_minimum() {
        let toks = tokens(INSERTED);
        let mut table = HashTable::new();
        fill(&mut table, &toks);
        for tok in &toks {
            table.remove(tok);
        }
        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), MIN_BUCKETS);
    }

    #[test]
    fn fixed_size_collisions_and_manual_resize() {
        let toks = tokens(INSERTED);
        let mut table = HashTable::new();
        table.set_resizable(false);
        fill(&mut table, &toks);
        assert_eq!(table.bucket_count(), MIN_BUCKETS);

        table.resize(2 * MIN_BUCKETS).unwrap();
        assert_eq!(table.bucket_count(), 2 * MIN_BUCKETS);
        assert_eq!(table.get(&toks[32]), Some(&toks[32]));

        table.remove(&toks[99]);
        assert_eq!(table.get(&toks[99]), None);
        assert_eq!(table.len(), INSERTED - 1);
        assert_eq!(table.bucket_count(), 2 * MIN_BUCKETS);

        assert!(table.resize(24).is_err());
        assert_eq!(table.bucket_count(), 2 * MIN_BUCKETS);
    }

    #[test]
    fn stats_on_fixed_table() {
        let mut table = HashTable::new();
        table.set_resizable(false);
        fill(&mut table, &tokens(INSERTED));

        let stats = table.stats();
        assert_eq!(stats.elements, INSERTED);
        assert_eq!(stats.buckets, MIN_BUCKETS);
        assert_eq!(stats.occupied_slots, MIN_BUCKETS);
        assert!(
            stats.mean_chain >= 12.0 && stats.mean_chain <= 13.0,
            "{:?}",
            stats
        );
        assert!(stats.longest_chain >= 13 && stats.longest_chain <= INSERTED);
    }

    #[test]
    fn stats_on_empty_table() {
        let table: HashTable<u8> = HashTable::new();
        assert_eq!(
            table.stats(),
            Stats {
                elements: 0,
                buckets: MIN_BUCKETS,
                occupied_slots: 0,
                longest_chain: 0,
                mean_chain: 0.0,
            }
        );
    }

    #[test]
    #[cfg(feature = "stats")]
    fn chain_histogram_accounts_for_every_bucket() {
        let mut table = HashTable::new();
        fill(&mut table, &tokens(INSERTED));

        let hist = table.chain_histogram();
        assert_eq!(hist.iter().sum::<usize>(), table.bucket_count());
        let nodes: usize = hist.iter().enumerate().map(|(len, n)| len * n).sum();
        assert_eq!(nodes, INSERTED);
        assert_eq!(hist.len(), table.stats().longest_chain + 1);
    }

    #[test]
    fn no_false_matches_on_shared_prefixes() {
        let mut table = HashTable::new();
        table.set(b"cache.test.0", "foo");
        assert_eq!(table.get(b"cache.test.1"), None);

        table.set(b"cache.test.1234", "foo");
        assert_eq!(table.get(b"cache.test.0000"), None);
    }

    #[test]
    fn colliding_hashes_compare_bytes() {
        let mut table = HashTable::with_hasher(|_: &[u8]| 0u32);
        table.set(b"cache.test.0", 0);
        table.set(b"cache.test.1", 1);
        table.set(b"cache.test.2", 2);
        table.set(b"999", 999);
        table.set(b"1000", 1000);

        assert_eq!(table.stats().longest_chain, 5);
        assert_eq!(table.get(b"cache.test.1"), Some(&1));
        assert_eq!(table.get(b"cache.test.3"), None);

        // Unlink from the middle of the chain.
        assert_eq!(table.remove(b"cache.test.1"), Some(1));
        assert_eq!(table.get(b"cache.test.0"), Some(&0));
        assert_eq!(table.get(b"cache.test.2"), Some(&2));
        assert_eq!(table.get(b"1000"), Some(&1000));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn all_and_all_keys() {
        let mut table = HashTable::new();
        table.set(b"1", 1);
        table.set(b"2", 1);
        table.set(b"3", 1);

        assert_eq!(table.all().len(), 3);

        let mut keys = table.all_keys();
        keys.sort();
        assert_eq!(keys, vec![&b"1"[..], &b"2"[..], &b"3"[..]]);
    }

    #[test]
    fn iteration_visits_each_entry_once() {
        let toks = tokens(INSERTED);
        let mut table = HashTable::new();
        fill(&mut table, &toks);

        let iter = table.iter();
        assert_eq!(iter.len(), INSERTED);

        let mut seen: Vec<&[u8]> = iter
            .map(|(key, value)| {
                assert_eq!(key, &value[..]);
                key
            })
            .collect();
        seen.sort();
        let mut expected: Vec<&[u8]> = toks.iter().map(|t| &t[..]).collect();
        expected.sort();
        assert_eq!(seen, expected);

        assert_eq!(table.keys().count(), INSERTED);
        assert_eq!(table.values().count(), INSERTED);
    }

    #[test]
    fn removed_nodes_are_reused_by_the_arena() {
        let toks = tokens(32);
        let mut table = HashTable::with_config(
            Config {
                block_size: 16,
                resizable: false,
                ..Config::default()
            },
            DefaultKeyHasher,
        )
        .unwrap();
        fill(&mut table, &toks);
        assert_eq!(table.arena().block_count(), 2);

        for tok in &toks {
            table.remove(tok);
        }
        assert_eq!(table.arena().free_count(), 32);

        fill(&mut table, &toks);
        assert_eq!(table.arena().block_count(), 2);
        assert_eq!(table.arena().free_count(), 0);
    }

    #[test]
    fn clear_keeps_buckets() {
        let mut table = HashTable::new();
        fill(&mut table, &tokens(INSERTED));
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), GROWN);
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.stats().occupied_slots, 0);

        table.set(b"foo", b"bar".to_vec());
        assert_eq!(table.get(b"foo"), Some(&b"bar".to_vec()));
    }

    #[test]
    fn clone_is_independent() {
        let toks = tokens(20);
        let mut original = HashTable::new();
        fill(&mut original, &toks);

        let mut cloned = original.clone();
        cloned.remove(&toks[0]);
        cloned.set(b"extra", b"value".to_vec());

        assert_eq!(original.len(), 20);
        assert_eq!(original.get(&toks[0]), Some(&toks[0]));
        assert_eq!(original.get(b"extra"), None);
        assert_eq!(cloned.len(), 20);
        assert_eq!(cloned.get(&toks[0]), None);
    }

    #[test]
    fn random_operations_match_model() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut table = HashTable::new();
        let mut model = hashbrown::HashMap::new();

        for _ in 0..5000 {
            let key = format!("subject.{}", rng.random_range(0..300u32)).into_bytes();
            match rng.random_range(0..3u8) {
                0 | 1 => {
                    let value = rng.random::<u64>();
                    assert_eq!(table.set(&key, value), model.insert(key, value));
                }
                _ => assert_eq!(table.remove(&key), model.remove(&key)),
            }
            assert_eq!(table.len(), model.len());
        }

        for (key, value) in &model {
            assert_eq!(table.get(key), Some(value));
        }
        let stats = table.stats();
        assert!(stats.buckets >= MIN_BUCKETS);
        assert!(stats.elements <= stats.buckets);
    }
}
