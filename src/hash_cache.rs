use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use rand::Rng;
use rand::rngs::SmallRng;

use crate::entry_arena::EntryArena;
use crate::error::Error;
use crate::hash::DefaultKeyHasher;
use crate::hash::KeyHasher;
use crate::hash_table::HashTable;
use crate::hash_table::Iter;
use crate::hash_table::Keys;
use crate::hash_table::Node;
use crate::hash_table::Stats;
use crate::hash_table::Values;

/// A byte-keyed cache supporting random eviction.
///
/// `HashCache` owns a [`HashTable`] and a random source `R`. Every table
/// operation is available on the cache; [`evict_random`] is the addition.
///
/// [`evict_random`]: HashCache::evict_random
///
/// # Examples
///
/// ```rust
/// # use chain_hash::HashCache;
/// # use chain_hash::HashTable;
/// # use rand::SeedableRng;
/// # use rand::rngs::SmallRng;
/// #
/// let mut cache = HashCache::from_parts(HashTable::new(), SmallRng::seed_from_u64(7));
/// cache.set(b"foo", 1);
/// cache.set(b"bar", 2);
/// cache.set(b"baz", 3);
///
/// let (key, _) = cache.evict_random().unwrap();
/// assert!(!cache.contains_key(&key));
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Clone)]
pub struct HashCache<V, H = DefaultKeyHasher, R = SmallRng> {
    table: HashTable<V, H>,
    rng: R,
}

impl<V, H, R> Debug for HashCache<V, H, R>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.table.fmt(f)
    }
}

#[cfg(feature = "std")]
impl<V> HashCache<V> {
    /// Creates an empty cache with the default bucket count and hash
    /// function. The random source is seeded once from the operating system.
    pub fn new() -> Self {
        Self::from_parts(HashTable::new(), os_seeded_rng())
    }

    /// Creates an empty cache with `buckets` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `buckets` is zero or not a power
    /// of two.
    pub fn with_buckets(buckets: usize) -> Result<Self, Error> {
        Ok(Self::from_parts(
            HashTable::with_buckets(buckets)?,
            os_seeded_rng(),
        ))
    }
}

#[cfg(feature = "std")]
impl<V> Default for HashCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
fn os_seeded_rng() -> SmallRng {
    use rand::SeedableRng;

    SmallRng::from_os_rng()
}

impl<V, R> HashCache<V, DefaultKeyHasher, R>
where
    R: Rng,
{
    /// Creates an empty cache with the default table that draws eviction
    /// points from `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self::from_parts(HashTable::new(), rng)
    }
}

impl<V, H, R> HashCache<V, H, R> {
    /// Builds a cache from an existing table and random source.
    pub fn from_parts(table: HashTable<V, H>, rng: R) -> Self {
        Self { table, rng }
    }

    /// Splits the cache into its table and random source.
    pub fn into_parts(self) -> (HashTable<V, H>, R) {
        (self.table, self.rng)
    }

    /// The underlying table.
    pub fn as_table(&self) -> &HashTable<V, H> {
        &self.table
    }

    /// The underlying table, mutably.
    pub fn as_table_mut(&mut self) -> &mut HashTable<V, H> {
        &mut self.table
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// The hash function in use.
    pub fn hasher(&self) -> &H {
        self.table.hasher()
    }

    /// The arena holding the cache's nodes.
    pub fn arena(&self) -> &EntryArena<Node<V>> {
        self.table.arena()
    }

    /// Returns `true` if the underlying table grows and shrinks on its own.
    pub fn is_resizable(&self) -> bool {
        self.table.is_resizable()
    }

    /// Rebuilds the underlying table with `buckets` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `buckets` is zero or not a power
    /// of two.
    pub fn resize(&mut self, buckets: usize) -> Result<(), Error> {
        self.table.resize(buckets)
    }

    /// Turns automatic growing and shrinking on or off.
    pub fn set_resizable(&mut self, resizable: bool) {
        self.table.set_resizable(resizable);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over `(key, value)` pairs.
    pub fn iter(&self) -> Iter<'_, V> {
        self.table.iter()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, V> {
        self.table.keys()
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, V> {
        self.table.values()
    }

    /// Collects every key.
    pub fn all_keys(&self) -> Vec<&[u8]> {
        self.table.all_keys()
    }

    /// Collects every value.
    pub fn all(&self) -> Vec<&V> {
        self.table.all()
    }

    /// Reports element, bucket and chain statistics.
    pub fn stats(&self) -> Stats {
        self.table.stats()
    }

    /// Counts buckets by chain length, see [`HashTable::chain_histogram`].
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> Vec<usize> {
        self.table.chain_histogram()
    }
}

impl<V, H, R> HashCache<V, H, R>
where
    H: KeyHasher,
{
    /// Associates `value` with `key`, returning the value it replaces.
    pub fn set(&mut self, key: &[u8], value: V) -> Option<V> {
        self.table.set(key, value)
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.table.get(key)
    }

    /// Returns the value stored for `key` mutably.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Returns `true` if the cache holds `key`.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.table.contains_key(key)
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        self.table.remove(key)
    }
}

impl<V, H, R> HashCache<V, H, R>
where
    R: Rng,
{
    /// Evicts one entry and returns it, or does nothing on an empty cache.
    ///
    /// A start bucket is drawn uniformly at random. The first non-empty bucket
    /// at or after it loses its chain head; if there is none, the first
    /// non-empty bucket at or before it does. Eviction never resizes the
    /// table.
    ///
    /// # Panics
    ///
    /// Panics if the cache reports live entries but every bucket is empty.
    pub fn evict_random(&mut self) -> Option<(Box<[u8]>, V)> {
        if self.table.is_empty() {
            return None;
        }

        let buckets = self.table.bucket_count();
        let start = self.rng.random_range(0..buckets);

        let index = (start..buckets)
            .find(|&i| self.table.is_bucket_occupied(i))
            .or_else(|| (0..=start).rev().find(|&i| self.table.is_bucket_occupied(i)));

        let Some(index) = index else {
            panic!(
                "hash cache reports {} entries but every bucket is empty",
                self.table.len()
            );
        };

        tracing::trace!(start, bucket = index, "evicting chain head");
        self.table.pop_bucket_head(index)
    }
}
