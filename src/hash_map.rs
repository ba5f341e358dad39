use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::Index;

use crate::config::TableConfig;
use crate::error::TryReserveError;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::hasher::DefaultKeyHasher;
use crate::hasher::KeyHasher;
use crate::slot::Inline;
use crate::slot::ValueSlot;

/// A hash map over the Robin Hood [`HashTable`].
///
/// `RobinMap<K, V, H, P>` stores key-value pairs, hashing and comparing keys
/// with the [`KeyHasher`] `H` under a per-map seed. `P` decides where values
/// live: [`Inline`] (the default) keeps them in the buckets, while
/// [`ValueCell`](crate::slot::ValueCell) gives each value its own heap cell;
/// see [`StableMap`](crate::StableMap).
///
/// # Performance Characteristics
///
/// - **Memory**: one tag byte and a `u32` hash per slot, plus the size of
///   `(K, P)`.
///
/// # Examples
///
/// ```rust
/// use robin_hash::RobinMap;
///
/// let mut scores: RobinMap<&str, u32> = RobinMap::new();
/// scores.insert("alice", 10);
/// scores.insert("bob", 20);
///
/// assert_eq!(scores.get(&"alice"), Some(&10));
/// assert_eq!(scores.remove(&"bob"), Some(20));
/// assert_eq!(scores.len(), 1);
/// ```
pub struct RobinMap<K, V, H = DefaultKeyHasher, P = Inline<V>> {
    pub(crate) table: HashTable<(K, P)>,
    pub(crate) hasher: H,
    pub(crate) seed: u32,
    _value: PhantomData<V>,
}

impl<K, V, H, P> Debug for RobinMap<K, V, H, P>
where
    K: Debug,
    V: Debug,
    P: ValueSlot<V>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H, P> Clone for RobinMap<K, V, H, P>
where
    K: Clone,
    H: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hasher: self.hasher.clone(),
            seed: self.seed,
            _value: PhantomData,
        }
    }
}

impl<K, V, H, P> Default for RobinMap<K, V, H, P>
where
    H: Default,
{
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<K, V, P> RobinMap<K, V, DefaultKeyHasher, P> {
    /// Creates an empty map with the default hasher.
    ///
    /// No memory is allocated until the first insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let map: RobinMap<u64, String> = RobinMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultKeyHasher::default())
    }

    /// Creates an empty map with the default hasher that can hold at least
    /// `capacity` entries without growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let map: RobinMap<u64, String> = RobinMap::with_capacity(100);
    /// assert!(map.threshold() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultKeyHasher::default())
    }
}

impl<K, V, H, P> RobinMap<K, V, H, P> {
    /// Creates an empty map that hashes keys with `hasher`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    /// use robin_hash::hasher::FnHasher;
    ///
    /// let hasher = FnHasher::new(|k: &u32, seed: u32| k ^ seed, |a: &u32, b: &u32| a == b);
    /// let mut map: RobinMap<u32, &str, _> = RobinMap::with_hasher(hasher);
    /// map.insert(1, "one");
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// ```
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_config(hasher, TableConfig::new())
    }

    /// Creates an empty map with `hasher` that can hold at least `capacity`
    /// entries without growing.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hasher,
            seed: TableConfig::new().seed(),
            _value: PhantomData,
        }
    }

    /// Creates an empty map with `hasher`, taking the load factor, seed and
    /// growth policy from `config`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    /// use robin_hash::TableConfig;
    /// use robin_hash::hasher::DefaultKeyHasher;
    ///
    /// let config = TableConfig::new().with_load_factor(0.5).with_seed(7);
    /// let map: RobinMap<u32, u32> =
    ///     RobinMap::with_hasher_and_config(DefaultKeyHasher::default(), config);
    /// assert_eq!(map.load_factor(), 0.5);
    /// assert_eq!(map.seed(), 7);
    /// ```
    pub fn with_hasher_and_config(hasher: H, config: TableConfig) -> Self {
        Self {
            table: HashTable::with_config(config),
            hasher,
            seed: config.seed(),
            _value: PhantomData,
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots currently allocated.
    ///
    /// This is zero or a power of two. The map grows once it holds
    /// [`threshold`] entries.
    ///
    /// [`threshold`]: RobinMap::threshold
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of entries the map can hold before it grows.
    pub fn threshold(&self) -> usize {
        self.table.threshold()
    }

    /// Returns the load factor the map grows at.
    pub fn load_factor(&self) -> f32 {
        self.table.config().load_factor()
    }

    /// Returns the seed mixed into every key hash.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Returns a reference to the map's key hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Removes all entries, keeping the allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, &str> = RobinMap::new();
    /// map.insert(1, "a");
    /// let capacity = map.capacity();
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Removes all entries and releases all memory, leaving the map as if it
    /// had just been created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, &str> = RobinMap::new();
    /// map.insert(1, "a");
    ///
    /// map.reset();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 0);
    /// ```
    pub fn reset(&mut self) {
        self.table.reset();
    }

    /// Returns an iterator over the entries in slot order.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            inner: self.table.iter(),
            _value: PhantomData,
        }
    }

    /// Returns an iterator over the entries with mutable references to the
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, P> {
        IterMut {
            inner: self.table.iter_mut(),
            _value: PhantomData,
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, P> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every entry, yielding them as owned pairs.
    ///
    /// The allocation is kept. Entries not consumed are dropped with the
    /// iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, i32> = RobinMap::new();
    /// map.insert(1, 10);
    /// map.insert(2, 20);
    ///
    /// let mut drained: Vec<(i32, i32)> = map.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, vec![(1, 10), (2, 20)]);
    /// assert!(map.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V, P> {
        Drain {
            inner: self.table.drain(),
            _value: PhantomData,
        }
    }

    /// Shrinks the allocation to the smallest capacity that holds the current
    /// entries. An empty map releases its allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, &str> = RobinMap::with_capacity(1000);
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// map.shrink_to_fit();
    /// assert_eq!(map.capacity(), 32);
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves room for at least `additional` more entries.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Fallible version of [`reserve`]. On error the map is unchanged.
    ///
    /// [`reserve`]: RobinMap::reserve
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(additional)
    }
}

impl<K, V, H, P> RobinMap<K, V, H, P>
where
    H: KeyHasher<K>,
    P: ValueSlot<V>,
{
    #[inline(always)]
    fn hash(&self, key: &K) -> u32 {
        self.hasher.hash(key, self.seed)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was absent, `None` is returned. Otherwise the value is
    /// replaced in place and the old value returned; the stored key is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, &str> = RobinMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash(&key);
        let hasher = &self.hasher;
        match self.table.entry(hash, |(k, _)| hasher.eq(k, &key)) {
            TableEntry::Occupied(mut entry) => Some(entry.get_mut().1.replace(value)),
            TableEntry::Vacant(entry) => {
                entry.insert((key, P::new(value)));
                None
            }
        }
    }

    /// Fallible version of [`insert`].
    ///
    /// If growing the table or allocating the value fails, the error is
    /// returned and the map is left exactly as it was.
    ///
    /// [`insert`]: RobinMap::insert
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, TryReserveError> {
        let hash = self.hash(&key);
        let hasher = &self.hasher;
        if let Some((_, slot)) = self.table.find_mut(hash, |(k, _)| hasher.eq(k, &key)) {
            return Ok(Some(slot.replace(value)));
        }

        // Allocate the value before the table may grow, so a failure here
        // leaves the capacity alone.
        let slot = P::try_new(value)?;
        match self.table.try_entry(hash, |(k, _)| hasher.eq(k, &key))? {
            TableEntry::Occupied(mut entry) => {
                Ok(Some(entry.get_mut().1.replace(slot.into_inner())))
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, slot));
                Ok(None)
            }
        }
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, &str> = RobinMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and the value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.hash(key);
        self.table
            .find(hash, |(k, _)| self.hasher.eq(k, key))
            .map(|(k, slot)| (k, slot.get()))
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash(key);
        let hasher = &self.hasher;
        self.table
            .find_mut(hash, |(k, _)| hasher.eq(k, key))
            .map(|(_, slot)| slot.get_mut())
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get_key_value(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// Removing an absent key does nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, &str> = RobinMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and its value if present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash(key);
        let hasher = &self.hasher;
        self.table
            .remove(hash, |(k, _)| hasher.eq(k, key))
            .map(|(k, slot)| (k, slot.into_inner()))
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<i32, i32> = (0..8).map(|n| (n, n * 10)).collect();
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert_eq!(map.len(), 4);
    /// ```
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(|(k, slot)| keep(k, slot.get_mut()));
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// If the map is at its threshold it grows first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut counts: RobinMap<&str, u32> = RobinMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, P> {
        let hash = self.hash(&key);
        let hasher = &self.hasher;
        match self.table.entry(hash, |(k, _)| hasher.eq(k, &key)) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry {
                entry,
                _value: PhantomData,
            }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry {
                entry,
                key,
                _value: PhantomData,
            }),
        }
    }

    /// Fallible version of [`entry`].
    ///
    /// [`entry`]: RobinMap::entry
    pub fn try_entry(&mut self, key: K) -> Result<Entry<'_, K, V, P>, TryReserveError> {
        let hash = self.hash(&key);
        let hasher = &self.hasher;
        Ok(match self.table.try_entry(hash, |(k, _)| hasher.eq(k, &key))? {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry {
                entry,
                _value: PhantomData,
            }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry {
                entry,
                key,
                _value: PhantomData,
            }),
        })
    }

    /// Changes the seed mixed into key hashes.
    ///
    /// A non-empty map is rebuilt at its current capacity so every entry is
    /// found under the new seed. Should the key hasher panic, the map keeps
    /// its old seed and all of its entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::RobinMap;
    ///
    /// let mut map: RobinMap<u32, u32> = (0..100).map(|n| (n, n)).collect();
    /// map.set_seed(0x1234_5678);
    /// assert_eq!(map.seed(), 0x1234_5678);
    /// assert!((0..100).all(|n| map.get(&n) == Some(&n)));
    /// ```
    pub fn set_seed(&mut self, seed: u32) {
        let hasher = &self.hasher;
        self.table.rehash(|(k, _)| hasher.hash(k, seed));
        self.seed = seed;
    }

    /// Fallible version of [`set_seed`]. On error neither the seed nor the
    /// entries change.
    ///
    /// [`set_seed`]: RobinMap::set_seed
    pub fn try_set_seed(&mut self, seed: u32) -> Result<(), TryReserveError> {
        let hasher = &self.hasher;
        self.table.try_rehash(|(k, _)| hasher.hash(k, seed))?;
        self.seed = seed;
        Ok(())
    }

    /// Returns a histogram of probe sequence lengths across the map.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        self.table.probe_histogram()
    }

    /// Returns utilization statistics for the map's table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }
}

impl<K, V, H, P> PartialEq for RobinMap<K, V, H, P>
where
    H: KeyHasher<K>,
    V: PartialEq,
    P: ValueSlot<V>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| v == ov))
    }
}

impl<K, V, H, P> Eq for RobinMap<K, V, H, P>
where
    H: KeyHasher<K>,
    V: Eq,
    P: ValueSlot<V>,
{
}

impl<K, V, H, P> Index<&K> for RobinMap<K, V, H, P>
where
    H: KeyHasher<K>,
    P: ValueSlot<V>,
{
    type Output = V;

    /// Returns the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in RobinMap"),
        }
    }
}

impl<K, V, H, P> Extend<(K, V)> for RobinMap<K, V, H, P>
where
    H: KeyHasher<K>,
    P: ValueSlot<V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // Duplicate keys may make the hint an overestimate; only reserve
        // the whole hint for an empty map.
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(reserve);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, H, P> FromIterator<(K, V)> for RobinMap<K, V, H, P>
where
    H: KeyHasher<K> + Default,
    P: ValueSlot<V>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(H::default());
        map.extend(iter);
        map
    }
}

impl<K, V, H, P, const N: usize> From<[(K, V); N]> for RobinMap<K, V, H, P>
where
    H: KeyHasher<K> + Default,
    P: ValueSlot<V>,
{
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

/// A view into a single entry in a map, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`RobinMap`].
///
/// [`entry`]: RobinMap::entry
pub enum Entry<'a, K, V, P = Inline<V>> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, P>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, P>),
}

impl<'a, K, V, P> Entry<'a, K, V, P>
where
    P: ValueSlot<V>,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like [`or_insert_with`], but the closure receives the key.
    ///
    /// [`or_insert_with`]: Entry::or_insert_with
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, P> Entry<'a, K, V, P>
where
    V: Default,
    P: ValueSlot<V>,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, P = Inline<V>> {
    entry: crate::hash_table::VacantEntry<'a, (K, P)>,
    key: K,
    _value: PhantomData<V>,
}

impl<'a, K, V, P> VacantEntry<'a, K, V, P>
where
    P: ValueSlot<V>,
{
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        self.entry.insert((self.key, P::new(value))).1.get_mut()
    }

    /// Fallible version of [`insert`]: fails only if the value's storage
    /// cannot be allocated, leaving the map unchanged.
    ///
    /// [`insert`]: VacantEntry::insert
    pub fn try_insert(self, value: V) -> Result<&'a mut V, TryReserveError> {
        let slot = P::try_new(value)?;
        Ok(self.entry.insert((self.key, slot)).1.get_mut())
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, P = Inline<V>> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, P)>,
    _value: PhantomData<V>,
}

impl<'a, K, V, P> OccupiedEntry<'a, K, V, P>
where
    P: ValueSlot<V>,
{
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.entry.get().1.get()
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.entry.get_mut().1.get_mut()
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        self.entry.into_mut().1.get_mut()
    }

    /// Replaces the value in place and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        self.entry.get_mut().1.replace(value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1.into_inner()
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        let (k, slot) = self.entry.remove();
        (k, slot.into_inner())
    }
}

/// An iterator over the entries of a [`RobinMap`].
pub struct Iter<'a, K, V, P = Inline<V>> {
    inner: crate::hash_table::Iter<'a, (K, P)>,
    _value: PhantomData<&'a V>,
}

impl<K, V, P> Clone for Iter<'_, K, V, P> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
            _value: PhantomData,
        }
    }
}

impl<'a, K, V, P> Iterator for Iter<'a, K, V, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, slot)| (k, slot.get()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> ExactSizeIterator for Iter<'a, K, V, P> {}
impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> FusedIterator for Iter<'a, K, V, P> {}

/// A mutable iterator over the entries of a [`RobinMap`].
pub struct IterMut<'a, K, V, P = Inline<V>> {
    inner: crate::hash_table::IterMut<'a, (K, P)>,
    _value: PhantomData<&'a mut V>,
}

impl<'a, K, V, P> Iterator for IterMut<'a, K, V, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, slot)| (&*k, slot.get_mut()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> ExactSizeIterator for IterMut<'a, K, V, P> {}
impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> FusedIterator for IterMut<'a, K, V, P> {}

/// An iterator over the keys of a [`RobinMap`].
pub struct Keys<'a, K, V, P = Inline<V>> {
    inner: Iter<'a, K, V, P>,
}

impl<'a, K, V, P> Iterator for Keys<'a, K, V, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> ExactSizeIterator for Keys<'a, K, V, P> {}

/// An iterator over the values of a [`RobinMap`].
pub struct Values<'a, K, V, P = Inline<V>> {
    inner: Iter<'a, K, V, P>,
}

impl<'a, K, V, P> Iterator for Values<'a, K, V, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> ExactSizeIterator for Values<'a, K, V, P> {}

/// A mutable iterator over the values of a [`RobinMap`].
pub struct ValuesMut<'a, K, V, P = Inline<V>> {
    inner: IterMut<'a, K, V, P>,
}

impl<'a, K, V, P> Iterator for ValuesMut<'a, K, V, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V: 'a, P: ValueSlot<V> + 'a> ExactSizeIterator for ValuesMut<'a, K, V, P> {}

/// A draining iterator over the entries of a [`RobinMap`].
pub struct Drain<'a, K, V, P = Inline<V>> {
    inner: crate::hash_table::Drain<'a, (K, P)>,
    _value: PhantomData<V>,
}

impl<K, V, P> Iterator for Drain<'_, K, V, P>
where
    P: ValueSlot<V>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, slot)| (k, slot.into_inner()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ValueSlot<V>> ExactSizeIterator for Drain<'_, K, V, P> {}

/// An owning iterator over the entries of a [`RobinMap`].
pub struct IntoIter<K, V, P = Inline<V>> {
    inner: crate::hash_table::IntoIter<(K, P)>,
    _value: PhantomData<V>,
}

impl<K, V, P> Iterator for IntoIter<K, V, P>
where
    P: ValueSlot<V>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, slot)| (k, slot.into_inner()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: ValueSlot<V>> ExactSizeIterator for IntoIter<K, V, P> {}
impl<K, V, P: ValueSlot<V>> FusedIterator for IntoIter<K, V, P> {}

impl<K, V, H, P> IntoIterator for RobinMap<K, V, H, P>
where
    P: ValueSlot<V>,
{
    type IntoIter = IntoIter<K, V, P>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
            _value: PhantomData,
        }
    }
}

impl<'a, K, V, H, P> IntoIterator for &'a RobinMap<K, V, H, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type IntoIter = Iter<'a, K, V, P>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, H, P> IntoIterator for &'a mut RobinMap<K, V, H, P>
where
    P: ValueSlot<V> + 'a,
    V: 'a,
{
    type IntoIter = IterMut<'a, K, V, P>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
