//! Maps whose values never move.
//!
//! A [`StableMap`] keeps every value in its own heap cell. Growing the table,
//! Robin Hood displacement and backward shifts move only the key, the cached
//! hash and the cell pointer, so the address of a value stays fixed from the
//! moment its key is inserted until that key is removed or the map is
//! cleared, reset or dropped. Overwriting an existing key replaces the value
//! inside its existing cell.
//!
//! This makes the map usable as an index over long-lived records: hand out
//! [`NonNull<V>`] from [`get_ptr`] and keep using it while other keys come and
//! go.
//!
//! [`get_ptr`]: RobinMap::get_ptr

use core::ptr::NonNull;

use crate::hash_map::RobinMap;
use crate::hash_table::Entry as TableEntry;
use crate::hasher::DefaultKeyHasher;
use crate::hasher::KeyHasher;
use crate::slot::ValueCell;
use crate::slot::ValueSlot;

/// A [`RobinMap`] that stores each value behind its own allocation, keeping
/// value addresses stable.
///
/// # Examples
///
/// ```rust
/// use robin_hash::StableMap;
///
/// let mut map: StableMap<u32, String> = StableMap::new();
/// map.insert(1, "first".to_string());
/// let first = map.get_ptr(&1).unwrap();
///
/// // Force several resizes.
/// for n in 2..1000 {
///     map.insert(n, n.to_string());
/// }
///
/// assert_eq!(map.get_ptr(&1), Some(first));
/// // SAFETY: Key 1 is still present and nothing else borrows its value.
/// assert_eq!(unsafe { first.as_ref() }, "first");
/// ```
pub type StableMap<K, V, H = DefaultKeyHasher> = RobinMap<K, V, H, ValueCell<V>>;

impl<K, V, H> RobinMap<K, V, H, ValueCell<V>>
where
    H: KeyHasher<K>,
{
    /// Returns the address of the value for `key`.
    ///
    /// The pointer stays valid, and keeps pointing at this key's value, until
    /// the key is removed or the map is cleared, reset or dropped. Inserting
    /// or removing other keys does not affect it, and neither does
    /// overwriting this key's value.
    ///
    /// Dereferencing the pointer is `unsafe`: the caller must not create a
    /// reference through it that aliases a reference obtained from the map.
    pub fn get_ptr(&self, key: &K) -> Option<NonNull<V>> {
        let hash = self.hasher.hash(key, self.seed);
        self.table
            .find(hash, |(k, _)| self.hasher.eq(k, key))
            .map(|(_, cell)| cell.as_ptr())
    }

    /// Inserts or overwrites `key` and returns the stable address of its
    /// value.
    ///
    /// A new cell is allocated only when the key was absent; an overwrite
    /// reuses the existing cell, so the returned pointer equals any pointer
    /// previously handed out for this key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::StableMap;
    ///
    /// let mut map: StableMap<&str, u64> = StableMap::new();
    /// let ptr = map.insert_and_get_ptr("hits", 1);
    /// assert_eq!(map.insert_and_get_ptr("hits", 2), ptr);
    /// assert_eq!(map.get(&"hits"), Some(&2));
    /// ```
    pub fn insert_and_get_ptr(&mut self, key: K, value: V) -> NonNull<V> {
        let hash = self.hasher.hash(&key, self.seed);
        let hasher = &self.hasher;
        match self.table.entry(hash, |(k, _)| hasher.eq(k, &key)) {
            TableEntry::Occupied(mut entry) => {
                let cell = &mut entry.get_mut().1;
                drop(cell.replace(value));
                cell.as_ptr()
            }
            TableEntry::Vacant(entry) => entry.insert((key, ValueCell::new(value))).1.as_ptr(),
        }
    }
}
