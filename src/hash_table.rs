//! The raw Robin Hood table.
//!
//! [`HashTable<T>`] stores values of type `T` and knows nothing about keys:
//! every operation takes the entry's 32-bit hash and an equality predicate.
//! The keyed maps in this crate are thin layers on top of it.
//!
//! Layout: one allocation holding, for `capacity` slots, a tag byte per slot
//! (empty or occupied), the cached hash of each slot, and the slot values.
//! Capacity is a power of two; the home slot of a hash comes from
//! [`home_slot`] and collisions probe forward with wraparound.
//!
//! Invariants maintained by every operation:
//! - `populated <= threshold < capacity` whenever `capacity > 0`, so there is
//!   always at least one empty slot and every probe terminates.
//! - Along any run of occupied slots, probe lengths never increase by more
//!   than one from one slot to the next (Robin Hood ordering). A lookup can
//!   therefore stop as soon as it is further from home than the entry it is
//!   looking at.
//! - There are no tombstones: removal shifts the rest of the run back.

use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::config::TableConfig;
use crate::error::Fallibility;
use crate::error::TryReserveError;
use crate::index::bits_for;
use crate::index::capacity_for;
use crate::index::home_slot;
use crate::index::probe_len;
use crate::index::threshold;

const EMPTY: u8 = 0;
const OCCUPIED: u8 = 1;

#[inline(always)]
fn infallible<R>(result: Result<R, TryReserveError>) -> R {
    match result {
        Ok(value) => value,
        // Infallible paths panic or abort before producing an error.
        Err(_) => unreachable!(),
    }
}

#[derive(Debug)]
struct DataLayout {
    layout: Layout,
    tags_offset: usize,
    hashes_offset: usize,
    buckets_offset: usize,
}

impl DataLayout {
    const fn empty() -> Self {
        DataLayout {
            layout: Layout::new::<()>(),
            tags_offset: 0,
            hashes_offset: 0,
            buckets_offset: 0,
        }
    }

    fn new<T>(capacity: usize) -> Option<Self> {
        let tags_layout = Layout::array::<u8>(capacity).ok()?;
        let hashes_layout = Layout::array::<u32>(capacity).ok()?;
        let buckets_layout = Layout::array::<MaybeUninit<T>>(capacity).ok()?;

        let (layout, tags_offset) = Layout::new::<()>().extend(tags_layout).ok()?;
        let (layout, hashes_offset) = layout.extend(hashes_layout).ok()?;
        let (layout, buckets_offset) = layout.extend(buckets_layout).ok()?;

        Some(DataLayout {
            layout,
            tags_offset,
            hashes_offset,
            buckets_offset,
        })
    }

    /// Allocates storage for `capacity` slots with every tag set to empty.
    fn allocate(&self, capacity: usize, fallibility: Fallibility) -> Result<NonNull<u8>, TryReserveError> {
        if self.layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: We have validated that the layout size is non-zero.
        let raw_alloc = unsafe { alloc::alloc::alloc(self.layout) };
        let Some(alloc) = NonNull::new(raw_alloc) else {
            return Err(fallibility.alloc_err(self.layout));
        };

        // SAFETY: The tag array lies within the fresh allocation and holds
        // exactly `capacity` bytes.
        unsafe {
            core::ptr::write_bytes(alloc.as_ptr().add(self.tags_offset), EMPTY, capacity);
        }

        Ok(alloc)
    }

    /// # Safety
    ///
    /// `alloc` must have been returned by [`DataLayout::allocate`] on this
    /// layout and not freed since.
    unsafe fn deallocate(&self, alloc: NonNull<u8>) {
        if self.layout.size() != 0 {
            // SAFETY: Caller guarantees `alloc` came from this layout.
            unsafe { alloc::alloc::dealloc(alloc.as_ptr(), self.layout) }
        }
    }
}

/// Where a probe for a hash ended.
enum Probe {
    /// The matching entry is at this slot.
    Found(usize),
    /// No match; a new entry belongs at `index`, `dist` slots from its home.
    Vacant { index: usize, dist: usize },
}

/// Debug statistics for hash table analysis.
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of slots allocated
    pub capacity: usize,
    /// Element count at which the table grows
    pub threshold: usize,
    /// Fraction of slots in use (populated / capacity)
    pub load_factor: f64,
    /// Longest probe sequence of any element
    pub max_probe_len: usize,
    /// Average probe sequence length
    pub mean_probe_len: f64,
    /// Total memory in bytes used by the table
    pub total_bytes: usize,
    /// Bytes held by empty slots
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} slots ({:.2}% load, grows at {})",
            self.populated,
            self.capacity,
            self.load_factor * 100.0,
            self.threshold
        );
        println!(
            "Probe length: max {}, mean {:.3}",
            self.max_probe_len, self.mean_probe_len
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Number of entries at each probe sequence length.
///
/// `counts()[n]` is the number of entries sitting `n` slots past their home
/// slot. Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    counts: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Entry counts indexed by probe sequence length.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Longest probe sequence length present, if any entry was counted.
    pub fn max_probe_len(&self) -> Option<usize> {
        self.counts.iter().rposition(|&c| c != 0)
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (len, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", len, make_bar(count), count);
        }
    }
}

/// An open-addressing hash table using Robin Hood insertion and
/// backward-shift deletion.
///
/// `HashTable<T>` stores values of type `T`. Like a raw table, it requires
/// you to provide both the hash value and an equality predicate for each
/// operation; [`RobinMap`](crate::RobinMap) does that for keyed use.
///
/// ## Performance Characteristics
///
/// - **Memory**: one tag byte and one `u32` hash per slot, plus `T`.
/// - **Lookups**: expected O(1); misses stop early thanks to Robin Hood
///   ordering.
///
/// ## Example
///
/// ```rust
/// use robin_hash::hash_table::Entry;
/// use robin_hash::hash_table::HashTable;
///
/// #[derive(Debug, PartialEq)]
/// struct Person {
///     id: u32,
///     name: String,
/// }
///
/// let mut table = HashTable::new();
/// let hash = 123u32.wrapping_mul(0x85EB_CA6B);
///
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(hash, |p| p.id == 123).unwrap().name, "Alice");
/// ```
pub struct HashTable<T> {
    layout: DataLayout,
    alloc: NonNull<u8>,

    capacity: usize,
    bits: u32,
    populated: usize,
    threshold: usize,
    config: TableConfig,

    _phantom: PhantomData<T>,
}

// SAFETY: The table uniquely owns its allocation and the values in it.
unsafe impl<T: Send> Send for HashTable<T> {}
// SAFETY: Shared access only hands out shared references to values.
unsafe impl<T: Sync> Sync for HashTable<T> {}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::ToString;

        let slots = (0..self.capacity)
            .map(|index| {
                // SAFETY: `index < capacity`.
                unsafe {
                    if self.is_occupied(index) {
                        let hash = self.stored_hash(index);
                        format!(
                            "{:02}:{:08x}",
                            probe_len(index, self.capacity, hash, self.bits),
                            hash
                        )
                    } else {
                        "..".to_string()
                    }
                }
            })
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("slots", &slots)
            .field("populated", &self.populated)
            .field("capacity", &self.capacity)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl<T> Clone for HashTable<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut new_table = Self::with_config(self.config);
        if self.capacity == 0 {
            return new_table;
        }

        let Some(layout) = DataLayout::new::<T>(self.capacity) else {
            unreachable!("existing layout is valid")
        };
        new_table.alloc = infallible(layout.allocate(self.capacity, Fallibility::Infallible));
        new_table.layout = layout;
        new_table.capacity = self.capacity;
        new_table.bits = self.bits;
        new_table.threshold = self.threshold;

        // SAFETY: Both tables have the same capacity and every index is in
        // bounds. Slots are copied to the same positions, so the probe
        // layout stays valid.
        unsafe {
            for index in 0..self.capacity {
                if self.is_occupied(index) {
                    let value = (*self.bucket_ptr(index)).clone();
                    new_table.hash_ptr(index).write(self.stored_hash(index));
                    new_table.bucket_ptr(index).write(value);
                    new_table.set_tag(index, OCCUPIED);
                    new_table.populated += 1;
                }
            }
        }

        debug_assert_eq!(new_table.populated, self.populated);
        new_table
    }
}

impl<T> Drop for HashTable<T> {
    fn drop(&mut self) {
        self.drop_entries();

        // SAFETY: `alloc` came from `layout`.
        unsafe { self.layout.deallocate(self.alloc) }
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with the default configuration.
    ///
    /// No memory is allocated until the first insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let table: HashTable<u64> = HashTable::new();
    /// assert_eq!(table.capacity(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_config(TableConfig::new())
    }

    /// Creates an empty, unallocated table with the given configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self {
            layout: DataLayout::empty(),
            alloc: NonNull::dangling(),
            capacity: 0,
            bits: 0,
            populated: 0,
            threshold: 0,
            config,
            _phantom: PhantomData,
        }
    }

    /// Creates a table that can hold at least `capacity` elements without
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.threshold() >= 100);
    /// assert!(table.capacity().is_power_of_two());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_config(capacity, TableConfig::new())
    }

    /// Creates a table with the given configuration that can hold at least
    /// `capacity` elements without growing.
    pub fn with_capacity_and_config(capacity: usize, config: TableConfig) -> Self {
        infallible(Self::allocate_with_capacity(
            capacity,
            config,
            Fallibility::Infallible,
        ))
    }

    /// Fallible version of [`with_capacity`].
    ///
    /// [`with_capacity`]: HashTable::with_capacity
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_and_config(capacity, TableConfig::new())
    }

    /// Fallible version of [`with_capacity_and_config`].
    ///
    /// [`with_capacity_and_config`]: HashTable::with_capacity_and_config
    pub fn try_with_capacity_and_config(
        capacity: usize,
        config: TableConfig,
    ) -> Result<Self, TryReserveError> {
        Self::allocate_with_capacity(capacity, config, Fallibility::Fallible)
    }

    fn allocate_with_capacity(
        items: usize,
        config: TableConfig,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        let mut table = Self::with_config(config);
        if items > 0 {
            let capacity = capacity_for(items, config.load_factor())
                .ok_or_else(|| fallibility.capacity_overflow())?;
            table.relocate(capacity, fallibility, None)?;
        }
        Ok(table)
    }

    #[inline(always)]
    unsafe fn tag_ptr(&self, index: usize) -> *mut u8 {
        debug_assert!(index < self.capacity);
        // SAFETY: Caller ensures `index < capacity`, so the offset stays
        // inside the tag array.
        unsafe { self.alloc.as_ptr().add(self.layout.tags_offset + index) }
    }

    #[inline(always)]
    unsafe fn hash_ptr(&self, index: usize) -> *mut u32 {
        debug_assert!(index < self.capacity);
        // SAFETY: Caller ensures `index < capacity`, so the offset stays
        // inside the hash array.
        unsafe {
            self.alloc
                .as_ptr()
                .add(self.layout.hashes_offset)
                .cast::<u32>()
                .add(index)
        }
    }

    #[inline(always)]
    unsafe fn bucket_ptr(&self, index: usize) -> *mut T {
        debug_assert!(index < self.capacity);
        // SAFETY: Caller ensures `index < capacity`, so the offset stays
        // inside the bucket array.
        unsafe {
            self.alloc
                .as_ptr()
                .add(self.layout.buckets_offset)
                .cast::<T>()
                .add(index)
        }
    }

    #[inline(always)]
    unsafe fn is_occupied(&self, index: usize) -> bool {
        // SAFETY: Caller ensures `index < capacity`.
        unsafe { *self.tag_ptr(index) == OCCUPIED }
    }

    #[inline(always)]
    unsafe fn set_tag(&mut self, index: usize, tag: u8) {
        // SAFETY: Caller ensures `index < capacity`.
        unsafe { *self.tag_ptr(index) = tag }
    }

    #[inline(always)]
    unsafe fn stored_hash(&self, index: usize) -> u32 {
        // SAFETY: Caller ensures `index < capacity` and that the slot is
        // occupied, so its hash is initialized.
        unsafe { *self.hash_ptr(index) }
    }

    #[inline(always)]
    unsafe fn probe_len_at(&self, index: usize) -> usize {
        // SAFETY: Caller ensures the slot at `index` is occupied.
        let hash = unsafe { self.stored_hash(index) };
        probe_len(index, self.capacity, hash, self.bits)
    }

    /// Walks the probe sequence for `hash`.
    ///
    /// # Safety
    ///
    /// The table must be allocated (`capacity > 0`).
    #[inline]
    unsafe fn probe(&self, hash: u32, eq: impl Fn(&T) -> bool) -> Probe {
        debug_assert!(self.capacity > self.populated);

        let mask = self.capacity - 1;
        let mut index = home_slot(hash, self.bits);
        let mut dist = 0;

        // SAFETY: `index` is always masked into `0..capacity`. At least one
        // slot is empty, so the loop terminates.
        unsafe {
            loop {
                if !self.is_occupied(index) {
                    return Probe::Vacant { index, dist };
                }

                let stored = self.stored_hash(index);
                if dist > probe_len(index, self.capacity, stored, self.bits) {
                    // Anything for this hash would have displaced this entry.
                    return Probe::Vacant { index, dist };
                }

                if stored == hash && eq(&*self.bucket_ptr(index)) {
                    return Probe::Found(index);
                }

                index = (index + 1) & mask;
                dist += 1;
            }
        }
    }

    /// Robin Hood insertion of an entry known not to be in the table,
    /// starting at `index`, `dist` slots past the entry's home.
    ///
    /// When `index`/`dist` come from [`Probe::Vacant`] the new entry lands at
    /// `index`; every entry it displaces moves further along.
    ///
    /// # Safety
    ///
    /// The table must be allocated with `populated < capacity`, and
    /// `index`/`dist` must describe a position on the probe sequence of
    /// `hash` at or before its Robin Hood slot.
    unsafe fn insert_at(&mut self, mut index: usize, mut dist: usize, mut hash: u32, mut value: T) {
        let mask = self.capacity - 1;

        // SAFETY: `index` is always masked into `0..capacity`; an empty slot
        // exists, so the loop terminates.
        unsafe {
            loop {
                if !self.is_occupied(index) {
                    self.hash_ptr(index).write(hash);
                    self.bucket_ptr(index).write(value);
                    self.set_tag(index, OCCUPIED);
                    self.populated += 1;
                    return;
                }

                let existing = self.probe_len_at(index);
                if dist > existing {
                    hash = core::mem::replace(&mut *self.hash_ptr(index), hash);
                    value = core::mem::replace(&mut *self.bucket_ptr(index), value);
                    dist = existing;
                }

                index = (index + 1) & mask;
                dist += 1;
            }
        }
    }

    /// Removes the entry at `index` and closes the gap by shifting the rest
    /// of its run back one slot.
    ///
    /// # Safety
    ///
    /// `index` must be an occupied slot.
    unsafe fn take(&mut self, index: usize) -> T {
        let mask = self.capacity - 1;

        // SAFETY: Caller ensures `index` is occupied. Every other index is
        // masked into bounds and only read when its tag says it is occupied.
        unsafe {
            let value = self.bucket_ptr(index).read();
            self.populated -= 1;

            let mut gap = index;
            loop {
                let next = (gap + 1) & mask;
                if !self.is_occupied(next) || self.probe_len_at(next) == 0 {
                    self.set_tag(gap, EMPTY);
                    return value;
                }

                self.hash_ptr(gap).write(self.stored_hash(next));
                core::ptr::copy_nonoverlapping(self.bucket_ptr(next), self.bucket_ptr(gap), 1);
                gap = next;
            }
        }
    }

    /// Drops every entry, leaving the tags empty.
    fn drop_entries(&mut self) {
        if self.populated == 0 {
            return;
        }

        // SAFETY: Every index is in bounds; values are only dropped from
        // occupied slots, and the slot is marked empty first so a panicking
        // destructor cannot cause a double drop.
        unsafe {
            for index in 0..self.capacity {
                if self.is_occupied(index) {
                    self.set_tag(index, EMPTY);
                    self.populated -= 1;
                    core::ptr::drop_in_place(self.bucket_ptr(index));
                }
            }
        }
    }

    /// Moves every entry into a fresh allocation of `capacity` slots.
    ///
    /// Entries keep their stored hash unless `new_hashes` is given, in which
    /// case the `n`th occupied slot (in slot order) takes `new_hashes[n]`.
    /// No caller code runs while entries are in flight. On error the table
    /// is left untouched.
    fn relocate(
        &mut self,
        capacity: usize,
        fallibility: Fallibility,
        new_hashes: Option<&[u32]>,
    ) -> Result<(), TryReserveError> {
        debug_assert!(new_hashes.is_none_or(|hashes| hashes.len() == self.populated));
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(threshold(capacity, self.config.load_factor()) >= self.populated);

        let new_layout =
            DataLayout::new::<T>(capacity).ok_or_else(|| fallibility.capacity_overflow())?;
        let new_alloc = new_layout.allocate(capacity, fallibility)?;

        let old_layout = core::mem::replace(&mut self.layout, new_layout);
        let old_alloc = core::mem::replace(&mut self.alloc, new_alloc);
        let old_capacity = core::mem::replace(&mut self.capacity, capacity);
        let old_populated = core::mem::replace(&mut self.populated, 0);
        self.bits = bits_for(capacity);
        self.threshold = threshold(capacity, self.config.load_factor());

        // SAFETY: Old slots are read through the old layout and only when
        // their tag is occupied. Values are moved bitwise into the new
        // allocation; the old one is then freed without running destructors.
        unsafe {
            let old_tags = old_alloc.as_ptr().add(old_layout.tags_offset);
            let old_hashes = old_alloc.as_ptr().add(old_layout.hashes_offset).cast::<u32>();
            let old_buckets = old_alloc.as_ptr().add(old_layout.buckets_offset).cast::<T>();

            let mut moved = 0;
            for old_index in 0..old_capacity {
                if moved == old_populated {
                    break;
                }
                if *old_tags.add(old_index) != OCCUPIED {
                    continue;
                }

                let value = old_buckets.add(old_index).read();
                let hash = match new_hashes {
                    Some(hashes) => hashes[moved],
                    None => *old_hashes.add(old_index),
                };
                self.insert_at(home_slot(hash, self.bits), 0, hash, value);
                moved += 1;
            }

            old_layout.deallocate(old_alloc);
        }

        Ok(())
    }

    #[inline]
    fn maybe_grow(&mut self, fallibility: Fallibility) -> Result<(), TryReserveError> {
        if self.populated >= self.threshold {
            self.grow(fallibility)
        } else {
            Ok(())
        }
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self, fallibility: Fallibility) -> Result<(), TryReserveError> {
        let grown = self
            .config
            .growth()
            .next_capacity(self.capacity)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        let needed = self
            .populated
            .checked_add(1)
            .and_then(|items| capacity_for(items, self.config.load_factor()))
            .ok_or_else(|| fallibility.capacity_overflow())?;

        self.relocate(grown.max(needed), fallibility, None)
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Values are yielded in slot order, which is unrelated to insertion
    /// order and changes whenever the table grows or an entry is removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.entry(1, |&v: &u32| v == 10).or_insert(10);
    /// table.entry(2, |&v: &u32| v == 20).or_insert(20);
    ///
    /// let sum: u32 = table.iter().sum();
    /// assert_eq!(sum, 30);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            table: self,
            index: 0,
            remaining: self.populated,
        }
    }

    /// Returns an iterator over mutable references to all values.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            remaining: self.populated,
            table: self,
            index: 0,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator that removes and yields all values from the table.
    ///
    /// After the iterator is dropped the table is empty but keeps its
    /// allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.entry(7, |&v: &u32| v == 1).or_insert(1);
    ///
    /// let values: Vec<u32> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(values, vec![1]);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            table: self,
            index: 0,
        }
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of slots, always zero or a power of two.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the element count at which the next insertion grows the
    /// table.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns `log2(capacity)`, the number of hash bits used to pick a home
    /// slot.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns the configuration this table was created with.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Removes all elements from the table.
    ///
    /// The allocation is kept, so refilling up to the current threshold does
    /// not allocate.
    pub fn clear(&mut self) {
        self.drop_entries();
    }

    /// Removes all elements and releases the allocation, returning the table
    /// to its freshly created, zero-capacity state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.entry(1, |&v: &u8| v == 1).or_insert(1);
    /// assert!(table.capacity() > 0);
    ///
    /// table.reset();
    /// assert_eq!(table.capacity(), 0);
    /// assert!(table.is_empty());
    /// ```
    pub fn reset(&mut self) {
        self.drop_entries();

        // SAFETY: `alloc` came from `layout`; both are replaced right after.
        unsafe { self.layout.deallocate(self.alloc) }
        self.layout = DataLayout::empty();
        self.alloc = NonNull::dangling();
        self.capacity = 0;
        self.bits = 0;
        self.threshold = 0;
    }

    /// Shrinks the table to the smallest capacity that holds its elements.
    ///
    /// An empty table is released entirely, as with [`reset`].
    ///
    /// [`reset`]: HashTable::reset
    pub fn shrink_to_fit(&mut self) {
        if self.populated == 0 {
            self.reset();
            return;
        }

        if let Some(capacity) = capacity_for(self.populated, self.config.load_factor()) {
            if capacity < self.capacity {
                infallible(self.relocate(capacity, Fallibility::Infallible, None));
            }
        }
    }

    /// Reserves room for at least `additional` more elements without
    /// growing.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows.
    pub fn reserve(&mut self, additional: usize) {
        infallible(self.reserve_impl(additional, Fallibility::Infallible))
    }

    /// Fallible version of [`reserve`]. On error the table is unchanged.
    ///
    /// [`reserve`]: HashTable::reserve
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.reserve_impl(additional, Fallibility::Fallible)
    }

    fn reserve_impl(
        &mut self,
        additional: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let required = self
            .populated
            .checked_add(additional)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        if required <= self.threshold {
            return Ok(());
        }

        let capacity = capacity_for(required, self.config.load_factor())
            .ok_or_else(|| fallibility.capacity_overflow())?;
        self.relocate(capacity, fallibility, None)
    }

    /// Rebuilds the table at its current capacity, recomputing every
    /// element's hash with `hasher`.
    ///
    /// Needed whenever the hash of stored elements changes, for example
    /// after switching a keyed map to a new seed.
    ///
    /// Every new hash is computed before anything moves, so if `hasher`
    /// panics the table is left as it was.
    pub fn rehash(&mut self, hasher: impl FnMut(&T) -> u32) {
        infallible(self.rehash_impl(hasher, Fallibility::Infallible))
    }

    /// Fallible version of [`rehash`]. On error the table is unchanged.
    ///
    /// [`rehash`]: HashTable::rehash
    pub fn try_rehash(&mut self, hasher: impl FnMut(&T) -> u32) -> Result<(), TryReserveError> {
        self.rehash_impl(hasher, Fallibility::Fallible)
    }

    fn rehash_impl(
        &mut self,
        mut hasher: impl FnMut(&T) -> u32,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut hashes = Vec::new();
        if hashes.try_reserve_exact(self.populated).is_err() {
            let layout =
                Layout::array::<u32>(self.populated).map_err(|_| fallibility.capacity_overflow())?;
            return Err(fallibility.alloc_err(layout));
        }
        // SAFETY: Indices are in bounds and only occupied slots are read.
        unsafe {
            for index in 0..self.capacity {
                if self.is_occupied(index) {
                    hashes.push(hasher(&*self.bucket_ptr(index)));
                }
            }
        }

        self.relocate(self.capacity, fallibility, Some(&hashes))
    }

    /// Removes and returns a value from the table.
    ///
    /// The rest of the value's probe run is shifted back, so no tombstone is
    /// left behind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(99, |&n| n == 99), None);
    /// ```
    pub fn remove(&mut self, hash: u32, eq: impl Fn(&T) -> bool) -> Option<T> {
        if self.populated == 0 {
            return None;
        }

        // SAFETY: A populated table is allocated.
        match unsafe { self.probe(hash, eq) } {
            // SAFETY: `probe` only reports occupied slots as found.
            Probe::Found(index) => Some(unsafe { self.take(index) }),
            Probe::Vacant { .. } => None,
        }
    }

    /// Keeps only the elements for which `keep` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// for n in 0..10u32 {
    ///     table.entry(n, |&v: &u32| v == n).or_insert(n);
    /// }
    /// table.retain(|n| *n % 2 == 0);
    /// assert_eq!(table.len(), 5);
    /// ```
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        if self.populated == 0 {
            return;
        }

        let mask = self.capacity - 1;
        // Start at an empty slot: it stays empty, so backward shifts never
        // carry an entry across it and each element is visited exactly once.
        // SAFETY: Indices are in bounds and a slot is only inspected after its
        // tag says it is occupied.
        unsafe {
            let Some(start) = (0..self.capacity).find(|&index| !self.is_occupied(index)) else {
                unreachable!("a table always has an empty slot")
            };

            let mut index = start;
            let mut visited = 0;
            while visited < self.capacity {
                if self.is_occupied(index) && !keep(&mut *self.bucket_ptr(index)) {
                    drop(self.take(index));
                    // The next entry of the run may have moved into `index`.
                    if self.is_occupied(index) {
                        continue;
                    }
                }
                index = (index + 1) & mask;
                visited += 1;
            }
        }
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// If the table is at its threshold it grows first, whether or not the
    /// entry turns out to be occupied.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::hash_table::Entry;
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// match table.entry(5, |s: &String| s == "hello") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string());
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         *entry.get_mut() = "updated".to_string();
    ///     }
    /// }
    /// assert_eq!(table.len(), 1);
    /// ```
    #[inline]
    pub fn entry(&mut self, hash: u32, eq: impl Fn(&T) -> bool) -> Entry<'_, T> {
        infallible(self.entry_impl(hash, eq, Fallibility::Infallible))
    }

    /// Fallible version of [`entry`]. If growing fails the table is unchanged.
    ///
    /// [`entry`]: HashTable::entry
    #[inline]
    pub fn try_entry(
        &mut self,
        hash: u32,
        eq: impl Fn(&T) -> bool,
    ) -> Result<Entry<'_, T>, TryReserveError> {
        self.entry_impl(hash, eq, Fallibility::Fallible)
    }

    #[inline(always)]
    fn entry_impl(
        &mut self,
        hash: u32,
        eq: impl Fn(&T) -> bool,
        fallibility: Fallibility,
    ) -> Result<Entry<'_, T>, TryReserveError> {
        self.maybe_grow(fallibility)?;

        // SAFETY: After growing, `populated < threshold <= capacity`.
        match unsafe { self.probe(hash, eq) } {
            Probe::Found(index) => Ok(Entry::Occupied(OccupiedEntry { table: self, index })),
            Probe::Vacant { index, dist } => Ok(Entry::Vacant(VacantEntry {
                table: self,
                hash,
                index,
                dist,
            })),
        }
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_hash::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(42, |&n| n == 7), None);
    /// ```
    pub fn find(&self, hash: u32, eq: impl Fn(&T) -> bool) -> Option<&T> {
        if self.populated == 0 {
            return None;
        }

        // SAFETY: A populated table is allocated; found slots are occupied.
        unsafe {
            match self.probe(hash, eq) {
                Probe::Found(index) => Some(&*self.bucket_ptr(index)),
                Probe::Vacant { .. } => None,
            }
        }
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    pub fn find_mut(&mut self, hash: u32, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        if self.populated == 0 {
            return None;
        }

        // SAFETY: A populated table is allocated; found slots are occupied.
        unsafe {
            match self.probe(hash, eq) {
                Probe::Found(index) => Some(&mut *self.bucket_ptr(index)),
                Probe::Vacant { .. } => None,
            }
        }
    }

    /// Computes a histogram of probe sequence lengths for the current table
    /// state.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut counts = Vec::new();

        // SAFETY: Indices are in bounds; hashes are read from occupied slots.
        unsafe {
            for index in 0..self.capacity {
                if self.is_occupied(index) {
                    let len = self.probe_len_at(index);
                    if counts.len() <= len {
                        counts.resize(len + 1, 0);
                    }
                    counts[len] += 1;
                }
            }
        }

        ProbeHistogram { counts }
    }

    /// Returns detailed utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.probe_histogram();
        let total_len: usize = histogram
            .counts()
            .iter()
            .enumerate()
            .map(|(len, count)| len * count)
            .sum();

        DebugStats {
            populated: self.populated,
            capacity: self.capacity,
            threshold: self.threshold,
            load_factor: if self.capacity == 0 {
                0.0
            } else {
                self.populated as f64 / self.capacity as f64
            },
            max_probe_len: histogram.max_probe_len().unwrap_or(0),
            mean_probe_len: if self.populated == 0 {
                0.0
            } else {
                total_len as f64 / self.populated as f64
            },
            total_bytes: self.layout.layout.size(),
            wasted_bytes: (self.capacity - self.populated)
                * (core::mem::size_of::<T>() + core::mem::size_of::<u32>() + 1),
        }
    }

    /// Checks the structural invariants, panicking with a description of the
    /// first violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        if self.capacity == 0 {
            assert_eq!(self.populated, 0);
            assert_eq!(self.threshold, 0);
            return;
        }

        assert!(self.capacity.is_power_of_two());
        assert_eq!(self.bits, bits_for(self.capacity));
        assert!(self.populated <= self.threshold, "{self:?}");
        assert!(self.threshold < self.capacity, "{self:?}");

        let mut occupied = 0;
        // SAFETY: Indices are in bounds; hashes are read from occupied slots.
        unsafe {
            for index in 0..self.capacity {
                if !self.is_occupied(index) {
                    continue;
                }
                occupied += 1;

                let next = (index + 1) & (self.capacity - 1);
                if self.is_occupied(next) {
                    assert!(
                        self.probe_len_at(next) <= self.probe_len_at(index) + 1,
                        "robin hood ordering broken between {index} and {next}: {self:?}"
                    );
                }
            }
        }
        assert_eq!(occupied, self.populated);
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, T>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Modifies an occupied entry in place before any potential insert.
    pub fn and_modify(self, f: impl FnOnce(&mut T)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns the hash this entry was looked up with.
    pub fn hash(&self) -> u32 {
        match self {
            Entry::Occupied(entry) => entry.hash(),
            Entry::Vacant(entry) => entry.hash(),
        }
    }
}

impl<'a, T> Entry<'a, T>
where
    T: Default,
{
    /// Inserts `T::default()` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut T {
        self.or_insert_with(T::default)
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: u32,
    index: usize,
    dist: usize,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Inserts a value into the table and returns a mutable reference to it.
    ///
    /// Never allocates: the table already grew when the entry was created.
    pub fn insert(self, value: T) -> &'a mut T {
        // SAFETY: `index`/`dist` come from a probe on an allocated table with
        // room for one more entry; the new value lands at `index`.
        unsafe {
            self.table.insert_at(self.index, self.dist, self.hash, value);
            &mut *self.table.bucket_ptr(self.index)
        }
    }

    /// Returns the hash the value will be stored under.
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Returns a reference to the value.
    pub fn get(&self) -> &T {
        // SAFETY: `index` is an occupied slot.
        unsafe { &*self.table.bucket_ptr(self.index) }
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: `index` is an occupied slot.
        unsafe { &mut *self.table.bucket_ptr(self.index) }
    }

    /// Converts the entry into a mutable reference with the table's lifetime.
    pub fn into_mut(self) -> &'a mut T {
        // SAFETY: `index` is an occupied slot.
        unsafe { &mut *self.table.bucket_ptr(self.index) }
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> T {
        // SAFETY: `index` is an occupied slot.
        unsafe { self.table.take(self.index) }
    }

    /// Returns the hash stored with the value.
    pub fn hash(&self) -> u32 {
        // SAFETY: `index` is an occupied slot.
        unsafe { self.table.stored_hash(self.index) }
    }
}

/// An iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, T> {
    table: &'a HashTable<T>,
    index: usize,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            table: self.table,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        // SAFETY: `index < capacity` is checked before each access and values
        // are only read from occupied slots.
        unsafe {
            while self.index < self.table.capacity {
                let index = self.index;
                self.index += 1;
                if self.table.is_occupied(index) {
                    self.remaining -= 1;
                    return Some(&*self.table.bucket_ptr(index));
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// A mutable iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, T> {
    table: &'a HashTable<T>,
    index: usize,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        // SAFETY: The iterator was created from a unique borrow of the table
        // and yields each occupied slot at most once, so the returned
        // references never alias. Bucket pointers carry the allocation's
        // provenance, not the shared borrow's.
        unsafe {
            while self.index < self.table.capacity {
                let index = self.index;
                self.index += 1;
                if self.table.is_occupied(index) {
                    self.remaining -= 1;
                    return Some(&mut *self.table.bucket_ptr(index));
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`]. Values
/// not consumed are dropped when the iterator is dropped.
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.table.populated == 0 {
            return None;
        }

        // SAFETY: `index < capacity` is checked before each access. The slot
        // is marked empty before its value is moved out.
        unsafe {
            while self.index < self.table.capacity {
                let index = self.index;
                self.index += 1;
                if self.table.is_occupied(index) {
                    self.table.set_tag(index, EMPTY);
                    self.table.populated -= 1;
                    return Some(self.table.bucket_ptr(index).read());
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}
impl<T> FusedIterator for Drain<'_, T> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<T> {
    table: HashTable<T>,
    index: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.table.populated == 0 {
            return None;
        }

        // SAFETY: Same reasoning as `Drain::next`; the table drops whatever
        // is left when the iterator is dropped.
        unsafe {
            while self.index < self.table.capacity {
                let index = self.index;
                self.index += 1;
                if self.table.is_occupied(index) {
                    self.table.set_tag(index, EMPTY);
                    self.table.populated -= 1;
                    return Some(self.table.bucket_ptr(index).read());
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for HashTable<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            table: self,
            index: 0,
        }
    }
}

impl<'a, T> IntoIterator for &'a HashTable<T> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut HashTable<T> {
    type IntoIter = IterMut<'a, T>;
    type Item = &'a mut T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use core::cell::Cell;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::hasher::fold_hash;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u32 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        fold_hash(h.finish())
    }

    /// Returns the `nth` hash whose home slot is `home` in a table of
    /// `2^bits` slots.
    fn hash_with_home(home: usize, bits: u32, nth: usize) -> u32 {
        (0..u32::MAX)
            .filter(|&h| home_slot(h, bits) == home)
            .nth(nth)
            .unwrap()
    }

    fn insert_item(table: &mut HashTable<Item>, hash: u32, key: u64, value: i32) {
        match table.entry(hash, |v| v.key == key) {
            Entry::Vacant(v) => {
                v.insert(Item { key, value });
            }
            Entry::Occupied(_) => panic!("unexpected occupied for {key}: {table:#?}"),
        }
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            insert_item(&mut table, hash, k, (k as i32) * 2);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                }),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 32);
        table.assert_invariants();

        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |v| v.key == k).map(|v| v.value), Some(k as i32 * 2));
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
    }

    #[test]
    fn empty_table_does_not_allocate() {
        let table: HashTable<Item> = HashTable::new();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.threshold(), 0);
        assert_eq!(table.bits(), 0);
        assert!(table.find(0, |_| true).is_none());
        assert_eq!(table.iter().count(), 0);
        table.assert_invariants();
    }

    #[test]
    fn first_insert_allocates_minimum() {
        let mut table = HashTable::new();
        insert_item(&mut table, 7, 1, 1);
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.bits(), 5);
        assert_eq!(table.threshold(), 27);
    }

    #[test]
    fn grows_when_threshold_reached() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..27u64 {
            insert_item(&mut table, hash_key(&state, k), k, 0);
        }
        assert_eq!(table.capacity(), 32);

        insert_item(&mut table, hash_key(&state, 27), 27, 0);
        assert_eq!(table.capacity(), 64);
        table.assert_invariants();

        for k in 0..28u64 {
            assert!(table.find(hash_key(&state, k), |v| v.key == k).is_some());
        }
    }

    #[test]
    fn thousand_keys_end_at_2048_slots() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..1000u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }
        assert_eq!(table.len(), 1000);
        assert_eq!(table.capacity(), 2048);
        table.assert_invariants();
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        let k = 42u64;
        let hash = hash_key(&state, k);

        insert_item(&mut table, hash, k, 7);

        match table.entry(hash, |v| v.key == k) {
            Entry::Occupied(mut occ) => {
                assert_eq!(occ.hash(), hash);
                let prev_value = occ.get().value;
                *occ.get_mut() = Item { key: k, value: 11 };
                assert_eq!(prev_value, 7, "{:#?}", table);
            }
            Entry::Vacant(_) => panic!("should be occupied: {}#{:08X} in {:#?}", k, hash, table),
        }
        let found = table.find(hash, |v| v.key == k).unwrap();
        assert_eq!(found.value, 11);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn equal_hashes_distinct_keys() {
        let mut table = HashTable::new();
        for k in 0..10u64 {
            insert_item(&mut table, 0xABCD, k, k as i32);
        }
        assert_eq!(table.len(), 10);
        for k in 0..10u64 {
            assert_eq!(table.find(0xABCD, |v| v.key == k).map(|v| v.value), Some(k as i32));
        }
        table.assert_invariants();
    }

    #[test]
    fn find_mut_and_modify() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..5u64 {
            insert_item(&mut table, hash_key(&state, k), k, 1);
        }

        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            if let Some(v) = table.find_mut(hash, |v| v.key == k) {
                v.value += 9;
            }
        }
        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            let v = table.find(hash, |v| v.key == k).unwrap();
            assert_eq!(v.value, 10);
        }
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..8u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }
        assert_eq!(table.len(), 8);
        for k in [0u64, 3, 7] {
            let hash = hash_key(&state, k);
            let removed = table.remove(hash, |v| v.key == k).expect("should remove");
            assert_eq!(removed.key, k);
        }
        assert_eq!(table.len(), 5);
        table.assert_invariants();

        let hash = hash_key(&state, 1000);
        assert!(table.remove(hash, |v| v.key == 1000).is_none());

        for k in [1u64, 2, 4, 5, 6] {
            assert!(table.find(hash_key(&state, k), |v| v.key == k).is_some());
        }
    }

    #[test]
    fn collisions_displace_and_shift_back() {
        let mut table = HashTable::new();
        let hashes = [
            hash_with_home(4, 5, 0),
            hash_with_home(4, 5, 1),
            hash_with_home(4, 5, 2),
        ];
        for (k, &hash) in hashes.iter().enumerate() {
            insert_item(&mut table, hash, k as u64, k as i32);
        }
        assert_eq!(table.bits(), 5);
        assert_eq!(table.probe_histogram().counts(), &[1, 1, 1]);

        table.remove(hashes[0], |v| v.key == 0).unwrap();
        assert_eq!(table.probe_histogram().counts(), &[1, 1]);
        assert_eq!(table.find(hashes[1], |v| v.key == 1).map(|v| v.value), Some(1));
        assert_eq!(table.find(hashes[2], |v| v.key == 2).map(|v| v.value), Some(2));
        table.assert_invariants();
    }

    #[test]
    fn rich_entry_yields_its_slot() {
        let mut table = HashTable::new();
        let a = hash_with_home(4, 5, 0);
        let b = hash_with_home(5, 5, 0);
        let c = hash_with_home(4, 5, 1);

        insert_item(&mut table, a, 0, 0);
        insert_item(&mut table, b, 1, 1);
        insert_item(&mut table, c, 2, 2);

        // `c` takes slot 5 from `b`, which moves on to slot 6.
        assert_eq!(table.probe_histogram().counts(), &[1, 2]);
        table.assert_invariants();
        for (hash, key) in [(a, 0u64), (b, 1), (c, 2)] {
            assert!(table.find(hash, |v| v.key == key).is_some());
        }
    }

    #[test]
    fn backward_shift_stops_at_home_entry() {
        let mut table = HashTable::new();
        let a = hash_with_home(4, 5, 0);
        let b = hash_with_home(4, 5, 1);
        let c = hash_with_home(6, 5, 0);

        insert_item(&mut table, a, 0, 0);
        insert_item(&mut table, b, 1, 1);
        insert_item(&mut table, c, 2, 2);
        assert_eq!(table.probe_histogram().counts(), &[2, 1]);

        table.remove(a, |v| v.key == 0).unwrap();
        assert_eq!(table.probe_histogram().counts(), &[2]);
        assert!(table.find(b, |v| v.key == 1).is_some());
        assert!(table.find(c, |v| v.key == 2).is_some());
        table.assert_invariants();
    }

    #[test]
    fn runs_wrap_around_the_end() {
        let mut table = HashTable::new();
        let hashes: Vec<u32> = (0..4).map(|n| hash_with_home(31, 5, n)).collect();
        for (k, &hash) in hashes.iter().enumerate() {
            insert_item(&mut table, hash, k as u64, k as i32);
        }
        assert_eq!(table.probe_histogram().counts(), &[1, 1, 1, 1]);
        table.assert_invariants();

        table.remove(hashes[1], |v| v.key == 1).unwrap();
        table.assert_invariants();
        assert_eq!(table.probe_histogram().counts(), &[1, 1, 1]);
        for k in [0usize, 2, 3] {
            assert_eq!(
                table.find(hashes[k], |v| v.key == k as u64).map(|v| v.value),
                Some(k as i32)
            );
        }
        assert!(table.find(hashes[1], |v| v.key == 1).is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..100000u64 {
            let hash = hash_key(&state, k);
            insert_item(&mut table, hash, k, k as i32);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: k as i32
                })
            );
        }

        assert_eq!(table.len(), 100000);
        table.assert_invariants();
        for k in 0..100000u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |v| v.key == k).map(|v| v.value), Some(k as i32));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn interleaved_insert_remove() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for round in 0..20u64 {
            for k in 0..500u64 {
                let key = round * 1000 + k;
                insert_item(&mut table, hash_key(&state, key), key, k as i32);
            }
            for k in (0..500u64).step_by(2) {
                let key = round * 1000 + k;
                assert!(table.remove(hash_key(&state, key), |v| v.key == key).is_some());
            }
            table.assert_invariants();
        }

        assert_eq!(table.len(), 20 * 250);
        for round in 0..20u64 {
            for k in 0..500u64 {
                let key = round * 1000 + k;
                let found = table.find(hash_key(&state, key), |v| v.key == key);
                assert_eq!(found.is_some(), k % 2 == 1, "{key}");
            }
        }
    }

    #[test]
    fn entry_helpers() {
        let mut table: HashTable<(u32, u32)> = HashTable::new();
        *table.entry(1, |e| e.0 == 1).or_insert((1, 10)) = (1, 11);
        assert_eq!(table.find(1, |e| e.0 == 1), Some(&(1, 11)));

        table
            .entry(1, |e| e.0 == 1)
            .and_modify(|e| e.1 += 1)
            .or_insert_with(|| unreachable!());
        assert_eq!(table.find(1, |e| e.0 == 1), Some(&(1, 12)));

        let value = table.entry(2, |e| e.0 == 2).or_insert_with(|| (2, 20));
        assert_eq!(*value, (2, 20));

        let removed = match table.entry(2, |e| e.0 == 2) {
            Entry::Occupied(e) => e.remove(),
            Entry::Vacant(_) => panic!("expected occupied"),
        };
        assert_eq!(removed, (2, 20));
        assert_eq!(table.len(), 1);

        let mut defaults: HashTable<u32> = HashTable::new();
        assert_eq!(*defaults.entry(3, |&v| v == 0).or_default(), 0);
    }

    #[test]
    fn drops_every_value_once() {
        let drops = Rc::new(Cell::new(0));

        struct Tracked {
            key: u64,
            drops: Rc<Cell<usize>>,
        }
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.drops.set(self.drops.get() + 1);
            }
        }

        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..100u64 {
            table.entry(hash_key(&state, k), |t: &Tracked| t.key == k).or_insert(Tracked {
                key: k,
                drops: drops.clone(),
            });
        }

        drop(table.remove(hash_key(&state, 5), |t| t.key == 5));
        assert_eq!(drops.get(), 1);

        let mut drain = table.drain();
        drop(drain.next());
        drop(drain);
        assert_eq!(drops.get(), 100);
        assert!(table.is_empty());

        for k in 0..10u64 {
            table.entry(hash_key(&state, k), |t: &Tracked| t.key == k).or_insert(Tracked {
                key: k,
                drops: drops.clone(),
            });
        }
        table.clear();
        assert_eq!(drops.get(), 110);

        for k in 0..10u64 {
            table.entry(hash_key(&state, k), |t: &Tracked| t.key == k).or_insert(Tracked {
                key: k,
                drops: drops.clone(),
            });
        }
        drop(table);
        assert_eq!(drops.get(), 120);
    }

    #[test]
    fn clear_keeps_allocation_reset_releases_it() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..100u64 {
            insert_item(&mut table, hash_key(&state, k), k, 0);
        }
        let capacity = table.capacity();

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(table.find(hash_key(&state, 1), |v| v.key == 1).is_none());
        table.assert_invariants();

        insert_item(&mut table, hash_key(&state, 1), 1, 1);
        table.reset();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.len(), 0);
        table.assert_invariants();

        insert_item(&mut table, hash_key(&state, 2), 2, 2);
        assert_eq!(table.capacity(), 32);
    }

    #[test]
    fn clone_is_independent() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..50u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }

        let mut cloned = table.clone();
        assert_eq!(cloned.len(), 50);
        assert_eq!(cloned.capacity(), table.capacity());
        cloned.assert_invariants();

        cloned.remove(hash_key(&state, 0), |v| v.key == 0);
        assert!(table.find(hash_key(&state, 0), |v| v.key == 0).is_some());
        assert!(cloned.find(hash_key(&state, 0), |v| v.key == 0).is_none());

        let empty: HashTable<Item> = HashTable::new();
        assert_eq!(empty.clone().capacity(), 0);
    }

    #[test]
    fn with_capacity_and_reserve() {
        let table: HashTable<Item> = HashTable::with_capacity(1000);
        assert_eq!(table.capacity(), 2048);
        assert!(table.threshold() >= 1000);

        let state = HashState::default();
        let mut table = HashTable::new();
        table.reserve(200);
        let capacity = table.capacity();
        assert!(table.threshold() >= 200);
        for k in 0..200u64 {
            insert_item(&mut table, hash_key(&state, k), k, 0);
        }
        assert_eq!(table.capacity(), capacity);

        // Already enough room.
        table.reserve(0);
        assert_eq!(table.capacity(), capacity);
    }

    #[test]
    fn try_reserve_overflow_leaves_table_intact() {
        let mut table = HashTable::new();
        insert_item(&mut table, 1, 1, 1);

        assert_eq!(table.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow));
        assert_eq!(
            HashTable::<Item>::try_with_capacity_and_config(usize::MAX, TableConfig::new()).err(),
            Some(TryReserveError::CapacityOverflow)
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 32);
        assert!(table.find(1, |v| v.key == 1).is_some());

        let table = HashTable::<Item>::try_with_capacity(100).unwrap();
        assert_eq!(table.capacity(), 128);
    }

    #[test]
    fn shrink_to_fit_keeps_entries() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..1000u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }
        for k in 10..1000u64 {
            table.remove(hash_key(&state, k), |v| v.key == k);
        }

        table.shrink_to_fit();
        assert_eq!(table.capacity(), 32);
        table.assert_invariants();
        for k in 0..10u64 {
            assert!(table.find(hash_key(&state, k), |v| v.key == k).is_some());
        }

        table.clear();
        table.shrink_to_fit();
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn rehash_moves_entries_to_new_hashes() {
        let mut table = HashTable::new();
        for k in 0..100u32 {
            table.entry(k, |&v: &u32| v == k).or_insert(k);
        }
        let capacity = table.capacity();

        let rehashed = |v: &u32| v.wrapping_mul(0x2545_F491) ^ 0x5555;
        table.try_rehash(rehashed).unwrap();
        assert_eq!(table.capacity(), capacity);
        table.assert_invariants();
        for k in 0..100u32 {
            assert_eq!(table.find(rehashed(&k), |&v| v == k), Some(&k));
        }
    }

    #[test]
    fn panicking_rehash_keeps_table() {
        let mut table = HashTable::new();
        for k in 0..100u32 {
            table.entry(k, |&v: &u32| v == k).or_insert(k);
        }
        let capacity = table.capacity();

        let mut calls = 0;
        let result = std::panic::catch_unwind(core::panic::AssertUnwindSafe(|| {
            table.rehash(|&v| {
                calls += 1;
                if calls == 50 {
                    panic!("hasher failed");
                }
                v ^ 0xFFFF
            })
        }));
        assert!(result.is_err());

        assert_eq!(table.len(), 100);
        assert_eq!(table.capacity(), capacity);
        table.assert_invariants();
        for k in 0..100u32 {
            assert_eq!(table.find(k, |&v| v == k), Some(&k));
        }
    }

    #[test]
    fn retain_visits_each_once() {
        let mut table = HashTable::new();
        // Force long runs, including one wrapping past the last slot.
        for k in 0..20u32 {
            let hash = hash_with_home(if k < 10 { 30 } else { 3 }, 5, k as usize);
            table.entry(hash, |&(key, _): &(u32, u32)| key == k).or_insert((k, 0));
        }

        table.retain(|(key, visits)| {
            *visits += 1;
            *key % 3 != 0
        });
        table.assert_invariants();

        assert_eq!(table.len(), 13);
        assert!(table.iter().all(|&(key, visits)| visits == 1 && key % 3 != 0));
    }

    #[test]
    fn iterators() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..64u64 {
            insert_item(&mut table, hash_key(&state, k), k, 1);
        }

        let iter = table.iter();
        assert_eq!(iter.len(), 64);
        let mut keys: Vec<u64> = iter.map(|v| v.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..64).collect::<Vec<_>>());

        for item in table.iter_mut() {
            item.value += item.key as i32;
        }
        assert!(table.iter().all(|v| v.value == v.key as i32 + 1));

        let mut owned: Vec<Item> = table.into_iter().collect();
        owned.sort_by_key(|v| v.key);
        assert_eq!(owned.len(), 64);
        assert_eq!(owned[10], Item { key: 10, value: 11 });
    }

    #[test]
    fn strings_survive_growth() {
        let state = HashState::default();
        let mut table: HashTable<(String, usize)> = HashTable::new();
        let hash = |s: &str| {
            let mut h = state.build_hasher();
            h.write(s.as_bytes());
            fold_hash(h.finish())
        };

        for n in 0..500usize {
            let key = n.to_string();
            table
                .entry(hash(&key), |(k, _)| *k == key)
                .or_insert_with(|| (key.clone(), n));
        }
        for n in 0..500usize {
            let key = n.to_string();
            assert_eq!(table.find(hash(&key), |(k, _)| *k == key).map(|e| e.1), Some(n));
        }
    }

    #[test]
    fn stats_report_layout() {
        let mut table = HashTable::new();
        let empty = table.debug_stats();
        assert_eq!(empty.capacity, 0);
        assert_eq!(empty.total_bytes, 0);
        assert_eq!(empty.mean_probe_len, 0.0);

        for k in 0..3usize {
            insert_item(&mut table, hash_with_home(4, 5, k), k as u64, 0);
        }
        let stats = table.debug_stats();
        assert_eq!(stats.populated, 3);
        assert_eq!(stats.capacity, 32);
        assert_eq!(stats.threshold, 27);
        assert_eq!(stats.max_probe_len, 2);
        assert_eq!(stats.mean_probe_len, 1.0);
        assert!(stats.total_bytes >= 32 * (1 + 4 + core::mem::size_of::<Item>()));

        let histogram = table.probe_histogram();
        assert_eq!(histogram.total(), 3);
        assert_eq!(histogram.max_probe_len(), Some(2));
        assert_eq!(histogram.counts(), &[1, 1, 1]);
    }
}
