//! The hash and equality contract every table is parameterized by.
//!
//! A table never hashes or compares keys itself; it asks a [`KeyHasher`]. The
//! hasher receives the table's 32-bit seed on every call so that two tables
//! holding the same keys do not share a probe layout.

use core::cmp::Ordering;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The [`BuildHasher`] used by [`DefaultKeyHasher`].
        ///
        /// This is `foldhash`'s fixed-state hasher, so hashes are reproducible
        /// for a given seed.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// The [`BuildHasher`] used by [`DefaultKeyHasher`].
        ///
        /// Without `foldhash` this is std's SipHash with fixed keys.
        pub type DefaultHashBuilder =
            core::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;
    } else {
        /// The [`BuildHasher`] used by [`DefaultKeyHasher`].
        ///
        /// Without `foldhash` or `std` this is 32-bit FNV-1a.
        pub type DefaultHashBuilder = Fnv1aBuildHasher;
    }
}

/// The key hasher used by maps that do not name one.
pub type DefaultKeyHasher = StdKeyHasher<DefaultHashBuilder>;

/// Hashes and compares keys of type `K`.
///
/// Implementations must be consistent: keys that compare equal must hash to
/// the same value under the same seed. The hash does not need to be of high
/// quality; a poor hash only lengthens probe sequences.
pub trait KeyHasher<K: ?Sized> {
    /// Hashes `key` with `seed` mixed in.
    fn hash(&self, key: &K, seed: u32) -> u32;

    /// Returns `true` if `a` and `b` are the same key.
    fn eq(&self, a: &K, b: &K) -> bool;
}

impl<K: ?Sized, T: KeyHasher<K> + ?Sized> KeyHasher<K> for &T {
    #[inline]
    fn hash(&self, key: &K, seed: u32) -> u32 {
        (**self).hash(key, seed)
    }

    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        (**self).eq(a, b)
    }
}

/// Folds a 64-bit hash into 32 bits, keeping entropy from both halves.
#[inline(always)]
pub fn fold_hash(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// A [`KeyHasher`] for keys implementing [`Hash`] and [`Eq`], backed by any
/// [`BuildHasher`].
///
/// The seed is written into the hasher before the key, and the 64-bit result
/// is folded to 32 bits.
///
/// # Examples
///
/// ```rust
/// use robin_hash::hasher::DefaultKeyHasher;
/// use robin_hash::hasher::KeyHasher;
///
/// let hasher = DefaultKeyHasher::default();
/// assert_eq!(hasher.hash(&"key", 1), hasher.hash(&"key", 1));
/// assert!(hasher.eq(&"key", &"key"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StdKeyHasher<S = DefaultHashBuilder> {
    build_hasher: S,
}

impl<S> StdKeyHasher<S> {
    /// Wraps a [`BuildHasher`].
    pub const fn new(build_hasher: S) -> Self {
        Self { build_hasher }
    }

    /// Returns the wrapped [`BuildHasher`].
    pub fn build_hasher(&self) -> &S {
        &self.build_hasher
    }
}

impl<K, S> KeyHasher<K> for StdKeyHasher<S>
where
    K: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K, seed: u32) -> u32 {
        let mut hasher = self.build_hasher.build_hasher();
        hasher.write_u32(seed);
        key.hash(&mut hasher);
        fold_hash(hasher.finish())
    }

    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// A [`KeyHasher`] built from a hash function and an equality function.
///
/// # Examples
///
/// ```rust
/// use robin_hash::RobinMap;
/// use robin_hash::hasher::FnHasher;
///
/// fn hash_u32(key: &u32, seed: u32) -> u32 {
///     key ^ seed
/// }
///
/// let hasher = FnHasher::new(hash_u32, |a: &u32, b: &u32| a == b);
/// let mut map: RobinMap<u32, &str, _> = RobinMap::with_hasher(hasher);
/// map.insert(7, "seven");
/// assert_eq!(map.get(&7), Some(&"seven"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FnHasher<H, E> {
    hash: H,
    eq: E,
}

impl<H, E> FnHasher<H, E> {
    /// Pairs a `(key, seed) -> u32` hash function with an equality function.
    pub const fn new(hash: H, eq: E) -> Self {
        Self { hash, eq }
    }
}

impl<K, H, E> KeyHasher<K> for FnHasher<H, E>
where
    K: ?Sized,
    H: Fn(&K, u32) -> u32,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash(&self, key: &K, seed: u32) -> u32 {
        (self.hash)(key, seed)
    }

    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }
}

/// A [`KeyHasher`] built from a hash function and a three-way comparator.
///
/// Two keys are the same key when the comparator returns
/// [`Ordering::Equal`].
///
/// # Examples
///
/// ```rust
/// use robin_hash::hasher::CmpHasher;
/// use robin_hash::hasher::KeyHasher;
///
/// let hasher = CmpHasher::new(
///     |s: &str, seed: u32| s.len() as u32 ^ seed,
///     |a: &str, b: &str| a.cmp(b),
/// );
/// assert!(hasher.eq("a", "a"));
/// assert!(!hasher.eq("a", "b"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct CmpHasher<H, C> {
    hash: H,
    cmp: C,
}

impl<H, C> CmpHasher<H, C> {
    /// Pairs a `(key, seed) -> u32` hash function with a comparator.
    pub const fn new(hash: H, cmp: C) -> Self {
        Self { hash, cmp }
    }
}

impl<K, H, C> KeyHasher<K> for CmpHasher<H, C>
where
    K: ?Sized,
    H: Fn(&K, u32) -> u32,
    C: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn hash(&self, key: &K, seed: u32) -> u32 {
        (self.hash)(key, seed)
    }

    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        (self.cmp)(a, b) == Ordering::Equal
    }
}

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hashes a byte string with 32-bit FNV-1a, starting from `seed` xor the
/// offset basis.
///
/// Small and dependency free, but weak against adversarial input.
#[inline]
pub fn fnv1a(bytes: &[u8], seed: u32) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS ^ seed, |hash, &byte| {
        (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
    })
}

/// A streaming 32-bit FNV-1a [`Hasher`].
#[derive(Clone, Copy, Debug)]
pub struct Fnv1aHasher {
    state: u32,
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state as u64
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.state = bytes.iter().fold(self.state, |hash, &byte| {
            (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
        });
    }
}

/// A [`BuildHasher`] producing [`Fnv1aHasher`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fnv1aBuildHasher;

impl BuildHasher for Fnv1aBuildHasher {
    type Hasher = Fnv1aHasher;

    fn build_hasher(&self) -> Self::Hasher {
        Fnv1aHasher::default()
    }
}
