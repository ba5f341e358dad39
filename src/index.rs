//! Slot index arithmetic shared by every table.
//!
//! Capacities are always powers of two so that wraparound is a mask, and the
//! home slot of a hash is picked with Fibonacci hashing: the hash is multiplied
//! by `2^32 / φ` and the top `bits` bits of the product select the slot. This
//! spreads clustered hashes (sequential integers, pointers) across the whole
//! table instead of only the low bits.

/// Multiplier used by Fibonacci hashing (`2^32 / φ`, rounded to odd).
pub const FIB_CONST: u32 = 0x9E37_79B9;

/// Number of slots allocated the first time an empty table grows.
pub const MIN_CAPACITY: usize = 32;

/// A 32-bit hash can address at most `2^32` home slots.
pub const MAX_BITS: u32 = 32;

/// Returns the slot a hash wants to live in for a table of `2^bits` slots.
#[inline(always)]
pub fn home_slot(hash: u32, bits: u32) -> usize {
    hash.wrapping_mul(FIB_CONST)
        .checked_shr(MAX_BITS - bits)
        .unwrap_or(0) as usize
}

/// Returns the probe sequence length of an entry with `hash` stored at
/// `index`, i.e. how many slots it sits past its home slot.
#[inline(always)]
pub fn probe_len(index: usize, capacity: usize, hash: u32, bits: u32) -> usize {
    debug_assert!(capacity.is_power_of_two());
    index.wrapping_sub(home_slot(hash, bits)) & (capacity - 1)
}

/// Number of entries a table of `capacity` slots may hold before it grows.
#[inline]
pub fn threshold(capacity: usize, load_factor: f32) -> usize {
    ((capacity as f64) * (load_factor as f64)) as usize
}

/// Smallest power-of-two capacity (at least [`MIN_CAPACITY`]) whose
/// threshold admits `items` entries.
pub fn capacity_for(items: usize, load_factor: f32) -> Option<usize> {
    let estimate = (items as f64) / (load_factor as f64);
    if !(estimate < (usize::MAX as f64)) {
        return None;
    }

    let mut capacity = (estimate as usize)
        .max(MIN_CAPACITY)
        .checked_next_power_of_two()?;
    // The estimate is truncated, so it can fall one doubling short.
    while threshold(capacity, load_factor) < items {
        capacity = capacity.checked_mul(2)?;
    }

    within_bits(capacity)
}

/// Returns `log2(capacity)` for a power-of-two capacity (and 0 for 0).
#[inline]
pub fn bits_for(capacity: usize) -> u32 {
    if capacity == 0 {
        0
    } else {
        capacity.trailing_zeros()
    }
}

#[inline]
fn within_bits(capacity: usize) -> Option<usize> {
    (bits_for(capacity) <= MAX_BITS).then_some(capacity)
}

/// How a table picks its next capacity once it reaches its threshold.
///
/// Any policy is valid as long as it keeps capacities powers of two and
/// strictly increasing, so this is a tuning knob rather than a semantic one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GrowthPolicy {
    /// Double the slot count on every growth.
    #[default]
    Double,
    /// Grow by half, then round up to the next power of two.
    OneAndHalf,
}

impl GrowthPolicy {
    /// Returns the capacity that follows `current`, or `None` if it would
    /// overflow.
    pub fn next_capacity(self, current: usize) -> Option<usize> {
        if current == 0 {
            return Some(MIN_CAPACITY);
        }

        let grown = match self {
            GrowthPolicy::Double => current.checked_mul(2)?,
            GrowthPolicy::OneAndHalf => current.checked_add(current / 2)?,
        };

        within_bits(grown.max(MIN_CAPACITY).checked_next_power_of_two()?)
    }
}
