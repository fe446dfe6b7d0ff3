//! Hash spreading and capacity arithmetic for the bucket table.
//!
//! Bucket indexes are taken from the low bits of a 32-bit hash, so a primary
//! hash whose entropy sits in the high bits would pile every key into a few
//! buckets. The full 64-bit hash from the map's [`BuildHasher`] is therefore
//! folded to 32 bits and run through a Wang/Jenkins mixing step before it is
//! masked.

use std::hash::{BuildHasher, Hash};

/// Smallest bucket count of a real table. Must be a power of two.
pub(crate) const MINIMUM_CAPACITY: usize = 4;

/// Largest bucket count. Must be a power of two.
pub(crate) const MAXIMUM_CAPACITY: usize = 1 << 30;

/// Bucket count of the placeholder table every default map starts with.
pub(crate) const PLACEHOLDER_CAPACITY: usize = MINIMUM_CAPACITY >> 1;

/// Hash builder used when a map is created without one.
///
/// With the `ahash` feature this is [`ahash::RandomState`]; with `fxhash` it
/// is [`rustc_hash::FxBuildHasher`]. Otherwise it is a deterministic
/// builder over the standard library's `DefaultHasher`.
#[cfg(feature = "ahash")]
pub type DefaultHashBuilder = ahash::RandomState;

/// Hash builder used when a map is created without one.
#[cfg(all(feature = "fxhash", not(feature = "ahash")))]
pub type DefaultHashBuilder = rustc_hash::FxBuildHasher;

/// Hash builder used when a map is created without one.
#[cfg(not(any(feature = "ahash", feature = "fxhash")))]
pub type DefaultHashBuilder =
    std::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

/// Mixes the bits of `hash` so that the low bits depend on all of them.
#[inline]
pub(crate) const fn secondary_hash(hash: u32) -> u32 {
    let mut mixed = hash;
    mixed = mixed.wrapping_add((mixed << 15) ^ 0xffff_cd7d);
    mixed ^= mixed >> 10;
    mixed = mixed.wrapping_add(mixed << 3);
    mixed ^= mixed >> 6;
    mixed = mixed.wrapping_add((mixed << 2).wrapping_add(mixed << 14));
    mixed ^ (mixed >> 16)
}

/// The stored hash of `key`: primary hash, folded, then mixed.
#[inline]
pub(crate) fn spread<K: Hash + ?Sized, S: BuildHasher>(builder: &S, key: &K) -> u32 {
    let full = builder.hash_one(key);
    #[allow(clippy::cast_possible_truncation)]
    let folded = (full ^ (full >> 32)) as u32;
    secondary_hash(folded)
}

/// Bucket index of `hash` in a table of `capacity` buckets.
#[inline]
pub(crate) const fn bucket_index(hash: u32, capacity: usize) -> usize {
    hash as usize & (capacity - 1)
}

/// Resize threshold of a table: three quarters of its bucket count.
#[inline]
pub(crate) const fn threshold_for(capacity: usize) -> usize {
    (capacity >> 1) + (capacity >> 2)
}

/// Bucket count requested for `capacity`: zero stays on the placeholder,
/// anything else is clamped and rounded up to a power of two.
pub(crate) fn table_capacity(capacity: usize) -> usize {
    if capacity == 0 {
        PLACEHOLDER_CAPACITY
    } else if capacity < MINIMUM_CAPACITY {
        MINIMUM_CAPACITY
    } else if capacity > MAXIMUM_CAPACITY {
        MAXIMUM_CAPACITY
    } else {
        capacity.next_power_of_two()
    }
}

/// Capacity that holds `mappings` entries with room to grow: one and a
/// half times the count, capped at [`MAXIMUM_CAPACITY`].
pub(crate) fn capacity_for_mappings(mappings: usize) -> usize {
    mappings
        .saturating_add(mappings >> 1)
        .min(MAXIMUM_CAPACITY)
}
