//! Mutable hash map with chained buckets and a null-key slot.
//!
//! This module provides [`HashMap`], a hash map over a power-of-two bucket
//! table. Colliding keys share a singly linked chain; new keys are
//! prepended to their chain.
//!
//! # Overview
//!
//! - O(1) expected `get`, `insert`, `remove`
//! - O(1) `len` and `is_empty`
//! - capacity doubles once the entry count passes three quarters of the
//!   bucket count, and [`HashMap::put_all`] pre-sizes the table for bulk
//!   loads
//! - one extra slot holds the value of the null key, which iteration
//!   reports first
//!
//! # Examples
//!
//! ```rust
//! use arbortable::hash::HashMap;
//!
//! let mut map = HashMap::new();
//! map.insert("one", 1);
//! map.insert("two", 2);
//! map.insert_null_key(0);
//!
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(map.get_null_key(), Some(&0));
//! assert_eq!(map.len(), 3);
//! assert_eq!(map.iter().next(), Some((None, &0)));
//! ```
//!
//! # Internal Structure
//!
//! Keys are hashed once by the map's [`BuildHasher`] and the result is
//! spread so that its low bits depend on every bit of the primary hash. The
//! spread hash is cached in the entry: chain scans compare it before calling
//! `Eq`, and resizing never hashes a key again.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use super::cursor::{HashCursor, Position};
use super::spread::{DefaultHashBuilder, capacity_for_mappings, spread};
use super::table::{Entries, RawTable};
use super::view::{EntrySet, KeySet, Values};
use crate::error::{CollectionError, Result};

// =============================================================================
// HashMap Definition
// =============================================================================

/// A mutable hash map with separate chaining and a null-key slot.
///
/// Rust has no null reference, so the null key of a classic hash map gets
/// its own methods ([`HashMap::insert_null_key`] and friends), and iteration
/// items carry the key as `Option<&K>`, with `None` for the null key.
///
/// # Time Complexity
///
/// | Operation              | Complexity          |
/// |------------------------|---------------------|
/// | `new`                  | O(1)                |
/// | `get` / `contains_key` | O(1) expected       |
/// | `insert`               | O(1) amortized      |
/// | `remove`               | O(1) expected       |
/// | `contains_value`       | O(N)                |
/// | `iter`                 | O(N + capacity)     |
/// | `len`                  | O(1)                |
///
/// # Examples
///
/// ```rust
/// use arbortable::hash::HashMap;
///
/// let mut map = HashMap::with_capacity(4);
/// for key in [0, 4, 8] {
///     map.insert(key, key.to_string());
/// }
/// assert_eq!(map.capacity(), 4);
///
/// map.insert(1, "1".to_string());
/// assert_eq!(map.capacity(), 8);
/// assert_eq!(map.get(&8).map(String::as_str), Some("8"));
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: RawTable<K, V>,
    /// Value stored under the null key
    null_value: Option<V>,
    hash_builder: S,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map on the two-bucket placeholder table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::HashMap;
    ///
    /// let map: HashMap<String, i32> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map with room for `capacity` buckets.
    ///
    /// Zero keeps the placeholder table. Other values are raised to the
    /// four-bucket minimum, capped at `1 << 30`, and rounded up to a power
    /// of two.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Creates an empty map with room for `capacity` buckets.
    ///
    /// The load factor is validated but not used: the table always grows at
    /// three quarters of its bucket count.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidArgument`] if `load_factor` is not a
    /// positive number.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::HashMap;
    ///
    /// assert!(HashMap::<i32, i32>::with_capacity_and_load_factor(16, 0.5).is_ok());
    /// assert!(HashMap::<i32, i32>::with_capacity_and_load_factor(16, 0.0).is_err());
    /// assert!(HashMap::<i32, i32>::with_capacity_and_load_factor(16, f32::NAN).is_err());
    /// ```
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        if load_factor.is_nan() || load_factor <= 0.0 {
            return Err(CollectionError::invalid_argument(
                "HashMap::with_capacity_and_load_factor",
                format!("load factor must be positive, got {load_factor}"),
            ));
        }
        Ok(Self::with_capacity(capacity))
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map that hashes keys with `hash_builder`.
    #[inline]
    #[must_use]
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: RawTable::placeholder(),
            null_value: None,
            hash_builder,
        }
    }

    /// Creates an empty map with room for `capacity` buckets that hashes
    /// keys with `hash_builder`.
    #[inline]
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
            null_value: None,
            hash_builder,
        }
    }

    /// The map's hash builder.
    #[inline]
    pub const fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Number of entries, the null key included.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len() + usize::from(self.null_value.is_some())
    }

    /// `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of buckets. Always a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    #[inline]
    pub(crate) const fn modification_count(&self) -> u64 {
        self.table.modification_count()
    }

    #[inline]
    pub(crate) const fn identity(&self) -> u64 {
        self.table.identity()
    }

    /// Removes every entry, keeping the current capacity.
    ///
    /// Clearing a non-empty map counts as one structural modification.
    pub fn clear(&mut self) {
        tracing::trace!(entries = self.len(), "clearing hash map");
        if self.is_empty() {
            return;
        }
        self.table.clear();
        self.null_value = None;
        self.table.record_modification();
    }

    // =========================================================================
    // Null Key
    // =========================================================================

    /// Maps the null key to `value`, returning the value it replaced.
    ///
    /// Only adding the null key is structural; replacing its value is not.
    /// The null key counts towards the growth threshold of later insertions
    /// but never grows the table itself.
    pub fn insert_null_key(&mut self, value: V) -> Option<V> {
        let previous = self.null_value.replace(value);
        if previous.is_none() {
            self.table.set_outside(1);
            self.table.record_modification();
        }
        previous
    }

    /// The value of the null key.
    #[inline]
    pub const fn get_null_key(&self) -> Option<&V> {
        self.null_value.as_ref()
    }

    /// The value of the null key, mutably.
    #[inline]
    pub const fn get_null_key_mut(&mut self) -> Option<&mut V> {
        self.null_value.as_mut()
    }

    /// `true` if the null key is mapped.
    #[inline]
    pub const fn contains_null_key(&self) -> bool {
        self.null_value.is_some()
    }

    /// Unmaps the null key and returns its value.
    pub fn remove_null_key(&mut self) -> Option<V> {
        let previous = self.null_value.take();
        if previous.is_some() {
            self.table.set_outside(0);
            self.table.record_modification();
        }
        previous
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Returns an iterator over the entries: the null key first, then the
    /// buckets in index order and each chain from its head.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert('a', 1);
    /// map.insert_null_key(0);
    /// let mut entries = map.iter();
    /// assert_eq!(entries.next(), Some((None, &0)));
    /// assert_eq!(entries.next(), Some((Some(&'a'), &1)));
    /// assert_eq!(entries.next(), None);
    /// ```
    pub const fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            null_value: self.null_value.as_ref(),
            entries: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys; `None` is the null key.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = Option<&K>> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a fail-fast cursor positioned before the first entry.
    ///
    /// See [`HashCursor`] for the difference to [`HashMap::iter`].
    #[must_use]
    pub fn cursor(&self) -> HashCursor {
        HashCursor::new(
            self.first_position(),
            self.identity(),
            self.modification_count(),
        )
    }

    /// Returns a write-through view of the keys.
    pub const fn key_set(&mut self) -> KeySet<'_, K, V, S> {
        KeySet::new(self)
    }

    /// Returns a write-through view of the values.
    pub const fn values_view(&mut self) -> Values<'_, K, V, S> {
        Values::new(self)
    }

    /// Returns a write-through view of the entries.
    pub const fn entry_set(&mut self) -> EntrySet<'_, K, V, S> {
        EntrySet::new(self)
    }

    pub(crate) fn first_position(&self) -> Option<Position> {
        if self.null_value.is_some() {
            Some(Position::NullKey)
        } else {
            self.table.first().map(Position::Entry)
        }
    }

    pub(crate) fn following(&self, position: Position) -> Option<Position> {
        let next = match position {
            Position::NullKey => self.table.first(),
            Position::Entry(id) => self.table.successor(id),
        };
        next.map(Position::Entry)
    }

    /// The entry at `position`, or `None` if it is gone.
    pub(crate) fn position_entry(&self, position: Position) -> Option<(Option<&K>, &V)> {
        match position {
            Position::NullKey => self.null_value.as_ref().map(|value| (None, value)),
            Position::Entry(id) => self
                .table
                .get(id)
                .map(|entry| (Some(&entry.key), &entry.value)),
        }
    }

    pub(crate) fn remove_position(&mut self, position: Position) -> Option<(Option<K>, V)> {
        match position {
            Position::NullKey => self.remove_null_key().map(|value| (None, value)),
            Position::Entry(id) => {
                self.table.get(id)?;
                let (key, value) = self.table.remove_id(id);
                Some((Some(key), value))
            }
        }
    }
}

impl<K, V: PartialEq, S> HashMap<K, V, S> {
    /// `true` if some entry, the null key included, holds `value`.
    ///
    /// # Complexity
    ///
    /// O(N + capacity): every bucket is scanned.
    pub fn contains_value(&self, value: &V) -> bool {
        self.values().any(|candidate| candidate == value)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMap<K, V, S> {
    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u32 {
        spread(&self.hash_builder, key)
    }

    /// Returns the value for `key`.
    ///
    /// The key may be any borrowed form of `K`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.table.find(self.hash_of(key), key)?;
        Some(&self.table[id].value)
    }

    /// Returns the value for `key`, mutably.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.table.find(self.hash_of(key), key)?;
        Some(&mut self.table[id].value)
    }

    /// `true` if `key` is mapped.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(self.hash_of(key), key).is_some()
    }

    /// Maps `key` to `value`, returning the value it replaced.
    ///
    /// Replacing a value is not a structural modification. A new key may
    /// double the table before it is linked in.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_of(&key);
        self.table.insert(hash, key, value)
    }

    /// Unmaps `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Unmaps `key` and returns the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table.remove(hash, key)
    }

    /// Inserts every entry, growing the table once up front so that the
    /// reported number of entries fits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.put_all((0..100).map(|key| (key, key)));
    /// assert_eq!(map.len(), 100);
    /// assert_eq!(map.capacity(), 256);
    /// ```
    pub fn put_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = entries.into_iter();
        self.ensure_capacity(entries.size_hint().0);
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Grows the table so that `mappings` entries fit without another
    /// resize. Never shrinks it.
    pub fn ensure_capacity(&mut self, mappings: usize) {
        self.table.ensure_capacity(mappings);
    }

    /// A copy of `other` on a table sized for its entries.
    #[must_use]
    pub fn copy_of(other: &Self) -> Self
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let capacity = capacity_for_mappings(other.len());
        let mut copy = Self::with_capacity_and_hasher(capacity, other.hash_builder.clone());
        for (key, value) in other {
            match key {
                Some(key) => {
                    copy.insert(key.clone(), value.clone());
                }
                None => {
                    copy.insert_null_key(value.clone());
                }
            }
        }
        copy
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> HashMap<K, V, S> {
    /// `true` if `key` maps to `value`.
    pub fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.get(key) == Some(value)
    }

    /// Unmaps `key` only while it still maps to `value`.
    pub fn remove_entry_if_value(&mut self, key: &K, value: &V) -> bool {
        if !self.contains_entry(key, value) {
            return false;
        }
        self.remove(key).is_some()
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A borrowing iterator over the entries of a [`HashMap`].
pub struct Iter<'a, K, V> {
    null_value: Option<&'a V>,
    entries: Entries<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Option<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.null_value.take() {
            return Some((None, value));
        }
        self.entries.next().map(|(key, value)| (Some(key), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len() + usize::from(self.null_value.is_some());
        (remaining, Some(remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

/// An owning iterator over the entries of a [`HashMap`], null key first.
pub struct IntoIter<K, V> {
    null_value: Option<V>,
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (Option<K>, V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.null_value.take() {
            return Some((None, value));
        }
        self.entries.next().map(|(key, value)| (Some(key), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len() + usize::from(self.null_value.is_some());
        (remaining, Some(remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, S: Default> Default for HashMap<K, V, S> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for HashMap<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.put_all(iter);
        map
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for HashMap<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (Option<K>, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            null_value: self.null_value,
            entries: self.table.into_entries().into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (Option<&'a K>, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Two maps are equal when they hold the same mappings, whatever their
/// capacity, hash builder or iteration order.
impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for HashMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() || self.null_value != other.null_value {
            return false;
        }
        self.table
            .iter()
            .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for HashMap<K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for HashMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            match key {
                Some(key) => write!(formatter, "{key}: {value}")?,
                None => write!(formatter, "null: {value}")?,
            }
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, S> serde::Serialize for HashMap<K, V, S>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<T>(&self, serializer: T) -> std::result::Result<T::Ok, T::Error>
    where
        T: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for entry in self {
            sequence.serialize_element(&entry)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
struct HashMapVisitor<K, V, S> {
    marker: std::marker::PhantomData<fn() -> HashMap<K, V, S>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::de::Visitor<'de> for HashMapVisitor<K, V, S>
where
    K: serde::Deserialize<'de> + Hash + Eq,
    V: serde::Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = HashMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of [key or null, value] pairs")
    }

    fn visit_seq<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut map = HashMap::default();
        // Cap the hint so a hostile length cannot force a huge table.
        map.ensure_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = access.next_element::<(Option<K>, V)>()? {
            match key {
                Some(key) => map.insert(key, value),
                None => map.insert_null_key(value),
            };
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::Deserialize<'de> for HashMap<K, V, S>
where
    K: serde::Deserialize<'de> + Hash + Eq,
    V: serde::Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(HashMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Invariant Checks
// =============================================================================

#[cfg(test)]
impl<K, V, S> HashMap<K, V, S> {
    /// Panics unless every entry sits in the bucket its hash selects.
    pub(crate) fn assert_invariants(&self) {
        self.table.assert_invariants();
    }
}

// =============================================================================
// Tests
// =============================================================================
