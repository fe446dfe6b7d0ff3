//! A synchronized hash table.
//!
//! [`Hashtable`] wraps the bucket engine of [`HashMap`] in a
//! [`parking_lot::Mutex`]. Every method takes the lock once, so each call is
//! atomic with respect to every other call on the same table. Reads hand
//! out clones, since a reference into the table cannot outlive the lock.
//!
//! There is no null key: the null-key methods of [`HashMap`] are not
//! exposed here.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

use super::cursor::HashCursor;
use super::hashmap::HashMap;
use super::spread::DefaultHashBuilder;
use crate::error::{CollectionError, Result};

/// A hash map that can be shared between threads.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use arbortable::hash::Hashtable;
///
/// let table = Arc::new(Hashtable::new());
/// let workers: Vec<_> = (0..4)
///     .map(|worker| {
///         let table = Arc::clone(&table);
///         thread::spawn(move || {
///             for key in 0..100 {
///                 table.insert(worker * 100 + key, worker);
///             }
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
/// assert_eq!(table.len(), 400);
/// assert_eq!(table.get(&250), Some(2));
/// ```
pub struct Hashtable<K, V, S = DefaultHashBuilder> {
    inner: Mutex<HashMap<K, V, S>>,
}

impl<K, V> Hashtable<K, V, DefaultHashBuilder> {
    /// Creates an empty table on the placeholder bucket array.
    #[must_use]
    pub fn new() -> Self {
        Self::from_map(HashMap::new())
    }

    /// Creates an empty table with room for `capacity` buckets.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_map(HashMap::with_capacity(capacity))
    }

    /// Creates an empty table with room for `capacity` buckets.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidArgument`](crate::CollectionError::InvalidArgument)
    /// if `load_factor` is not a positive number.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        HashMap::with_capacity_and_load_factor(capacity, load_factor).map(Self::from_map)
    }
}

impl<K, V, S> Hashtable<K, V, S> {
    /// Creates an empty table that hashes keys with `hash_builder`.
    #[must_use]
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::from_map(HashMap::with_hasher(hash_builder))
    }

    /// Wraps `map`. Its null-key entry, if any, is dropped.
    #[must_use]
    pub fn from_map(mut map: HashMap<K, V, S>) -> Self {
        map.remove_null_key();
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Unwraps the table.
    pub fn into_inner(self) -> HashMap<K, V, S> {
        self.inner.into_inner()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Runs `function` with shared access to the underlying map, holding the
    /// lock for the whole call.
    ///
    /// # Deadlocks
    ///
    /// The lock is not reentrant. `function` must not call any method of
    /// this table, or the calling thread deadlocks.
    pub fn read<R>(&self, function: impl FnOnce(&HashMap<K, V, S>) -> R) -> R {
        function(&self.inner.lock())
    }

    /// Returns a fail-fast cursor over the table.
    ///
    /// The cursor takes the lock for each step and reports a change made by
    /// any other caller between two steps as
    /// [`CollectionError::ConcurrentModification`](crate::CollectionError::ConcurrentModification).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::Hashtable;
    ///
    /// let table: Hashtable<i32, i32> = (0..4).map(|key| (key, key)).collect();
    /// let mut cursor = table.cursor();
    /// cursor.next().unwrap().unwrap();
    /// table.insert(10, 10);
    /// assert!(cursor.next().unwrap().is_err());
    /// ```
    pub fn cursor(&self) -> TableCursor<'_, K, V, S> {
        let cursor = self.inner.lock().cursor();
        TableCursor {
            table: self,
            cursor,
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Hashtable<K, V, S> {
    /// `true` if `key` is mapped.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Maps `key` to `value`, returning the value it replaced.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().insert(key, value)
    }

    /// Unmaps `key` and returns its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Inserts every entry under one lock, pre-sizing the table first.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.lock().put_all(entries);
    }

    /// Applies `function` to the value of `key` under the lock.
    ///
    /// # Deadlocks
    ///
    /// The lock is not reentrant. `function` must not call any method of
    /// this table, or the calling thread deadlocks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::hash::Hashtable;
    ///
    /// let table = Hashtable::new();
    /// table.insert("visits", 1);
    /// // Read what the closure needs before calling `update`.
    /// let bonus = table.get(&"bonus").unwrap_or(10);
    /// let total = table.update(&"visits", |value| {
    ///     *value += bonus;
    ///     *value
    /// });
    /// assert_eq!(total, Some(11));
    /// ```
    pub fn update<R>(&self, key: &K, function: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.inner.lock().get_mut(key).map(function)
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> Hashtable<K, V, S> {
    /// Returns a clone of the value for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }
}

impl<K, V: PartialEq, S> Hashtable<K, V, S> {
    /// `true` if some entry holds `value`.
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner.lock().contains_value(value)
    }
}

impl<K: Clone, V: Clone, S> Hashtable<K, V, S> {
    /// Snapshot of the keys, taken under one lock.
    ///
    /// The snapshot is not fail-fast; later changes do not affect it.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys().flatten().cloned().collect()
    }

    /// Snapshot of the values, taken under one lock.
    pub fn elements(&self) -> Vec<V> {
        self.inner.lock().values().cloned().collect()
    }

    /// Snapshot of the entries, taken under one lock.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.inner
            .lock()
            .iter()
            .filter_map(|(key, value)| Some((key?.clone(), value.clone())))
            .collect()
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// A fail-fast cursor over a [`Hashtable`] that locks the table per step.
///
/// Yields clones of the entries it walks over.
pub struct TableCursor<'a, K, V, S = DefaultHashBuilder> {
    table: &'a Hashtable<K, V, S>,
    cursor: HashCursor,
}

impl<K, V, S> TableCursor<'_, K, V, S> {
    /// Removes the entry returned by the latest call to `next`.
    ///
    /// # Errors
    ///
    /// As [`HashCursor::remove`].
    pub fn remove(&mut self) -> Result<(K, V)> {
        let mut map = self.table.inner.lock();
        match self.cursor.remove(&mut *map)? {
            (Some(key), value) => Ok((key, value)),
            (None, _) => Err(CollectionError::IllegalState {
                operation: "TableCursor::remove",
                reason: "a hashtable has no null key",
            }),
        }
    }
}

/// Yields `Some(Err(_))` if another caller changed the table structurally
/// since the previous step.
impl<K: Clone, V: Clone, S> Iterator for TableCursor<'_, K, V, S> {
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.table.inner.lock();
        loop {
            match self.cursor.next(&*map) {
                Ok(Some((Some(key), value))) => return Some(Ok((key.clone(), value.clone()))),
                Ok(Some((None, _))) => {}
                Ok(None) => return None,
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, S: Default> Default for Hashtable<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for Hashtable<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Mutex::new(self.inner.lock().clone()),
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for Hashtable<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for Hashtable<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.get_mut().put_all(iter);
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for Hashtable<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        // Lock in address order so that `a == b` and `b == a` cannot deadlock.
        if std::ptr::from_ref(self) < std::ptr::from_ref(other) {
            let left = self.inner.lock();
            let right = other.inner.lock();
            *left == *right
        } else {
            let right = other.inner.lock();
            let left = self.inner.lock();
            *left == *right
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Hashtable<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.lock();
        formatter
            .debug_map()
            .entries(map.iter().filter_map(|(key, value)| Some((key?, value))))
            .finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for Hashtable<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner.lock(), formatter)
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, S> serde::Serialize for Hashtable<K, V, S>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<T>(&self, serializer: T) -> std::result::Result<T::Ok, T::Error>
    where
        T: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let map = self.inner.lock();
        let mut entries = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map.iter() {
            if let Some(key) = key {
                entries.serialize_entry(key, value)?;
            }
        }
        entries.end()
    }
}

#[cfg(feature = "serde")]
struct HashtableVisitor<K, V, S> {
    marker: std::marker::PhantomData<fn() -> Hashtable<K, V, S>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::de::Visitor<'de> for HashtableVisitor<K, V, S>
where
    K: serde::Deserialize<'de> + Hash + Eq,
    V: serde::Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = Hashtable<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = HashMap::default();
        map.ensure_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(Hashtable::from_map(map))
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::Deserialize<'de> for Hashtable<K, V, S>
where
    K: serde::Deserialize<'de> + Hash + Eq,
    V: serde::Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(HashtableVisitor {
            marker: std::marker::PhantomData,
        })
    }
}
