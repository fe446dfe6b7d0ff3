//! Key, value and entry views of a [`HashMap`].
//!
//! Each view borrows the map mutably and writes removals through to it.

use std::hash::{BuildHasher, Hash};

use super::cursor::{HashAccess, HashCursor};
use super::hashmap::HashMap;
use super::spread::DefaultHashBuilder;

macro_rules! hash_access {
    ($view:ident) => {
        impl<K, V, S> HashAccess for $view<'_, K, V, S> {
            type Key = K;
            type Value = V;
            type Hasher = S;

            fn hash_map(&self) -> &HashMap<K, V, S> {
                &*self.map
            }

            fn hash_map_mut(&mut self) -> &mut HashMap<K, V, S> {
                &mut *self.map
            }
        }

        impl<K, V, S> $view<'_, K, V, S> {
            /// Number of entries behind the view.
            pub fn len(&self) -> usize {
                self.map.len()
            }

            /// `true` if the backing map is empty.
            pub fn is_empty(&self) -> bool {
                self.map.is_empty()
            }

            /// Removes every entry of the backing map.
            pub fn clear(&mut self) {
                self.map.clear();
            }

            /// Fail-fast cursor over the backing map.
            #[must_use]
            pub fn cursor(&self) -> HashCursor {
                self.map.cursor()
            }
        }
    };
}

// =============================================================================
// KeySet
// =============================================================================

/// The keys of a [`HashMap`]; `None` stands for the null key.
///
/// # Examples
///
/// ```rust
/// use arbortable::hash::HashMap;
///
/// let mut map: HashMap<_, _> = [(1, 'a'), (2, 'b')].into_iter().collect();
/// let mut keys = map.key_set();
/// assert!(keys.contains(&1));
/// assert!(keys.remove(&1));
/// assert_eq!(keys.len(), 1);
/// assert_eq!(map.get(&1), None);
/// ```
pub struct KeySet<'a, K, V, S = DefaultHashBuilder> {
    map: &'a mut HashMap<K, V, S>,
}

impl<'a, K, V, S> KeySet<'a, K, V, S> {
    pub(crate) const fn new(map: &'a mut HashMap<K, V, S>) -> Self {
        Self { map }
    }

    /// Borrowing iterator over the keys.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<&K>> {
        self.map.keys()
    }

    /// `true` if the null key is mapped.
    pub const fn contains_null(&self) -> bool {
        self.map.contains_null_key()
    }

    /// Unmaps the null key.
    pub fn remove_null(&mut self) -> bool {
        self.map.remove_null_key().is_some()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> KeySet<'_, K, V, S> {
    /// `true` if `key` is mapped.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Unmaps `key`.
    pub fn remove(&mut self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }
}

hash_access!(KeySet);

// =============================================================================
// Values
// =============================================================================

/// The values of a [`HashMap`], in iteration order.
pub struct Values<'a, K, V, S = DefaultHashBuilder> {
    map: &'a mut HashMap<K, V, S>,
}

impl<'a, K, V, S> Values<'a, K, V, S> {
    pub(crate) const fn new(map: &'a mut HashMap<K, V, S>) -> Self {
        Self { map }
    }

    /// Borrowing iterator over the values.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &V> {
        self.map.values()
    }
}

impl<K, V: PartialEq, S> Values<'_, K, V, S> {
    /// `true` if some entry holds `value`.
    pub fn contains(&self, value: &V) -> bool {
        self.map.contains_value(value)
    }

    /// Removes the first entry in iteration order that holds `value`.
    pub fn remove(&mut self, value: &V) -> bool {
        let mut position = self.map.first_position();
        while let Some(current) = position {
            let matched = self
                .map
                .position_entry(current)
                .is_some_and(|(_, candidate)| candidate == value);
            if matched {
                return self.map.remove_position(current).is_some();
            }
            position = self.map.following(current);
        }
        false
    }
}

hash_access!(Values);

// =============================================================================
// EntrySet
// =============================================================================

/// The entries of a [`HashMap`], in iteration order.
pub struct EntrySet<'a, K, V, S = DefaultHashBuilder> {
    map: &'a mut HashMap<K, V, S>,
}

impl<'a, K, V, S> EntrySet<'a, K, V, S> {
    pub(crate) const fn new(map: &'a mut HashMap<K, V, S>) -> Self {
        Self { map }
    }

    /// Borrowing iterator over the entries.
    pub fn iter(&self) -> super::Iter<'_, K, V> {
        self.map.iter()
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> EntrySet<'_, K, V, S> {
    /// `true` if `key` maps to `value`; `None` is the null key.
    pub fn contains(&self, key: Option<&K>, value: &V) -> bool {
        match key {
            Some(key) => self.map.contains_entry(key, value),
            None => self.map.get_null_key() == Some(value),
        }
    }

    /// Unmaps `key` only while it still maps to `value`.
    pub fn remove(&mut self, key: Option<&K>, value: &V) -> bool {
        match key {
            Some(key) => self.map.remove_entry_if_value(key, value),
            None => self.contains(None, value) && self.map.remove_null_key().is_some(),
        }
    }
}

hash_access!(EntrySet);
