//! Key, value and entry views of a [`TreeMap`] or [`SubMap`].
//!
//! Each view wraps a [`SubMap`], so it sees exactly the entries of the
//! window it came from. Removals write through to the backing map.

use super::bounded::SubMap;
use super::comparator::{Comparator, NaturalOrder};
use super::cursor::{TreeAccess, TreeCursor};
use super::treemap::TreeMap;
use crate::error::Result;

macro_rules! tree_access {
    ($view:ident) => {
        impl<K, V, C: Comparator<K>> TreeAccess for $view<'_, K, V, C> {
            type Key = K;
            type Value = V;
            type Order = C;

            fn tree(&self) -> &TreeMap<K, V, C> {
                self.inner.tree()
            }

            fn tree_mut(&mut self) -> &mut TreeMap<K, V, C> {
                self.inner.tree_mut()
            }
        }
    };
}

// =============================================================================
// KeySet
// =============================================================================

/// The keys of a map or window, in view order.
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::TreeMap;
///
/// let mut map: TreeMap<_, _> = [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();
/// let mut keys = map.descending_key_set();
/// assert_eq!(keys.iter().unwrap().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
/// assert!(keys.remove(&2).unwrap());
/// assert_eq!(map.len(), 2);
/// ```
pub struct KeySet<'a, K, V, C = NaturalOrder> {
    inner: SubMap<'a, K, V, C>,
}

impl<'a, K, V, C> KeySet<'a, K, V, C> {
    pub(crate) const fn new(inner: SubMap<'a, K, V, C>) -> Self {
        Self { inner }
    }
}

impl<K, V, C: Comparator<K>> KeySet<'_, K, V, C> {
    /// Number of keys in the view.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`](crate::CollectionError::TypeMismatch)
    /// if a bound cannot be compared.
    pub fn len(&self) -> Result<usize> {
        self.inner.len()
    }

    /// `true` if the view holds no keys.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn is_empty(&self) -> Result<bool> {
        self.inner.is_empty()
    }

    /// `true` if `key` is in the view.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn contains(&self, key: &K) -> Result<bool> {
        self.inner.contains_key(key)
    }

    /// First key in view order.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn first(&self) -> Result<Option<&K>> {
        self.inner.first_key()
    }

    /// Last key in view order.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn last(&self) -> Result<Option<&K>> {
        self.inner.last_key()
    }

    /// Removes `key` and its value from the backing map.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        Ok(self.inner.remove_entry(key)?.is_some())
    }

    /// Borrowing iterator over the keys.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn iter(&self) -> Result<impl DoubleEndedIterator<Item = &K>> {
        self.inner.keys()
    }
}

impl<K: Clone, V, C: Comparator<K>> KeySet<'_, K, V, C> {
    /// Removes every key of the view from the backing map.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }

    /// Fail-fast cursor over the keys.
    ///
    /// # Errors
    ///
    /// As [`KeySet::len`].
    pub fn cursor(&self) -> Result<TreeCursor<K>> {
        self.inner.cursor()
    }
}

tree_access!(KeySet);

// =============================================================================
// Values
// =============================================================================

/// The values of a map or window, in key order of the view.
pub struct Values<'a, K, V, C = NaturalOrder> {
    inner: SubMap<'a, K, V, C>,
}

impl<'a, K, V, C> Values<'a, K, V, C> {
    pub(crate) const fn new(inner: SubMap<'a, K, V, C>) -> Self {
        Self { inner }
    }
}

impl<K, V, C: Comparator<K>> Values<'_, K, V, C> {
    /// Number of values in the view.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`](crate::CollectionError::TypeMismatch)
    /// if a bound cannot be compared.
    pub fn len(&self) -> Result<usize> {
        self.inner.len()
    }

    /// `true` if the view holds no values.
    ///
    /// # Errors
    ///
    /// As [`Values::len`].
    pub fn is_empty(&self) -> Result<bool> {
        self.inner.is_empty()
    }

    /// Borrowing iterator over the values.
    ///
    /// # Errors
    ///
    /// As [`Values::len`].
    pub fn iter(&self) -> Result<impl DoubleEndedIterator<Item = &V>> {
        self.inner.values()
    }
}

impl<K, V: PartialEq, C: Comparator<K>> Values<'_, K, V, C> {
    /// `true` if some entry of the view holds `value`.
    ///
    /// # Errors
    ///
    /// As [`Values::len`].
    pub fn contains(&self, value: &V) -> Result<bool> {
        Ok(self.iter()?.any(|candidate| candidate == value))
    }
}

impl<K: Clone, V, C: Comparator<K>> Values<'_, K, V, C> {
    /// Removes every entry of the view from the backing map.
    ///
    /// # Errors
    ///
    /// As [`Values::len`].
    pub fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }

    /// Fail-fast cursor over the entries behind the values.
    ///
    /// # Errors
    ///
    /// As [`Values::len`].
    pub fn cursor(&self) -> Result<TreeCursor<K>> {
        self.inner.cursor()
    }
}

impl<K: Clone, V: PartialEq, C: Comparator<K>> Values<'_, K, V, C> {
    /// Removes the first entry in view order whose value equals `value`.
    ///
    /// # Errors
    ///
    /// As [`Values::len`].
    pub fn remove(&mut self, value: &V) -> Result<bool> {
        let mut cursor = self.inner.cursor()?;
        loop {
            let matched = match cursor.next(&self.inner)? {
                Some((_, candidate)) => candidate == value,
                None => return Ok(false),
            };
            if matched {
                cursor.remove(&mut self.inner)?;
                return Ok(true);
            }
        }
    }
}

tree_access!(Values);

// =============================================================================
// EntrySet
// =============================================================================

/// The entries of a map or window, in view order.
pub struct EntrySet<'a, K, V, C = NaturalOrder> {
    inner: SubMap<'a, K, V, C>,
}

impl<'a, K, V, C> EntrySet<'a, K, V, C> {
    pub(crate) const fn new(inner: SubMap<'a, K, V, C>) -> Self {
        Self { inner }
    }
}

impl<K, V, C: Comparator<K>> EntrySet<'_, K, V, C> {
    /// Number of entries in the view.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`](crate::CollectionError::TypeMismatch)
    /// if a bound cannot be compared.
    pub fn len(&self) -> Result<usize> {
        self.inner.len()
    }

    /// `true` if the view holds no entries.
    ///
    /// # Errors
    ///
    /// As [`EntrySet::len`].
    pub fn is_empty(&self) -> Result<bool> {
        self.inner.is_empty()
    }

    /// Borrowing iterator over the entries.
    ///
    /// # Errors
    ///
    /// As [`EntrySet::len`].
    pub fn iter(&self) -> Result<super::Iter<'_, K, V>> {
        self.inner.iter()
    }
}

impl<K, V: PartialEq, C: Comparator<K>> EntrySet<'_, K, V, C> {
    /// `true` if the view maps `key` to `value`.
    ///
    /// # Errors
    ///
    /// As [`EntrySet::len`].
    pub fn contains(&self, key: &K, value: &V) -> Result<bool> {
        Ok(self.inner.get(key)? == Some(value))
    }

    /// Removes `key` only while it still maps to `value`.
    ///
    /// # Errors
    ///
    /// As [`EntrySet::len`].
    pub fn remove(&mut self, key: &K, value: &V) -> Result<bool> {
        if !self.contains(key, value)? {
            return Ok(false);
        }
        Ok(self.inner.remove_entry(key)?.is_some())
    }
}

impl<K: Clone, V, C: Comparator<K>> EntrySet<'_, K, V, C> {
    /// Removes every entry of the view from the backing map.
    ///
    /// # Errors
    ///
    /// As [`EntrySet::len`].
    pub fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }

    /// Fail-fast cursor over the entries.
    ///
    /// # Errors
    ///
    /// As [`EntrySet::len`].
    pub fn cursor(&self) -> Result<TreeCursor<K>> {
        self.inner.cursor()
    }
}

tree_access!(EntrySet);
