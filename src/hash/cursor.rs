//! Fail-fast cursors over a [`HashMap`] and its views.
//!
//! A [`HashCursor`] walks the null-key slot first, then the buckets in index
//! order and each chain from its head. Like the tree cursor it keeps no
//! borrow of the map between steps and checks, on every step, that it is
//! looking at the map that created it and that the map's modification count
//! has not moved.

use super::hashmap::HashMap;
use super::table::EntryId;
use crate::error::{CollectionError, Result};

/// Anything that gives access to a backing [`HashMap`]: the map itself and
/// its key, value and entry views.
pub trait HashAccess {
    /// Key type of the backing map.
    type Key;
    /// Value type of the backing map.
    type Value;
    /// Hash builder of the backing map.
    type Hasher;

    /// Shared access to the backing map.
    fn hash_map(&self) -> &HashMap<Self::Key, Self::Value, Self::Hasher>;

    /// Exclusive access to the backing map.
    fn hash_map_mut(&mut self) -> &mut HashMap<Self::Key, Self::Value, Self::Hasher>;
}

impl<K, V, S> HashAccess for HashMap<K, V, S> {
    type Key = K;
    type Value = V;
    type Hasher = S;

    fn hash_map(&self) -> &Self {
        self
    }

    fn hash_map_mut(&mut self) -> &mut Self {
        self
    }
}

/// A place in the iteration order of a [`HashMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    NullKey,
    Entry(EntryId),
}

/// A detached, fail-fast position in a [`HashMap`].
///
/// Items carry `Option<&K>`; `None` stands for the null key.
///
/// # Examples
///
/// ```rust
/// use arbortable::hash::HashMap;
///
/// let mut map: HashMap<i32, i32> = (0..10).map(|key| (key, key * key)).collect();
/// let mut cursor = map.cursor();
/// while let Some((_, value)) = cursor.next(&map).unwrap() {
///     if value % 2 == 1 {
///         cursor.remove(&mut map).unwrap();
///     }
/// }
/// assert_eq!(map.len(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct HashCursor {
    next: Option<Position>,
    last: Option<Position>,
    /// Identity of the map that created the cursor
    owner: u64,
    expected_modifications: u64,
}

impl HashCursor {
    pub(crate) const fn new(
        next: Option<Position>,
        owner: u64,
        expected_modifications: u64,
    ) -> Self {
        Self {
            next,
            last: None,
            owner,
            expected_modifications,
        }
    }

    /// `true` if the next call to [`HashCursor::next`] would yield an entry,
    /// assuming the map has not been modified.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn check<K, V, S>(&self, operation: &'static str, map: &HashMap<K, V, S>) -> Result<()> {
        if map.identity() != self.owner {
            return Err(CollectionError::IllegalState {
                operation,
                reason: "the cursor belongs to a different map",
            });
        }
        let actual = map.modification_count();
        if actual == self.expected_modifications {
            return Ok(());
        }
        tracing::debug!(
            expected = self.expected_modifications,
            actual,
            "hash cursor observed a concurrent modification"
        );
        Err(CollectionError::ConcurrentModification {
            expected: self.expected_modifications,
            actual,
        })
    }

    /// Advances and returns the entry the cursor stepped over.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::ConcurrentModification`] if the map changed
    ///   structurally since the cursor last looked at it.
    /// - [`CollectionError::IllegalState`] if `map` is not backed by the map
    ///   that created the cursor.
    pub fn next<'m, M>(&mut self, map: &'m M) -> Result<Option<(Option<&'m M::Key>, &'m M::Value)>>
    where
        M: HashAccess,
    {
        let map = map.hash_map();
        self.check("HashCursor::next", map)?;
        let Some(current) = self.next else {
            return Ok(None);
        };
        let Some(entry) = map.position_entry(current) else {
            self.next = None;
            return Ok(None);
        };
        self.next = map.following(current);
        self.last = Some(current);
        Ok(Some(entry))
    }

    /// Removes the entry returned by the latest [`HashCursor::next`].
    ///
    /// # Errors
    ///
    /// - [`CollectionError::IllegalState`] if `next` has not returned an
    ///   entry since the cursor was created or last removed one, or if `map`
    ///   is not backed by the map that created the cursor.
    /// - [`CollectionError::ConcurrentModification`] if the map changed
    ///   structurally behind the cursor.
    pub fn remove<M>(&mut self, map: &mut M) -> Result<(Option<M::Key>, M::Value)>
    where
        M: HashAccess,
    {
        const OPERATION: &str = "HashCursor::remove";
        let map = map.hash_map_mut();
        let Some(last) = self.last else {
            return Err(CollectionError::IllegalState {
                operation: OPERATION,
                reason: "no entry has been returned since the cursor was created or last removed one",
            });
        };
        self.check(OPERATION, map)?;
        self.last = None;
        let removed = map
            .remove_position(last)
            .ok_or(CollectionError::IllegalState {
                operation: OPERATION,
                reason: "the entry is no longer in the map",
            })?;
        self.expected_modifications = map.modification_count();
        Ok(removed)
    }
}
