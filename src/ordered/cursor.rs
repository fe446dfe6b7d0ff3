//! Fail-fast cursors over a [`TreeMap`] and its views.
//!
//! A [`TreeCursor`] holds no borrow of the map between steps. Every step
//! takes the map (or a view of it) again and first checks the map's
//! modification count against the count the cursor last saw, so a
//! structural change made behind the cursor's back is reported as
//! [`CollectionError::ConcurrentModification`] instead of yielding entries
//! from a tree that has moved on. Removal through the cursor itself is the
//! one structural change it tolerates. A cursor also remembers which map
//! created it and rejects any other map with
//! [`CollectionError::IllegalState`].

use std::ops::Bound;

use super::bounded::{above, below};
use super::comparator::Comparator;
use super::node::NodeId;
use super::treemap::TreeMap;
use crate::error::{CollectionError, Result};

/// Anything that gives access to a backing [`TreeMap`]: the map itself and
/// every view over it.
pub trait TreeAccess {
    /// Key type of the backing map.
    type Key;
    /// Value type of the backing map.
    type Value;
    /// Comparator of the backing map.
    type Order: Comparator<Self::Key>;

    /// Shared access to the backing map.
    fn tree(&self) -> &TreeMap<Self::Key, Self::Value, Self::Order>;

    /// Exclusive access to the backing map.
    fn tree_mut(&mut self) -> &mut TreeMap<Self::Key, Self::Value, Self::Order>;
}

impl<K, V, C: Comparator<K>> TreeAccess for TreeMap<K, V, C> {
    type Key = K;
    type Value = V;
    type Order = C;

    fn tree(&self) -> &Self {
        self
    }

    fn tree_mut(&mut self) -> &mut Self {
        self
    }
}

/// Which way a cursor walks in key order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

/// A detached, fail-fast position in a [`TreeMap`].
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::TreeMap;
/// use arbortable::CollectionError;
///
/// let mut map: TreeMap<_, _> = [(1, 'a'), (2, 'b')].into_iter().collect();
/// let mut cursor = map.cursor();
/// assert_eq!(cursor.next(&map).unwrap(), Some((&1, &'a')));
///
/// map.insert(3, 'c').unwrap();
/// assert!(matches!(
///     cursor.next(&map),
///     Err(CollectionError::ConcurrentModification { .. })
/// ));
/// ```
#[derive(Clone, Debug)]
pub struct TreeCursor<K> {
    next: Option<NodeId>,
    last: Option<NodeId>,
    /// Identity of the map that created the cursor
    owner: u64,
    expected_modifications: u64,
    direction: Direction,
    /// Bound the walk must not cross, from the view the cursor came from
    stop: Bound<K>,
}

impl<K> TreeCursor<K> {
    pub(crate) const fn new(
        next: Option<NodeId>,
        owner: u64,
        expected_modifications: u64,
        direction: Direction,
        stop: Bound<K>,
    ) -> Self {
        Self {
            next,
            last: None,
            owner,
            expected_modifications,
            direction,
            stop,
        }
    }

    /// `true` if the next call to [`TreeCursor::next`] would yield an entry,
    /// assuming the map has not been modified.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn check<V, C>(&self, operation: &'static str, tree: &TreeMap<K, V, C>) -> Result<()> {
        if tree.identity() != self.owner {
            return Err(CollectionError::IllegalState {
                operation,
                reason: "the cursor belongs to a different map",
            });
        }
        let actual = tree.modification_count();
        if actual == self.expected_modifications {
            return Ok(());
        }
        tracing::debug!(
            expected = self.expected_modifications,
            actual,
            "tree cursor observed a concurrent modification"
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
    /// - [`CollectionError::TypeMismatch`] if the view bound cannot be
    ///   compared with the next key.
    pub fn next<'m, M>(&mut self, map: &'m M) -> Result<Option<(&'m K, &'m M::Value)>>
    where
        M: TreeAccess<Key = K>,
    {
        const OPERATION: &str = "TreeCursor::next";
        let tree = map.tree();
        self.check(OPERATION, tree)?;
        let Some(current) = self.next else {
            return Ok(None);
        };
        let arena = tree.arena();
        if arena.get(current).is_none() {
            self.next = None;
            return Ok(None);
        }

        let following = match self.direction {
            Direction::Forward => arena.next(current),
            Direction::Backward => arena.prev(current),
        };
        self.next = match following {
            Some(candidate) => {
                let (key, _) = tree.entry(candidate);
                let beyond = match self.direction {
                    Direction::Forward => above(tree, OPERATION, key, self.stop.as_ref())?,
                    Direction::Backward => below(tree, OPERATION, key, self.stop.as_ref())?,
                };
                if beyond { None } else { Some(candidate) }
            }
            None => None,
        };
        self.last = Some(current);
        Ok(Some(tree.entry(current)))
    }

    /// Removes the entry returned by the latest [`TreeCursor::next`] from
    /// the backing map.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::IllegalState`] if `next` has not returned an
    ///   entry since the cursor was created or last removed one, or if `map`
    ///   is not backed by the map that created the cursor.
    /// - [`CollectionError::ConcurrentModification`] if the map changed
    ///   structurally behind the cursor.
    pub fn remove<M>(&mut self, map: &mut M) -> Result<(K, M::Value)>
    where
        M: TreeAccess<Key = K>,
    {
        const OPERATION: &str = "TreeCursor::remove";
        let tree = map.tree_mut();
        let Some(last) = self.last else {
            return Err(CollectionError::IllegalState {
                operation: OPERATION,
                reason: "no entry has been returned since the cursor was created or last removed one",
            });
        };
        self.check(OPERATION, tree)?;
        self.last = None;
        let removed = tree.remove_node(last);
        self.expected_modifications = tree.modification_count();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn map() -> TreeMap<i32, &'static str> {
        [(1, "one"), (2, "two"), (3, "three"), (4, "four")]
            .into_iter()
            .collect()
    }

    #[rstest]
    fn test_walks_in_both_directions(map: TreeMap<i32, &'static str>) {
        let mut forward = map.cursor();
        let mut keys = Vec::new();
        while let Some((key, _)) = forward.next(&map).unwrap() {
            keys.push(*key);
        }
        assert_eq!(keys, vec![1, 2, 3, 4]);

        let mut backward = map.descending_cursor();
        keys.clear();
        while let Some((key, _)) = backward.next(&map).unwrap() {
            keys.push(*key);
        }
        assert_eq!(keys, vec![4, 3, 2, 1]);
    }

    #[rstest]
    fn test_foreign_insert_is_detected(mut map: TreeMap<i32, &'static str>) {
        let mut cursor = map.cursor();
        cursor.next(&map).unwrap();
        map.insert(10, "ten").unwrap();
        let error = cursor.next(&map).unwrap_err();
        assert!(matches!(error, CollectionError::ConcurrentModification { .. }));
        assert!(error.is_recoverable());
    }

    #[rstest]
    fn test_value_overwrite_is_tolerated(mut map: TreeMap<i32, &'static str>) {
        let mut cursor = map.cursor();
        cursor.next(&map).unwrap();
        map.insert(1, "uno").unwrap();
        assert_eq!(cursor.next(&map).unwrap(), Some((&2, &"two")));
    }

    #[rstest]
    fn test_remove_requires_a_returned_entry(mut map: TreeMap<i32, &'static str>) {
        let mut cursor = map.cursor();
        assert!(matches!(
            cursor.remove(&mut map),
            Err(CollectionError::IllegalState { .. })
        ));
        cursor.next(&map).unwrap();
        assert_eq!(cursor.remove(&mut map).unwrap(), (1, "one"));
        assert!(matches!(
            cursor.remove(&mut map),
            Err(CollectionError::IllegalState { .. })
        ));
        assert_eq!(map.len(), 3);
    }

    #[rstest]
    fn test_removing_every_entry_through_the_cursor(mut map: TreeMap<i32, &'static str>) {
        let mut cursor = map.descending_cursor();
        let mut removed = Vec::new();
        while cursor.next(&map).unwrap().is_some() {
            removed.push(cursor.remove(&mut map).unwrap().0);
            map.assert_invariants();
        }
        assert_eq!(removed, vec![4, 3, 2, 1]);
        assert!(map.is_empty());
    }

    #[rstest]
    fn test_bounded_cursor_stops_at_window_edge(mut map: TreeMap<i32, &'static str>) {
        let view = map.sub_map(2, true, 4, false).unwrap();
        let mut cursor = view.cursor().unwrap();
        assert_eq!(cursor.next(&view).unwrap(), Some((&2, &"two")));
        assert_eq!(cursor.next(&view).unwrap(), Some((&3, &"three")));
        assert!(!cursor.has_next());
        assert_eq!(cursor.next(&view).unwrap(), None);

        let mut backward = view.descending_cursor().unwrap();
        assert_eq!(backward.next(&view).unwrap(), Some((&3, &"three")));
        assert_eq!(backward.next(&view).unwrap(), Some((&2, &"two")));
        assert_eq!(backward.next(&view).unwrap(), None);
    }

    #[rstest]
    fn test_cursor_rejects_a_map_it_did_not_come_from(map: TreeMap<i32, &'static str>) {
        let mut other: TreeMap<i32, &'static str> =
            [(10, "ten"), (11, "eleven"), (12, "twelve"), (13, "thirteen")]
                .into_iter()
                .collect();
        assert_eq!(other.modification_count(), map.modification_count());

        let mut cursor = map.cursor();
        assert!(matches!(
            cursor.next(&other),
            Err(CollectionError::IllegalState { .. })
        ));
        cursor.next(&map).unwrap();
        assert!(matches!(
            cursor.remove(&mut other),
            Err(CollectionError::IllegalState { .. })
        ));
        assert_eq!(other.len(), 4);
    }

    #[rstest]
    fn test_clone_does_not_accept_the_original_cursor(map: TreeMap<i32, &'static str>) {
        let copy = map.clone();
        let mut cursor = map.cursor();
        assert!(cursor.next(&copy).is_err());
        assert_eq!(cursor.next(&map).unwrap(), Some((&1, &"one")));
    }

    #[rstest]
    fn test_cursor_from_map_fails_after_view_mutation(mut map: TreeMap<i32, &'static str>) {
        let mut cursor = map.cursor();
        map.tail_map(3, true).unwrap().poll_first_entry().unwrap();
        assert!(cursor.next(&map).is_err());
    }
}
