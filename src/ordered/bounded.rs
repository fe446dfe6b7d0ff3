//! Bounded, optionally descending views over a [`TreeMap`].
//!
//! A [`SubMap`] never copies nodes. It pairs a mutable borrow of the backing
//! map with a [`Window`] and rewrites every query as a search of the backing
//! tree, clamped to the window's endpoints.

use std::cmp::Ordering;
use std::ops::Bound;

use super::comparator::{Comparator, NaturalOrder};
use super::cursor::{Direction, TreeAccess, TreeCursor};
use super::node::NodeId;
use super::relation::Relation;
use super::treemap::{Iter, TreeMap};
use super::view::{EntrySet, KeySet, Values};
use crate::error::{CollectionError, Result};

/// `true` if `key` lies below the lower bound `from`.
pub(crate) fn below<K, V, C: Comparator<K>>(
    tree: &TreeMap<K, V, C>,
    operation: &'static str,
    key: &K,
    from: Bound<&K>,
) -> Result<bool> {
    Ok(match from {
        Bound::Unbounded => false,
        Bound::Included(from) => tree.compare(operation, key, from)? == Ordering::Less,
        Bound::Excluded(from) => tree.compare(operation, key, from)? != Ordering::Greater,
    })
}

/// `true` if `key` lies above the upper bound `to`.
pub(crate) fn above<K, V, C: Comparator<K>>(
    tree: &TreeMap<K, V, C>,
    operation: &'static str,
    key: &K,
    to: Bound<&K>,
) -> Result<bool> {
    Ok(match to {
        Bound::Unbounded => false,
        Bound::Included(to) => tree.compare(operation, key, to)? == Ordering::Greater,
        Bound::Excluded(to) => tree.compare(operation, key, to)? != Ordering::Less,
    })
}

const fn bound_key<K>(bound: &Bound<K>) -> Option<&K> {
    match bound {
        Bound::Included(key) | Bound::Excluded(key) => Some(key),
        Bound::Unbounded => None,
    }
}

/// The bound a nested view's endpoint is checked against. An endpoint of
/// the same kind as the current one may coincide with it: `(C..F)` can be
/// carved out of `(A..F)`.
const fn relaxed<'a, K>(requested: &Bound<K>, current: &'a Bound<K>) -> Bound<&'a K> {
    match (requested, current) {
        (_, Bound::Unbounded) => Bound::Unbounded,
        (Bound::Excluded(_), Bound::Excluded(key)) | (_, Bound::Included(key)) => {
            Bound::Included(key)
        }
        (_, Bound::Excluded(key)) => Bound::Excluded(key),
    }
}

// =============================================================================
// Window
// =============================================================================

/// Endpoints and direction of a bounded view.
///
/// `from` is always the lower end in comparator order, whichever way the
/// view iterates.
#[derive(Clone, Debug)]
pub(crate) struct Window<K> {
    ascending: bool,
    from: Bound<K>,
    to: Bound<K>,
}

impl<K> Window<K> {
    pub(crate) const fn unbounded(ascending: bool) -> Self {
        Self {
            ascending,
            from: Bound::Unbounded,
            to: Bound::Unbounded,
        }
    }

    pub(crate) const fn bound(key: K, inclusive: bool) -> Bound<K> {
        if inclusive {
            Bound::Included(key)
        } else {
            Bound::Excluded(key)
        }
    }

    /// Builds a window after checking that `from <= to`. A lone bound is
    /// compared with itself so incomparable keys are rejected up front.
    pub(crate) fn new<V, C: Comparator<K>>(
        tree: &TreeMap<K, V, C>,
        operation: &'static str,
        ascending: bool,
        from: Bound<K>,
        to: Bound<K>,
    ) -> Result<Self> {
        match (bound_key(&from), bound_key(&to)) {
            (Some(low), Some(high)) => {
                if tree.compare(operation, low, high)? == Ordering::Greater {
                    return Err(CollectionError::invalid_argument(
                        operation,
                        "from key is greater than to key",
                    ));
                }
            }
            (Some(key), None) | (None, Some(key)) => {
                tree.compare(operation, key, key)?;
            }
            (None, None) => {}
        }
        Ok(Self {
            ascending,
            from,
            to,
        })
    }

    pub(crate) const fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub(crate) fn contains<V, C: Comparator<K>>(
        &self,
        tree: &TreeMap<K, V, C>,
        operation: &'static str,
        key: &K,
    ) -> Result<bool> {
        Ok(!below(tree, operation, key, self.from.as_ref())?
            && !above(tree, operation, key, self.to.as_ref())?)
    }

    /// Drops `node` unless it satisfies both bounds.
    fn admit<V, C: Comparator<K>>(
        tree: &TreeMap<K, V, C>,
        operation: &'static str,
        node: Option<NodeId>,
        from: Bound<&K>,
        to: Bound<&K>,
    ) -> Result<Option<NodeId>> {
        let Some(id) = node else {
            return Ok(None);
        };
        let (key, _) = tree.entry(id);
        if below(tree, operation, key, from)? || above(tree, operation, key, to)? {
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// The first (or last) node of the window in iteration order.
    pub(crate) fn endpoint<V, C: Comparator<K>>(
        &self,
        tree: &TreeMap<K, V, C>,
        operation: &'static str,
        first: bool,
    ) -> Result<Option<NodeId>> {
        if self.ascending == first {
            let node = match &self.from {
                Bound::Unbounded => tree.first_node(),
                Bound::Included(from) => tree.find(operation, from, Relation::Ceiling)?,
                Bound::Excluded(from) => tree.find(operation, from, Relation::Higher)?,
            };
            Self::admit(tree, operation, node, Bound::Unbounded, self.to.as_ref())
        } else {
            let node = match &self.to {
                Bound::Unbounded => tree.last_node(),
                Bound::Included(to) => tree.find(operation, to, Relation::Floor)?,
                Bound::Excluded(to) => tree.find(operation, to, Relation::Lower)?,
            };
            Self::admit(tree, operation, node, self.from.as_ref(), Bound::Unbounded)
        }
    }

    /// Relational search confined to the window.
    ///
    /// A search that would leave the window through the bound it is heading
    /// for is restarted from that bound; the opposite bound is checked on the
    /// result.
    pub(crate) fn find<'a, V, C: Comparator<K>>(
        &'a self,
        tree: &TreeMap<K, V, C>,
        operation: &'static str,
        key: &'a K,
        relation: Relation,
    ) -> Result<Option<NodeId>> {
        let mut relation = relation.for_order(self.ascending);
        let mut key = key;
        let mut from_check = self.from.as_ref();
        let mut to_check = self.to.as_ref();

        if relation.looks_down()
            && let Some(to) = bound_key(&self.to)
        {
            let ordering = tree.compare(operation, to, key)?;
            if ordering != Ordering::Greater {
                key = to;
                if matches!(self.to, Bound::Excluded(_)) {
                    relation = Relation::Lower;
                } else if ordering == Ordering::Less {
                    relation = Relation::Floor;
                }
            }
            to_check = Bound::Unbounded;
        }

        if relation.looks_up()
            && let Some(from) = bound_key(&self.from)
        {
            let ordering = tree.compare(operation, from, key)?;
            if ordering != Ordering::Less {
                key = from;
                if matches!(self.from, Bound::Excluded(_)) {
                    relation = Relation::Higher;
                } else if ordering == Ordering::Greater {
                    relation = Relation::Ceiling;
                }
            }
            from_check = Bound::Unbounded;
        }

        let found = tree.find(operation, key, relation)?;
        Self::admit(tree, operation, found, from_check, to_check)
    }

    /// Intersects this window with requested endpoints given in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidArgument`] if a requested endpoint lies
    /// outside this window, or if the endpoints are out of order.
    pub(crate) fn narrow<V, C: Comparator<K>>(
        &self,
        tree: &TreeMap<K, V, C>,
        operation: &'static str,
        from: Bound<K>,
        to: Bound<K>,
    ) -> Result<Self>
    where
        K: Clone,
    {
        let (from, to) = if self.ascending { (from, to) } else { (to, from) };

        let from = match from {
            Bound::Unbounded => self.from.clone(),
            requested => {
                if let Some(key) = bound_key(&requested) {
                    let check = relaxed(&requested, &self.from);
                    if below(tree, operation, key, check)?
                        || above(tree, operation, key, self.to.as_ref())?
                    {
                        return Err(CollectionError::invalid_argument(
                            operation,
                            "from key is outside the bounds of this view",
                        ));
                    }
                }
                requested
            }
        };

        let to = match to {
            Bound::Unbounded => self.to.clone(),
            requested => {
                if let Some(key) = bound_key(&requested) {
                    let check = relaxed(&requested, &self.to);
                    if below(tree, operation, key, self.from.as_ref())?
                        || above(tree, operation, key, check)?
                    {
                        return Err(CollectionError::invalid_argument(
                            operation,
                            "to key is outside the bounds of this view",
                        ));
                    }
                }
                requested
            }
        };

        Self::new(tree, operation, self.ascending, from, to)
    }

    /// The bound a cursor walking in `direction` must not cross.
    pub(crate) fn stop(&self, direction: Direction) -> Bound<K>
    where
        K: Clone,
    {
        match direction {
            Direction::Forward => self.to.clone(),
            Direction::Backward => self.from.clone(),
        }
    }

    pub(crate) fn reversed(&self) -> Self
    where
        K: Clone,
    {
        Self {
            ascending: !self.ascending,
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

// =============================================================================
// SubMap Definition
// =============================================================================

/// A window onto a [`TreeMap`], possibly in descending order.
///
/// Reads see only the keys inside the window; writes go straight to the
/// backing map. Inserting a key outside the window is rejected.
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::TreeMap;
///
/// let mut map: TreeMap<_, _> = (1..=10).map(|key| (key, key * 100)).collect();
/// let mut window = map.sub_map(3, true, 6, true).unwrap();
///
/// assert_eq!(window.len().unwrap(), 4);
/// assert_eq!(window.get(&2).unwrap(), None);
/// assert!(window.insert(11, 0).is_err());
///
/// let mut descending = window.descending_map();
/// assert_eq!(descending.first_key().unwrap(), Some(&6));
/// assert_eq!(descending.higher_key(&5).unwrap(), Some(&4));
/// ```
pub struct SubMap<'a, K, V, C = NaturalOrder> {
    map: &'a mut TreeMap<K, V, C>,
    window: Window<K>,
}

impl<'a, K, V, C> SubMap<'a, K, V, C> {
    pub(crate) const fn new(map: &'a mut TreeMap<K, V, C>, window: Window<K>) -> Self {
        Self { map, window }
    }

    /// `true` if the view iterates from the largest key down.
    #[must_use]
    pub const fn is_descending(&self) -> bool {
        !self.window.is_ascending()
    }
}

impl<K, V, C: Comparator<K>> SubMap<'_, K, V, C> {
    fn endpoint(&self, first: bool) -> Result<Option<NodeId>> {
        self.window.endpoint(self.map, "SubMap::endpoint", first)
    }

    fn relative(&self, operation: &'static str, key: &K, relation: Relation) -> Result<Option<(&K, &V)>> {
        let found = self.window.find(self.map, operation, key, relation)?;
        Ok(found.map(|id| self.map.entry(id)))
    }

    /// Counts the entries inside the window.
    ///
    /// # Complexity
    ///
    /// O(log N + k) where k is the number of entries in the window
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn len(&self) -> Result<usize> {
        Ok(self.iter()?.count())
    }

    /// Returns `true` if no entry falls inside the window.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.endpoint(true)?.is_none())
    }

    /// Looks up `key`; keys outside the window are reported as absent.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn get(&self, key: &K) -> Result<Option<&V>> {
        if !self.window.contains(self.map, "SubMap::get", key)? {
            return Ok(None);
        }
        self.map.get(key)
    }

    /// Mutable lookup confined to the window.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn get_mut(&mut self, key: &K) -> Result<Option<&mut V>> {
        if !self.window.contains(self.map, "SubMap::get_mut", key)? {
            return Ok(None);
        }
        self.map.get_mut(key)
    }

    /// Returns `true` if `key` is inside the window and present.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.window.contains(self.map, "SubMap::contains_key", key)?
            && self.map.contains_key(key)?)
    }

    /// Inserts into the backing map.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidArgument`] if `key` is outside the window.
    /// - [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        const OPERATION: &str = "SubMap::insert";
        if !self.window.contains(self.map, OPERATION, &key)? {
            return Err(CollectionError::invalid_argument(
                OPERATION,
                "key is outside the bounds of this view",
            ));
        }
        self.map.insert(key, value)
    }

    /// Removes `key` from the backing map if it lies inside the window.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        Ok(self.remove_entry(key)?.map(|(_, value)| value))
    }

    /// Like [`SubMap::remove`], returning the stored key as well.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        if !self.window.contains(self.map, "SubMap::remove", key)? {
            return Ok(None);
        }
        self.map.remove_entry(key)
    }

    /// First entry in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn first_entry(&self) -> Result<Option<(&K, &V)>> {
        Ok(self.endpoint(true)?.map(|id| self.map.entry(id)))
    }

    /// Last entry in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn last_entry(&self) -> Result<Option<(&K, &V)>> {
        Ok(self.endpoint(false)?.map(|id| self.map.entry(id)))
    }

    /// First key in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn first_key(&self) -> Result<Option<&K>> {
        Ok(self.first_entry()?.map(|(key, _)| key))
    }

    /// Last key in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn last_key(&self) -> Result<Option<&K>> {
        Ok(self.last_entry()?.map(|(key, _)| key))
    }

    /// Removes and returns the first entry in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn poll_first_entry(&mut self) -> Result<Option<(K, V)>> {
        Ok(self.endpoint(true)?.map(|id| self.map.remove_node(id)))
    }

    /// Removes and returns the last entry in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn poll_last_entry(&mut self) -> Result<Option<(K, V)>> {
        Ok(self.endpoint(false)?.map(|id| self.map.remove_node(id)))
    }

    /// Entry strictly before `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn lower_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("SubMap::lower", key, Relation::Lower)
    }

    /// Entry at or before `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn floor_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("SubMap::floor", key, Relation::Floor)
    }

    /// Entry at or after `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn ceiling_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("SubMap::ceiling", key, Relation::Ceiling)
    }

    /// Entry strictly after `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn higher_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("SubMap::higher", key, Relation::Higher)
    }

    /// Key strictly before `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn lower_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.lower_entry(key)?.map(|(key, _)| key))
    }

    /// Key at or before `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn floor_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.floor_entry(key)?.map(|(key, _)| key))
    }

    /// Key at or after `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn ceiling_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.ceiling_entry(key)?.map(|(key, _)| key))
    }

    /// Key strictly after `key` in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn higher_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.higher_entry(key)?.map(|(key, _)| key))
    }

    /// Borrowing iterator over the window in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn iter(&self) -> Result<Iter<'_, K, V>> {
        let front = self.endpoint(true)?;
        let back = self.endpoint(false)?;
        Ok(Iter::between(
            self.map.arena(),
            front,
            back,
            self.window.is_ascending(),
        ))
    }

    /// Keys of the window in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn keys(&self) -> Result<impl DoubleEndedIterator<Item = &K>> {
        Ok(self.iter()?.map(|(key, _)| key))
    }

    /// Values of the window in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn values(&self) -> Result<impl DoubleEndedIterator<Item = &V>> {
        Ok(self.iter()?.map(|(_, value)| value))
    }
}

impl<K: Clone, V, C: Comparator<K>> SubMap<'_, K, V, C> {
    /// The same window walked in the opposite direction.
    pub fn descending_map(&mut self) -> SubMap<'_, K, V, C> {
        SubMap::new(self.map, self.window.reversed())
    }

    /// A narrower window. `from` and `to` are given in view order, so on a
    /// descending view `from` is the larger key.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidArgument`] if either key lies outside
    ///   this view or the keys are out of order.
    /// - [`CollectionError::TypeMismatch`] if a key cannot be compared.
    pub fn sub_map(
        &mut self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> Result<SubMap<'_, K, V, C>> {
        let window = self.window.narrow(
            self.map,
            "SubMap::sub_map",
            Window::bound(from, from_inclusive),
            Window::bound(to, to_inclusive),
        )?;
        Ok(SubMap::new(self.map, window))
    }

    /// Keys of this view that come before `to` in view order.
    ///
    /// # Errors
    ///
    /// As [`SubMap::sub_map`].
    pub fn head_map(&mut self, to: K, inclusive: bool) -> Result<SubMap<'_, K, V, C>> {
        let window = self.window.narrow(
            self.map,
            "SubMap::head_map",
            Bound::Unbounded,
            Window::bound(to, inclusive),
        )?;
        Ok(SubMap::new(self.map, window))
    }

    /// Keys of this view that come after `from` in view order.
    ///
    /// # Errors
    ///
    /// As [`SubMap::sub_map`].
    pub fn tail_map(&mut self, from: K, inclusive: bool) -> Result<SubMap<'_, K, V, C>> {
        let window = self.window.narrow(
            self.map,
            "SubMap::tail_map",
            Window::bound(from, inclusive),
            Bound::Unbounded,
        )?;
        Ok(SubMap::new(self.map, window))
    }

    /// Key view of this window.
    pub fn key_set(&mut self) -> KeySet<'_, K, V, C> {
        KeySet::new(SubMap::new(self.map, self.window.clone()))
    }

    /// Key view of this window in the opposite direction.
    pub fn descending_key_set(&mut self) -> KeySet<'_, K, V, C> {
        KeySet::new(SubMap::new(self.map, self.window.reversed()))
    }

    /// Value view of this window.
    pub fn values_view(&mut self) -> Values<'_, K, V, C> {
        Values::new(SubMap::new(self.map, self.window.clone()))
    }

    /// Entry view of this window.
    pub fn entry_set(&mut self) -> EntrySet<'_, K, V, C> {
        EntrySet::new(SubMap::new(self.map, self.window.clone()))
    }

    fn cursor_from(&self, first: bool) -> Result<TreeCursor<K>> {
        let direction = if self.window.is_ascending() == first {
            Direction::Forward
        } else {
            Direction::Backward
        };
        Ok(TreeCursor::new(
            self.endpoint(first)?,
            self.map.identity(),
            self.map.modification_count(),
            direction,
            self.window.stop(direction),
        ))
    }

    /// Fail-fast cursor over the window in view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn cursor(&self) -> Result<TreeCursor<K>> {
        self.cursor_from(true)
    }

    /// Fail-fast cursor over the window against view order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn descending_cursor(&self) -> Result<TreeCursor<K>> {
        self.cursor_from(false)
    }

    /// Removes every entry inside the window from the backing map.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    pub fn clear(&mut self) -> Result<()> {
        let mut cursor = self.cursor()?;
        while cursor.next(&*self)?.is_some() {
            cursor.remove(&mut *self)?;
        }
        Ok(())
    }
}

impl<K, V, C: Comparator<K>> TreeAccess for SubMap<'_, K, V, C> {
    type Key = K;
    type Value = V;
    type Order = C;

    fn tree(&self) -> &TreeMap<K, V, C> {
        &*self.map
    }

    fn tree_mut(&mut self) -> &mut TreeMap<K, V, C> {
        &mut *self.map
    }
}

// =============================================================================
// Tests
// =============================================================================
