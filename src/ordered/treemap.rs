//! Mutable ordered map backed by an AVL tree.
//!
//! This module provides [`TreeMap`], an ordered map whose nodes live in an
//! arena and are kept height-balanced by single and double rotations.
//!
//! # Overview
//!
//! - O(log N) `get`, `insert`, `remove`
//! - O(log N) relational queries (`lower`, `floor`, `ceiling`, `higher`)
//! - O(log N) `first_key` / `last_key`
//! - O(1) `len` and `is_empty`
//! - bounded views over a key window via [`TreeMap::sub_map`] and friends
//!
//! Every lookup goes through one descent routine. The query relation decides
//! what the descent returns when it lands on an exact match or runs off the
//! bottom of the tree next to the nearest node.
//!
//! # Examples
//!
//! ```rust
//! use arbortable::ordered::TreeMap;
//!
//! let mut map = TreeMap::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     map.insert(key, key * 10).unwrap();
//! }
//!
//! assert_eq!(map.first_key(), Some(&1));
//! assert_eq!(map.floor_key(&6).unwrap(), Some(&5));
//! assert_eq!(map.ceiling_key(&6).unwrap(), Some(&7));
//!
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &3, &4, &5, &7, &8, &9]);
//! ```
//!
//! # Internal Structure
//!
//! The tree maintains the following invariants after every public call:
//! 1. An in-order walk yields strictly increasing keys under the comparator
//! 2. Every node's height is one more than the taller of its subtrees
//! 3. The subtree heights of every node differ by at most one

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::{Bound, RangeBounds};

use super::bounded::{SubMap, Window};
use super::comparator::{Comparator, NaturalOrder};
use super::cursor::{Direction, TreeCursor};
use super::node::{Node, NodeArena, NodeId};
use super::relation::Relation;
use super::view::{EntrySet, KeySet, Values};
use crate::error::{CollectionError, Result};
use crate::identity::MapIdentity;

// =============================================================================
// Descent
// =============================================================================

/// Where a descent for some key ended.
#[derive(Clone, Copy, Debug)]
enum Descent {
    /// The tree has no nodes.
    Empty,
    /// A node holds exactly the key.
    Match(NodeId),
    /// The key belongs below `node`, on the side given by `ordering`.
    Nearest { node: NodeId, ordering: Ordering },
}

// =============================================================================
// TreeMap Definition
// =============================================================================

/// A mutable ordered map based on an AVL tree.
///
/// Keys are ordered by a [`Comparator`]; the default [`NaturalOrder`] uses
/// `PartialOrd` and rejects pairs it cannot order (such as `NaN`) with
/// [`CollectionError::TypeMismatch`]. Because any comparison may fail, the
/// operations that compare keys return [`Result`].
///
/// # Time Complexity
///
/// | Operation              | Complexity   |
/// |------------------------|--------------|
/// | `new`                  | O(1)         |
/// | `get` / `contains_key` | O(log N)     |
/// | `insert`               | O(log N)     |
/// | `remove`               | O(log N)     |
/// | `floor_key` and kin    | O(log N)     |
/// | `first_key`/`last_key` | O(log N)     |
/// | `iter`                 | O(N) total   |
/// | `len`                  | O(1)         |
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::TreeMap;
///
/// let mut map = TreeMap::new();
/// map.insert("b", 2).unwrap();
/// map.insert("a", 1).unwrap();
/// assert_eq!(map.insert("a", 10).unwrap(), Some(1));
///
/// assert_eq!(map.get(&"a").unwrap(), Some(&10));
/// assert_eq!(map.len(), 2);
/// assert_eq!(format!("{map}"), "{a: 10, b: 2}");
/// ```
#[derive(Clone)]
pub struct TreeMap<K, V, C = NaturalOrder> {
    /// Storage for every live node
    nodes: NodeArena<K, V>,
    /// Root of the tree, `None` when empty
    root: Option<NodeId>,
    comparator: C,
    /// Number of entries
    length: usize,
    /// Bumped on every structural change; read by fail-fast cursors
    modification_count: u64,
    /// Lets a cursor tell this map from any other, clones included
    identity: MapIdentity,
}

impl<K, V> TreeMap<K, V> {
    /// Creates an empty map ordered by [`NaturalOrder`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let map: TreeMap<i32, String> = TreeMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Creates an empty map ordered by `comparator`.
    #[inline]
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
            comparator,
            length: 0,
            modification_count: 0,
            identity: MapIdentity::new(),
        }
    }

    /// Returns the comparator that orders this map.
    #[inline]
    #[must_use]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub(crate) const fn modification_count(&self) -> u64 {
        self.modification_count
    }

    #[inline]
    pub(crate) const fn identity(&self) -> u64 {
        self.identity.get()
    }

    #[inline]
    pub(crate) const fn arena(&self) -> &NodeArena<K, V> {
        &self.nodes
    }

    pub(crate) fn first_node(&self) -> Option<NodeId> {
        self.root.map(|root| self.nodes.first(root))
    }

    pub(crate) fn last_node(&self) -> Option<NodeId> {
        self.root.map(|root| self.nodes.last(root))
    }

    #[inline]
    pub(crate) fn entry(&self, id: NodeId) -> (&K, &V) {
        let node = &self.nodes[id];
        (&node.key, &node.value)
    }

    /// Returns the smallest key, or `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let map: TreeMap<_, _> = [(2, 'b'), (1, 'a')].into_iter().collect();
    /// assert_eq!(map.first_key(), Some(&1));
    /// ```
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.first_entry().map(|(key, _)| key)
    }

    /// Returns the largest key, or `None` if the map is empty.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.last_entry().map(|(key, _)| key)
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.first_node().map(|id| self.entry(id))
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.last_node().map(|id| self.entry(id))
    }

    /// Removes and returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let mut map: TreeMap<_, _> = [(2, 'b'), (1, 'a')].into_iter().collect();
    /// assert_eq!(map.poll_first_entry(), Some((1, 'a')));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn poll_first_entry(&mut self) -> Option<(K, V)> {
        let first = self.first_node()?;
        Some(self.remove_node(first))
    }

    /// Removes and returns the entry with the largest key.
    pub fn poll_last_entry(&mut self) -> Option<(K, V)> {
        let last = self.last_node()?;
        Some(self.remove_node(last))
    }

    /// Removes every entry.
    ///
    /// Clearing a non-empty map counts as one structural modification.
    pub fn clear(&mut self) {
        tracing::trace!(entries = self.length, "clearing tree map");
        if self.length > 0 {
            self.modification_count = self.modification_count.wrapping_add(1);
        }
        self.nodes.clear();
        self.root = None;
        self.length = 0;
    }

    /// Returns an iterator over the entries in ascending key order.
    ///
    /// The iterator is double-ended, so `.rev()` walks the map in
    /// descending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let map: TreeMap<_, _> = [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
    /// let descending: Vec<&i32> = map.iter().rev().map(|(key, _)| key).collect();
    /// assert_eq!(descending, vec![&3, &2, &1]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.first_node(),
            back: self.last_node(),
            ascending: true,
            remaining: Some(self.length),
        }
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in ascending key order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a fail-fast cursor positioned before the smallest key.
    ///
    /// Unlike [`TreeMap::iter`], a cursor does not borrow the map between
    /// steps. It reports [`CollectionError::ConcurrentModification`] if the
    /// map changed structurally behind its back, and it can remove the entry
    /// it returned last.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let mut map: TreeMap<_, _> = (1..=6).map(|key| (key, ())).collect();
    /// let mut cursor = map.cursor();
    /// while let Some((key, _)) = cursor.next(&map).unwrap() {
    ///     if key % 2 == 0 {
    ///         cursor.remove(&mut map).unwrap();
    ///     }
    /// }
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
    /// ```
    #[must_use]
    pub fn cursor(&self) -> TreeCursor<K> {
        TreeCursor::new(
            self.first_node(),
            self.identity(),
            self.modification_count,
            Direction::Forward,
            Bound::Unbounded,
        )
    }

    /// Returns a fail-fast cursor positioned after the largest key, walking
    /// towards smaller keys.
    #[must_use]
    pub fn descending_cursor(&self) -> TreeCursor<K> {
        TreeCursor::new(
            self.last_node(),
            self.identity(),
            self.modification_count,
            Direction::Backward,
            Bound::Unbounded,
        )
    }

    /// Returns a view that presents the whole map in descending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let mut map: TreeMap<_, _> = [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();
    /// let descending = map.descending_map();
    /// assert_eq!(descending.first_key().unwrap(), Some(&3));
    /// ```
    pub const fn descending_map(&mut self) -> SubMap<'_, K, V, C> {
        SubMap::new(self, Window::unbounded(false))
    }

    /// Returns a key view over the whole map; removals write through.
    pub const fn key_set(&mut self) -> KeySet<'_, K, V, C> {
        KeySet::new(SubMap::new(self, Window::unbounded(true)))
    }

    /// Returns a key view over the whole map in descending order.
    pub const fn descending_key_set(&mut self) -> KeySet<'_, K, V, C> {
        KeySet::new(SubMap::new(self, Window::unbounded(false)))
    }

    /// Returns a value view over the whole map.
    pub const fn values_view(&mut self) -> Values<'_, K, V, C> {
        Values::new(SubMap::new(self, Window::unbounded(true)))
    }

    /// Returns an entry view over the whole map.
    pub const fn entry_set(&mut self) -> EntrySet<'_, K, V, C> {
        EntrySet::new(SubMap::new(self, Window::unbounded(true)))
    }

    // =========================================================================
    // Structural Removal and Rebalancing
    // =========================================================================

    /// Unlinks the node and hands back its key and value.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> (K, V) {
        self.unlink(id);
        let node = self.nodes.release(id);
        (node.key, node.value)
    }

    /// Detaches `node` from the tree without freeing its slot.
    ///
    /// A node with two children is replaced by its neighbour from the taller
    /// subtree (the predecessor when both are equally tall). The neighbour is
    /// unlinked first, which rebalances and does the bookkeeping, and is then
    /// linked into the vacated position, so no other node changes its id.
    fn unlink(&mut self, node: NodeId) {
        let left = self.nodes[node].left;
        let right = self.nodes[node].right;
        let original_parent = self.nodes[node].parent;

        if let (Some(left), Some(right)) = (left, right) {
            let adjacent = if self.nodes[left].height >= self.nodes[right].height {
                self.nodes.last(left)
            } else {
                self.nodes.first(right)
            };
            self.unlink(adjacent);

            let mut left_height = 0;
            if let Some(left) = self.nodes[node].left.take() {
                left_height = self.nodes[left].height;
                self.nodes[adjacent].left = Some(left);
                self.nodes[left].parent = Some(adjacent);
            }
            let mut right_height = 0;
            if let Some(right) = self.nodes[node].right.take() {
                right_height = self.nodes[right].height;
                self.nodes[adjacent].right = Some(right);
                self.nodes[right].parent = Some(adjacent);
            }
            self.nodes[adjacent].height = left_height.max(right_height) + 1;
            self.replace_in_parent(node, Some(adjacent));
            return;
        }

        if let Some(left) = left {
            self.replace_in_parent(node, Some(left));
            self.nodes[node].left = None;
        } else if let Some(right) = right {
            self.replace_in_parent(node, Some(right));
            self.nodes[node].right = None;
        } else {
            self.replace_in_parent(node, None);
        }

        self.rebalance(original_parent, false);
        self.length -= 1;
        self.modification_count = self.modification_count.wrapping_add(1);
    }

    fn replace_in_parent(&mut self, node: NodeId, replacement: Option<NodeId>) {
        let parent = self.nodes[node].parent.take();
        if let Some(replacement) = replacement {
            self.nodes[replacement].parent = parent;
        }
        match parent {
            Some(parent) if self.nodes[parent].left == Some(node) => {
                self.nodes[parent].left = replacement;
            }
            Some(parent) => self.nodes[parent].right = replacement,
            None => self.root = replacement,
        }
    }

    /// Walks from `unbalanced` to the root restoring the height invariant.
    ///
    /// After an insertion one rotation suffices, and a node whose subtrees
    /// end up equally tall means nothing above changed. After a removal the
    /// walk stops at the first node whose height did not change.
    fn rebalance(&mut self, unbalanced: Option<NodeId>, insert: bool) {
        let mut cursor = unbalanced;
        while let Some(node) = cursor {
            let left = self.nodes[node].left;
            let right = self.nodes[node].right;
            let left_height = self.nodes.height(left);
            let right_height = self.nodes.height(right);

            if right_height == left_height + 2
                && let Some(right) = right
            {
                let right_left = self.nodes.height(self.nodes[right].left);
                let right_right = self.nodes.height(self.nodes[right].right);
                if right_right > right_left || (right_right == right_left && !insert) {
                    self.rotate_left(node);
                } else {
                    self.rotate_right(right);
                    self.rotate_left(node);
                }
                if insert {
                    break;
                }
            } else if left_height == right_height + 2
                && let Some(left) = left
            {
                let left_left = self.nodes.height(self.nodes[left].left);
                let left_right = self.nodes.height(self.nodes[left].right);
                if left_left > left_right || (left_left == left_right && !insert) {
                    self.rotate_right(node);
                } else {
                    self.rotate_left(left);
                    self.rotate_right(node);
                }
                if insert {
                    break;
                }
            } else if left_height == right_height {
                self.nodes[node].height = left_height + 1;
                if insert {
                    break;
                }
            } else {
                self.nodes[node].height = left_height.max(right_height) + 1;
                if !insert {
                    break;
                }
            }

            cursor = self.nodes[node].parent;
        }
    }

    /// Promotes the right child of `root` into its place.
    fn rotate_left(&mut self, root: NodeId) {
        let left = self.nodes[root].left;
        let Some(pivot) = self.nodes[root].right else {
            return;
        };
        let pivot_left = self.nodes[pivot].left;
        let pivot_right = self.nodes[pivot].right;

        self.nodes[root].right = pivot_left;
        if let Some(pivot_left) = pivot_left {
            self.nodes[pivot_left].parent = Some(root);
        }
        self.replace_in_parent(root, Some(pivot));
        self.nodes[pivot].left = Some(root);
        self.nodes[root].parent = Some(pivot);

        let root_height = self.nodes.height(left).max(self.nodes.height(pivot_left)) + 1;
        self.nodes[root].height = root_height;
        self.nodes[pivot].height = root_height.max(self.nodes.height(pivot_right)) + 1;
    }

    /// Promotes the left child of `root` into its place.
    fn rotate_right(&mut self, root: NodeId) {
        let right = self.nodes[root].right;
        let Some(pivot) = self.nodes[root].left else {
            return;
        };
        let pivot_left = self.nodes[pivot].left;
        let pivot_right = self.nodes[pivot].right;

        self.nodes[root].left = pivot_right;
        if let Some(pivot_right) = pivot_right {
            self.nodes[pivot_right].parent = Some(root);
        }
        self.replace_in_parent(root, Some(pivot));
        self.nodes[pivot].right = Some(root);
        self.nodes[root].parent = Some(pivot);

        let root_height = self.nodes.height(right).max(self.nodes.height(pivot_right)) + 1;
        self.nodes[root].height = root_height;
        self.nodes[pivot].height = root_height.max(self.nodes.height(pivot_left)) + 1;
    }
}

impl<K, V: PartialEq, C> TreeMap<K, V, C> {
    /// Returns `true` if some entry holds `value`.
    ///
    /// # Complexity
    ///
    /// O(N)
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.values().any(|candidate| candidate == value)
    }
}

impl<K, V, C: Comparator<K>> TreeMap<K, V, C> {
    #[inline]
    pub(crate) fn compare(&self, operation: &'static str, left: &K, right: &K) -> Result<Ordering> {
        self.comparator
            .compare(left, right)
            .ok_or(CollectionError::TypeMismatch { operation })
    }

    /// Descends from the root towards `key`.
    ///
    /// On an empty tree the key is compared with itself so that keys the
    /// comparator cannot handle are rejected even before the first insert.
    fn descend(&self, operation: &'static str, key: &K) -> Result<Descent> {
        let Some(mut nearest) = self.root else {
            self.compare(operation, key, key)?;
            return Ok(Descent::Empty);
        };
        loop {
            let node = &self.nodes[nearest];
            let ordering = self.compare(operation, key, &node.key)?;
            let child = match ordering {
                Ordering::Equal => return Ok(Descent::Match(nearest)),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            match child {
                Some(child) => nearest = child,
                None => return Ok(Descent::Nearest { node: nearest, ordering }),
            }
        }
    }

    /// Finds the node standing in `relation` to `key`.
    pub(crate) fn find(
        &self,
        operation: &'static str,
        key: &K,
        relation: Relation,
    ) -> Result<Option<NodeId>> {
        let found = match (self.descend(operation, key)?, relation) {
            (Descent::Empty, _) | (Descent::Nearest { .. }, Relation::Equal) => None,
            (Descent::Match(node), Relation::Lower) => self.nodes.prev(node),
            (Descent::Match(node), Relation::Higher) => self.nodes.next(node),
            (Descent::Match(node), Relation::Floor | Relation::Equal | Relation::Ceiling) => {
                Some(node)
            }
            (
                Descent::Nearest {
                    node,
                    ordering: Ordering::Less,
                },
                Relation::Lower | Relation::Floor,
            ) => self.nodes.prev(node),
            (
                Descent::Nearest {
                    node,
                    ordering: Ordering::Less,
                },
                Relation::Ceiling | Relation::Higher,
            )
            | (Descent::Nearest { node, .. }, Relation::Lower | Relation::Floor) => Some(node),
            (Descent::Nearest { node, .. }, Relation::Ceiling | Relation::Higher) => {
                self.nodes.next(node)
            }
        };
        Ok(found)
    }

    /// Finds the node for `key`, creating it with `value` if it is absent.
    ///
    /// Returns the node and the value it held before, which is `None` when
    /// the node was created.
    pub(crate) fn find_or_create(
        &mut self,
        operation: &'static str,
        key: K,
        value: V,
    ) -> Result<(NodeId, Option<V>)> {
        let parent = match self.descend(operation, &key)? {
            Descent::Match(node) => {
                let previous = std::mem::replace(&mut self.nodes[node].value, value);
                return Ok((node, Some(previous)));
            }
            Descent::Empty => None,
            Descent::Nearest { node, ordering } => Some((node, ordering)),
        };

        let created = self
            .nodes
            .allocate(Node::leaf(parent.map(|(node, _)| node), key, value));
        match parent {
            None => self.root = Some(created),
            Some((node, Ordering::Less)) => self.nodes[node].left = Some(created),
            Some((node, _)) => self.nodes[node].right = Some(created),
        }
        self.length += 1;
        self.modification_count = self.modification_count.wrapping_add(1);
        self.rebalance(parent.map(|(node, _)| node), true);
        Ok((created, None))
    }

    /// Inserts a key-value pair, returning the value previously stored
    /// under an equal key.
    ///
    /// Overwriting the value of an existing key is not a structural change
    /// and does not disturb open cursors.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if the comparator cannot order `key`
    /// against a key on its search path. The map is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    /// use arbortable::CollectionError;
    ///
    /// let mut map = TreeMap::new();
    /// assert_eq!(map.insert(1.5, "a").unwrap(), None);
    /// assert_eq!(map.insert(1.5, "b").unwrap(), Some("a"));
    /// assert!(matches!(
    ///     map.insert(f64::NAN, "c"),
    ///     Err(CollectionError::TypeMismatch { .. })
    /// ));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.find_or_create("TreeMap::insert", key, value)
            .map(|(_, previous)| previous)
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn get(&self, key: &K) -> Result<Option<&V>> {
        let found = self.find("TreeMap::get", key, Relation::Equal)?;
        Ok(found.map(|id| &self.nodes[id].value))
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn get_mut(&mut self, key: &K) -> Result<Option<&mut V>> {
        let found = self.find("TreeMap::get_mut", key, Relation::Equal)?;
        Ok(found.map(|id| &mut self.nodes[id].value))
    }

    /// Returns `true` if the map holds an entry for `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self
            .find("TreeMap::contains_key", key, Relation::Equal)?
            .is_some())
    }

    /// Removes the entry for `key`, returning its value.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let mut map: TreeMap<_, _> = [(1, 'a'), (2, 'b')].into_iter().collect();
    /// assert_eq!(map.remove(&1).unwrap(), Some('a'));
    /// assert_eq!(map.remove(&1).unwrap(), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        Ok(self.remove_entry(key)?.map(|(_, value)| value))
    }

    /// Removes the entry for `key`, returning the stored key and value.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        let found = self.find("TreeMap::remove", key, Relation::Equal)?;
        Ok(found.map(|id| self.remove_node(id)))
    }

    fn relative(
        &self,
        operation: &'static str,
        key: &K,
        relation: Relation,
    ) -> Result<Option<(&K, &V)>> {
        let found = self.find(operation, key, relation)?;
        Ok(found.map(|id| self.entry(id)))
    }

    /// Returns the greatest key strictly less than `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn lower_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.lower_entry(key)?.map(|(key, _)| key))
    }

    /// Returns the entry with the greatest key strictly less than `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn lower_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("TreeMap::lower", key, Relation::Lower)
    }

    /// Returns the greatest key less than or equal to `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let map: TreeMap<_, _> = [(1, ()), (5, ())].into_iter().collect();
    /// assert_eq!(map.floor_key(&5).unwrap(), Some(&5));
    /// assert_eq!(map.floor_key(&4).unwrap(), Some(&1));
    /// assert_eq!(map.floor_key(&0).unwrap(), None);
    /// ```
    pub fn floor_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.floor_entry(key)?.map(|(key, _)| key))
    }

    /// Returns the entry with the greatest key less than or equal to `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn floor_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("TreeMap::floor", key, Relation::Floor)
    }

    /// Returns the least key greater than or equal to `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn ceiling_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.ceiling_entry(key)?.map(|(key, _)| key))
    }

    /// Returns the entry with the least key greater than or equal to `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn ceiling_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("TreeMap::ceiling", key, Relation::Ceiling)
    }

    /// Returns the least key strictly greater than `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn higher_key(&self, key: &K) -> Result<Option<&K>> {
        Ok(self.higher_entry(key)?.map(|(key, _)| key))
    }

    /// Returns the entry with the least key strictly greater than `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `key` cannot be compared.
    pub fn higher_entry(&self, key: &K) -> Result<Option<(&K, &V)>> {
        self.relative("TreeMap::higher", key, Relation::Higher)
    }

    /// Returns an iterator over the entries whose keys fall in `range`.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidArgument`] if the start of the range lies
    ///   after its end.
    /// - [`CollectionError::TypeMismatch`] if a bound cannot be compared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let map: TreeMap<_, _> = (1..=9).map(|key| (key, key * key)).collect();
    /// let squares: Vec<&i32> = map.range(3..6).unwrap().map(|(_, value)| value).collect();
    /// assert_eq!(squares, vec![&9, &16, &25]);
    /// ```
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Result<Iter<'_, K, V>> {
        const OPERATION: &str = "TreeMap::range";
        if let (
            Bound::Included(start) | Bound::Excluded(start),
            Bound::Included(end) | Bound::Excluded(end),
        ) = (range.start_bound(), range.end_bound())
            && self.compare(OPERATION, start, end)? == Ordering::Greater
        {
            return Err(CollectionError::invalid_argument(
                OPERATION,
                "range start is greater than range end",
            ));
        }

        let front = match range.start_bound() {
            Bound::Included(start) => self.find(OPERATION, start, Relation::Ceiling)?,
            Bound::Excluded(start) => self.find(OPERATION, start, Relation::Higher)?,
            Bound::Unbounded => self.first_node(),
        };
        let back = match range.end_bound() {
            Bound::Included(end) => self.find(OPERATION, end, Relation::Floor)?,
            Bound::Excluded(end) => self.find(OPERATION, end, Relation::Lower)?,
            Bound::Unbounded => self.last_node(),
        };

        let crossed = match (front, back) {
            (Some(front), Some(back)) => {
                self.compare(OPERATION, &self.nodes[front].key, &self.nodes[back].key)?
                    == Ordering::Greater
            }
            _ => true,
        };
        if crossed {
            return Ok(Iter::between(&self.nodes, None, None, true));
        }
        Ok(Iter::between(&self.nodes, front, back, true))
    }

    /// Returns a view of the keys between `from` and `to`.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidArgument`] if `from` is greater than `to`.
    /// - [`CollectionError::TypeMismatch`] if the bounds cannot be compared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbortable::ordered::TreeMap;
    ///
    /// let mut map: TreeMap<_, _> = [5, 3, 8, 1, 4, 7, 9].map(|key| (key, ())).into_iter().collect();
    /// let mut window = map.sub_map(3, true, 8, false).unwrap();
    /// assert_eq!(window.keys().unwrap().copied().collect::<Vec<_>>(), vec![3, 4, 5, 7]);
    /// assert_eq!(window.poll_first_entry().unwrap(), Some((3, ())));
    /// assert!(!map.contains_key(&3).unwrap());
    /// ```
    pub fn sub_map(
        &mut self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> Result<SubMap<'_, K, V, C>> {
        let window = Window::new(
            self,
            "TreeMap::sub_map",
            true,
            Window::bound(from, from_inclusive),
            Window::bound(to, to_inclusive),
        )?;
        Ok(SubMap::new(self, window))
    }

    /// Returns a view of the keys below `to`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `to` cannot be compared.
    pub fn head_map(&mut self, to: K, inclusive: bool) -> Result<SubMap<'_, K, V, C>> {
        let window = Window::new(
            self,
            "TreeMap::head_map",
            true,
            Bound::Unbounded,
            Window::bound(to, inclusive),
        )?;
        Ok(SubMap::new(self, window))
    }

    /// Returns a view of the keys above `from`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] if `from` cannot be compared.
    pub fn tail_map(&mut self, from: K, inclusive: bool) -> Result<SubMap<'_, K, V, C>> {
        let window = Window::new(
            self,
            "TreeMap::tail_map",
            true,
            Window::bound(from, inclusive),
            Bound::Unbounded,
        )?;
        Ok(SubMap::new(self, window))
    }

    /// Inserts every entry of `entries`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] from the first insert that failed.
    /// Entries inserted before it stay in the map.
    pub fn try_extend<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A borrowing iterator over the entries of a [`TreeMap`] or one of its
/// views.
pub struct Iter<'a, K, V> {
    nodes: &'a NodeArena<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    /// `false` when `front` holds the largest key
    ascending: bool,
    /// Exact count when the iterator spans the whole map
    remaining: Option<usize>,
}

impl<'a, K, V> Iter<'a, K, V> {
    /// Iterates from `front` to `back` inclusive. Both must be `Some` and in
    /// the given order, or both `None`.
    pub(crate) const fn between(
        nodes: &'a NodeArena<K, V>,
        front: Option<NodeId>,
        back: Option<NodeId>,
        ascending: bool,
    ) -> Self {
        Self {
            nodes,
            front,
            back,
            ascending,
            remaining: None,
        }
    }

    fn finish_if_met(&mut self, current: NodeId) -> bool {
        if self.front == self.back {
            debug_assert_eq!(self.front, Some(current));
            self.front = None;
            self.back = None;
            return true;
        }
        false
    }

    fn yield_node(&mut self, current: NodeId) -> (&'a K, &'a V) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        let node = &self.nodes[current];
        (&node.key, &node.value)
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.front?;
        if !self.finish_if_met(current) {
            self.front = if self.ascending {
                self.nodes.next(current)
            } else {
                self.nodes.prev(current)
            };
        }
        Some(self.yield_node(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(remaining) => (remaining, Some(remaining)),
            None => (usize::from(self.front.is_some()), None),
        }
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let current = self.back?;
        if !self.finish_if_met(current) {
            self.back = if self.ascending {
                self.nodes.prev(current)
            } else {
                self.nodes.next(current)
            };
        }
        Some(self.yield_node(current))
    }
}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

/// An owning iterator over the entries of a [`TreeMap`] in key order.
pub struct IntoIter<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Default> Default for TreeMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

/// Builds a map by inserting every entry in turn.
///
/// # Panics
///
/// Panics if the comparator cannot order two of the keys. Use
/// [`TreeMap::try_extend`] to handle that case as an error.
impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for TreeMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

/// # Panics
///
/// Panics if the comparator cannot order two of the keys.
impl<K, V, C: Comparator<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if let Err(error) = self.try_extend(iter) {
            panic!("{error}");
        }
    }
}

impl<K, V, C> IntoIterator for TreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut order = Vec::with_capacity(self.length);
        let mut current = self.first_node();
        while let Some(id) = current {
            order.push(id);
            current = self.nodes.next(id);
        }
        let entries: Vec<(K, V)> = order
            .into_iter()
            .map(|id| {
                let node = self.nodes.release(id);
                (node.key, node.value)
            })
            .collect();
        IntoIter {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Two maps are equal when they hold equal entries in the same order.
impl<K: PartialEq, V: PartialEq, C> PartialEq for TreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for TreeMap<K, V, C> {}

impl<K: Hash, V: Hash, C> Hash for TreeMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, C> fmt::Display for TreeMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for TreeMap<K, V, C>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct TreeMapVisitor<K, V, C> {
    marker: std::marker::PhantomData<fn() -> TreeMap<K, V, C>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for TreeMapVisitor<K, V, C>
where
    K: serde::Deserialize<'de>,
    V: serde::Deserialize<'de>,
    C: Comparator<K> + Default,
{
    type Value = TreeMap<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = TreeMap::default();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value).map_err(serde::de::Error::custom)?;
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for TreeMap<K, V, C>
where
    K: serde::Deserialize<'de>,
    V: serde::Deserialize<'de>,
    C: Comparator<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(TreeMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Invariant Checks
// =============================================================================

#[cfg(test)]
impl<K: fmt::Debug, V, C: Comparator<K>> TreeMap<K, V, C> {
    /// Panics unless links, heights, balance, order and length all agree.
    pub(crate) fn assert_invariants(&self) {
        let (_, counted) = self.check_subtree(self.root, None);
        assert_eq!(counted, self.length, "length out of sync with the tree");

        let keys: Vec<&K> = self.keys().collect();
        for pair in keys.windows(2) {
            assert_eq!(
                self.comparator.compare(pair[0], pair[1]),
                Some(Ordering::Less),
                "keys out of order: {:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    fn check_subtree(&self, node: Option<NodeId>, parent: Option<NodeId>) -> (usize, usize) {
        let Some(id) = node else {
            return (0, 0);
        };
        let current = &self.nodes[id];
        assert_eq!(current.parent, parent, "bad parent link at {:?}", current.key);
        let (left_height, left_count) = self.check_subtree(current.left, Some(id));
        let (right_height, right_count) = self.check_subtree(current.right, Some(id));
        assert!(
            left_height.abs_diff(right_height) <= 1,
            "unbalanced at {:?}: {left_height} vs {right_height}",
            current.key
        );
        assert_eq!(
            current.height,
            left_height.max(right_height) + 1,
            "stale height at {:?}",
            current.key
        );
        (current.height, left_count + right_count + 1)
    }

    pub(crate) fn root_key(&self) -> Option<&K> {
        self.root.map(|root| &self.nodes[root].key)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordered::comparator::{Reversed, comparing};
    use rstest::{fixture, rstest};

    static_assertions::assert_impl_all!(TreeMap<i32, String>: Send, Sync, Clone);

    #[fixture]
    fn scenario_map() -> TreeMap<i32, i32> {
        let mut map = TreeMap::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            map.insert(key, key * 10).unwrap();
        }
        map
    }

    fn keys_of<C>(map: &TreeMap<i32, i32, C>) -> Vec<i32> {
        map.keys().copied().collect()
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[rstest]
    fn test_display_empty() {
        let map: TreeMap<i32, String> = TreeMap::new();
        assert_eq!(format!("{map}"), "{}");
    }

    #[rstest]
    fn test_display_sorted() {
        let mut map = TreeMap::new();
        map.insert(3, "three").unwrap();
        map.insert(1, "one").unwrap();
        map.insert(2, "two").unwrap();
        assert_eq!(format!("{map}"), "{1: one, 2: two, 3: three}");
        assert_eq!(format!("{map:?}"), r#"{1: "one", 2: "two", 3: "three"}"#);
    }

    // =========================================================================
    // Lookup and Relational Queries
    // =========================================================================

    #[rstest]
    fn test_scenario_relational_queries(scenario_map: TreeMap<i32, i32>) {
        assert_eq!(scenario_map.first_key(), Some(&1));
        assert_eq!(scenario_map.last_key(), Some(&9));
        assert_eq!(scenario_map.floor_key(&6).unwrap(), Some(&5));
        assert_eq!(scenario_map.ceiling_key(&6).unwrap(), Some(&7));
        assert_eq!(keys_of(&scenario_map), vec![1, 3, 4, 5, 7, 8, 9]);
        scenario_map.assert_invariants();
    }

    #[rstest]
    #[case(5, Some(4), Some(5), Some(5), Some(7))]
    #[case(6, Some(5), Some(5), Some(7), Some(7))]
    #[case(1, None, Some(1), Some(1), Some(3))]
    #[case(0, None, None, Some(1), Some(1))]
    #[case(9, Some(8), Some(9), Some(9), None)]
    #[case(10, Some(9), Some(9), None, None)]
    fn test_relations(
        scenario_map: TreeMap<i32, i32>,
        #[case] key: i32,
        #[case] lower: Option<i32>,
        #[case] floor: Option<i32>,
        #[case] ceiling: Option<i32>,
        #[case] higher: Option<i32>,
    ) {
        assert_eq!(scenario_map.lower_key(&key).unwrap().copied(), lower);
        assert_eq!(scenario_map.floor_key(&key).unwrap().copied(), floor);
        assert_eq!(scenario_map.ceiling_key(&key).unwrap().copied(), ceiling);
        assert_eq!(scenario_map.higher_key(&key).unwrap().copied(), higher);
    }

    #[rstest]
    fn test_entry_queries_carry_values(scenario_map: TreeMap<i32, i32>) {
        assert_eq!(scenario_map.lower_entry(&4).unwrap(), Some((&3, &30)));
        assert_eq!(scenario_map.higher_entry(&4).unwrap(), Some((&5, &50)));
        assert_eq!(scenario_map.first_entry(), Some((&1, &10)));
        assert_eq!(scenario_map.last_entry(), Some((&9, &90)));
    }

    #[rstest]
    fn test_queries_on_empty_map() {
        let map: TreeMap<i32, i32> = TreeMap::new();
        assert_eq!(map.first_key(), None);
        assert_eq!(map.last_entry(), None);
        assert_eq!(map.floor_key(&3).unwrap(), None);
        assert_eq!(map.get(&3).unwrap(), None);
    }

    #[rstest]
    fn test_get_mut_overwrites_in_place(mut scenario_map: TreeMap<i32, i32>) {
        let before = scenario_map.modification_count();
        if let Some(value) = scenario_map.get_mut(&4).unwrap() {
            *value += 1;
        }
        assert_eq!(scenario_map.get(&4).unwrap(), Some(&41));
        assert_eq!(scenario_map.modification_count(), before);
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    #[rstest]
    fn test_insert_existing_key_is_not_structural(mut scenario_map: TreeMap<i32, i32>) {
        let before = scenario_map.modification_count();
        assert_eq!(scenario_map.insert(4, 400).unwrap(), Some(40));
        assert_eq!(scenario_map.insert(4, 400).unwrap(), Some(400));
        assert_eq!(scenario_map.len(), 7);
        assert_eq!(scenario_map.modification_count(), before);
    }

    #[rstest]
    fn test_ascending_inserts_stay_balanced() {
        let mut map = TreeMap::new();
        for key in 0..1024 {
            map.insert(key, ()).unwrap();
            map.assert_invariants();
        }
        // A perfectly filled AVL tree of 1024 nodes is 11 levels tall.
        assert_eq!(map.root.map(|root| map.nodes[root].height), Some(11));
    }

    #[rstest]
    fn test_nan_is_rejected_before_and_after_first_insert() {
        let mut map: TreeMap<f64, i32> = TreeMap::new();
        assert_eq!(
            map.insert(f64::NAN, 1),
            Err(CollectionError::TypeMismatch {
                operation: "TreeMap::insert"
            })
        );
        map.insert(1.0, 1).unwrap();
        assert!(map.insert(f64::NAN, 2).is_err());
        assert_eq!(
            map.get(&f64::NAN),
            Err(CollectionError::TypeMismatch {
                operation: "TreeMap::get"
            })
        );
        assert_eq!(map.len(), 1);
        map.assert_invariants();
    }

    #[rstest]
    fn test_custom_comparators() {
        let mut reversed = TreeMap::with_comparator(Reversed(NaturalOrder));
        reversed.try_extend([(1, 'a'), (2, 'b'), (3, 'c')]).unwrap();
        assert_eq!(reversed.keys().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(reversed.floor_key(&2).unwrap(), Some(&2));
        assert_eq!(reversed.lower_key(&2).unwrap(), Some(&3));

        let mut by_length = TreeMap::with_comparator(comparing(|left: &&str, right: &&str| {
            left.len().cmp(&right.len())
        }));
        by_length.insert("ccc", 3).unwrap();
        by_length.insert("a", 1).unwrap();
        assert_eq!(by_length.insert("b", 2).unwrap(), Some(1));
        assert_eq!(by_length.first_key(), Some(&"a"));
    }

    // =========================================================================
    // Removal
    // =========================================================================

    #[rstest]
    fn test_removing_root_of_perfect_tree_promotes_predecessor() {
        let mut map = TreeMap::new();
        for key in [4, 2, 6, 1, 3, 5, 7] {
            map.insert(key, ()).unwrap();
        }
        assert_eq!(map.root_key(), Some(&4));

        assert_eq!(map.remove(&4).unwrap(), Some(()));
        assert_eq!(map.root_key(), Some(&3));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 5, 6, 7]);
        map.assert_invariants();
    }

    #[rstest]
    fn test_two_children_removal_keeps_neighbour_ids(mut scenario_map: TreeMap<i32, i32>) {
        let neighbour = scenario_map.find("test", &4, Relation::Equal).unwrap();
        scenario_map.remove(&5).unwrap();
        let after = scenario_map.find("test", &4, Relation::Equal).unwrap();
        assert_eq!(neighbour, after);
        scenario_map.assert_invariants();
    }

    #[rstest]
    fn test_remove_every_key_in_scrambled_order() {
        let mut map: TreeMap<i32, i32> = (0..200).map(|key| (key, key)).collect();
        for key in (0..200).map(|key| (key * 37) % 200) {
            assert_eq!(map.remove(&key).unwrap(), Some(key));
            map.assert_invariants();
        }
        assert!(map.is_empty());
        assert_eq!(map.root, None);
    }

    #[rstest]
    fn test_remove_missing_key(mut scenario_map: TreeMap<i32, i32>) {
        let before = scenario_map.modification_count();
        assert_eq!(scenario_map.remove(&6).unwrap(), None);
        assert_eq!(scenario_map.modification_count(), before);
    }

    #[rstest]
    fn test_poll_entries(mut scenario_map: TreeMap<i32, i32>) {
        assert_eq!(scenario_map.poll_first_entry(), Some((1, 10)));
        assert_eq!(scenario_map.poll_last_entry(), Some((9, 90)));
        assert_eq!(keys_of(&scenario_map), vec![3, 4, 5, 7, 8]);
        scenario_map.assert_invariants();
    }

    #[rstest]
    fn test_clear_bumps_count_only_when_non_empty(mut scenario_map: TreeMap<i32, i32>) {
        let before = scenario_map.modification_count();
        scenario_map.clear();
        assert!(scenario_map.is_empty());
        assert_eq!(scenario_map.modification_count(), before + 1);
        scenario_map.clear();
        assert_eq!(scenario_map.modification_count(), before + 1);
        scenario_map.insert(1, 1).unwrap();
        scenario_map.assert_invariants();
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    #[rstest]
    fn test_iter_from_both_ends(scenario_map: TreeMap<i32, i32>) {
        let mut iter = scenario_map.iter();
        assert_eq!(iter.size_hint(), (7, Some(7)));
        assert_eq!(iter.next(), Some((&1, &10)));
        assert_eq!(iter.next_back(), Some((&9, &90)));
        let middle: Vec<i32> = iter.map(|(key, _)| *key).collect();
        assert_eq!(middle, vec![3, 4, 5, 7, 8]);
    }

    #[rstest]
    #[case(3..8, vec![3, 4, 5, 7])]
    #[case(2..=8, vec![3, 4, 5, 7, 8])]
    #[case(6..7, vec![])]
    #[case(10.., vec![])]
    #[case(..4, vec![1, 3])]
    fn test_range<R: RangeBounds<i32>>(
        scenario_map: TreeMap<i32, i32>,
        #[case] range: R,
        #[case] expected: Vec<i32>,
    ) {
        let keys: Vec<i32> = scenario_map
            .range(range)
            .unwrap()
            .map(|(key, _)| *key)
            .collect();
        assert_eq!(keys, expected);
    }

    #[rstest]
    fn test_inverted_range_is_rejected(scenario_map: TreeMap<i32, i32>) {
        let result = scenario_map.range((Bound::Included(8), Bound::Included(3)));
        assert!(matches!(
            result,
            Err(CollectionError::InvalidArgument { .. })
        ));
    }

    #[rstest]
    fn test_into_iter_yields_sorted_owned_entries(scenario_map: TreeMap<i32, i32>) {
        let entries: Vec<(i32, i32)> = scenario_map.into_iter().collect();
        assert_eq!(entries.first(), Some(&(1, 10)));
        assert_eq!(entries.len(), 7);
        assert!(entries.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[rstest]
    fn test_contains_value(scenario_map: TreeMap<i32, i32>) {
        assert!(scenario_map.contains_value(&70));
        assert!(!scenario_map.contains_value(&71));
    }

    // =========================================================================
    // Equality and Hashing
    // =========================================================================

    #[rstest]
    fn test_equality_ignores_insertion_order(scenario_map: TreeMap<i32, i32>) {
        let other: TreeMap<i32, i32> = [9, 8, 7, 5, 4, 3, 1]
            .into_iter()
            .map(|key| (key, key * 10))
            .collect();
        assert_eq!(scenario_map, other);

        let mut differing = other.clone();
        differing.insert(1, 0).unwrap();
        assert_ne!(scenario_map, differing);
    }

    #[rstest]
    fn test_equal_maps_hash_equally(scenario_map: TreeMap<i32, i32>) {
        use std::collections::hash_map::DefaultHasher;
        let hash_of = |map: &TreeMap<i32, i32>| {
            let mut hasher = DefaultHasher::new();
            map.hash(&mut hasher);
            hasher.finish()
        };
        let rebuilt: TreeMap<i32, i32> = scenario_map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(hash_of(&scenario_map), hash_of(&rebuilt));
    }

    #[rstest]
    #[should_panic(expected = "keys are not mutually comparable")]
    fn test_collect_panics_on_incomparable_keys() {
        let _map: TreeMap<f64, ()> = [(1.0, ()), (f64::NAN, ())].into_iter().collect();
    }
}
