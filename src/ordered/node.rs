//! Node storage for the AVL tree.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Children
//! are owned through the arena; the parent index is only a back-reference
//! used for rotations and in-order stepping. Freed slots are recycled, and a
//! live node keeps its id for as long as it stays in the tree.

use std::ops::{Index, IndexMut};

/// Index of a node inside a [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// One key/value pair of the tree.
#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Height of the subtree rooted here; a leaf has height 1.
    pub(crate) height: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    /// Creates a leaf attached below `parent`.
    pub(crate) const fn leaf(parent: Option<NodeId>, key: K, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            parent,
            left: None,
            right: None,
        }
    }
}

#[derive(Clone, Debug)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant,
}

/// Arena of tree nodes with a free list.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn allocate(&mut self, node: Node<K, V>) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Slot::Occupied(node);
            NodeId(index)
        } else {
            self.slots.push(Slot::Occupied(node));
            NodeId(self.slots.len() - 1)
        }
    }

    /// Takes the node out of its slot. The id must not be used afterwards.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<K, V> {
        match std::mem::replace(&mut self.slots[id.0], Slot::Vacant) {
            Slot::Occupied(node) => {
                self.free.push(id.0);
                node
            }
            Slot::Vacant => panic!("node {id:?} is not live"),
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Height of an optional subtree; absent subtrees have height 0.
    #[inline]
    pub(crate) fn height(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |id| self[id].height)
    }

    /// Leftmost node of the subtree rooted at `id`.
    pub(crate) fn first(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(left) = self[node].left {
            node = left;
        }
        node
    }

    /// Rightmost node of the subtree rooted at `id`.
    pub(crate) fn last(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(right) = self[node].right {
            node = right;
        }
        node
    }

    /// In-order successor, or `None` for the last node.
    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self[id].right {
            return Some(self.first(right));
        }
        let mut node = id;
        let mut parent = self[node].parent;
        while let Some(candidate) = parent {
            if self[candidate].left == Some(node) {
                return Some(candidate);
            }
            node = candidate;
            parent = self[node].parent;
        }
        None
    }

    /// In-order predecessor, or `None` for the first node.
    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self[id].left {
            return Some(self.last(left));
        }
        let mut node = id;
        let mut parent = self[node].parent;
        while let Some(candidate) = parent {
            if self[candidate].right == Some(node) {
                return Some(candidate);
            }
            node = candidate;
            parent = self[node].parent;
        }
        None
    }
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant => panic!("node {id:?} is not live"),
        }
    }
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant => panic!("node {id:?} is not live"),
        }
    }
}
