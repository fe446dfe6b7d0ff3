//! Ordered map engine.
//!
//! This module provides [`TreeMap`], a mutable AVL-balanced ordered map,
//! together with the pieces built on it:
//!
//! - [`SubMap`]: a bounded, optionally descending window onto a map
//! - [`KeySet`], [`Values`], [`EntrySet`]: write-through views
//! - [`TreeCursor`]: a fail-fast cursor that can remove as it walks
//! - [`Comparator`]: the ordering abstraction, with [`NaturalOrder`],
//!   [`Reversed`] and [`comparing`]
//!
//! # Examples
//!
//! ```rust
//! use arbortable::ordered::TreeMap;
//!
//! let mut map: TreeMap<_, _> = [5, 3, 8, 1, 4, 7, 9].map(|key| (key, ())).into_iter().collect();
//!
//! let mut window = map.sub_map(3, true, 8, false).unwrap();
//! let keys: Vec<i32> = window.keys().unwrap().copied().collect();
//! assert_eq!(keys, vec![3, 4, 5, 7]);
//!
//! // Removing through the window removes from the map.
//! window.poll_first_entry().unwrap();
//! assert_eq!(map.first_key(), Some(&1));
//! assert!(!map.contains_key(&3).unwrap());
//! ```

mod bounded;
mod comparator;
mod cursor;
mod node;
mod relation;
mod treemap;
mod view;

#[cfg(test)]
mod proptests;

pub use bounded::SubMap;
pub use comparator::{Comparator, FnComparator, NaturalOrder, Reversed, comparing};
pub use cursor::{TreeAccess, TreeCursor};
pub use treemap::{IntoIter, Iter, TreeMap};
pub use view::{EntrySet, KeySet, Values};
