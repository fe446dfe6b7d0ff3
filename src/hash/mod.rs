//! Hash map engine.
//!
//! This module provides [`HashMap`], a chained-bucket hash map with a
//! null-key slot, and the pieces built on it:
//!
//! - [`KeySet`], [`Values`], [`EntrySet`]: write-through views
//! - [`HashCursor`]: a fail-fast cursor that can remove as it walks
//! - [`Hashtable`] (feature `synchronized`): the same engine behind a mutex
//!
//! # Examples
//!
//! ```rust
//! use arbortable::hash::HashMap;
//!
//! let mut map = HashMap::with_capacity(4);
//! for key in [0, 4, 8] {
//!     map.insert(key, ());
//! }
//! assert_eq!(map.len(), 3);
//!
//! // The fourth key pushes the count past three quarters of the buckets.
//! map.insert(1, ());
//! assert_eq!(map.capacity(), 8);
//! assert!([0, 4, 8, 1].iter().all(|key| map.contains_key(key)));
//! ```

mod cursor;
mod hashmap;
#[cfg(feature = "synchronized")]
mod hashtable;
mod spread;
mod table;
mod view;

#[cfg(test)]
mod proptests;

pub use cursor::{HashAccess, HashCursor};
pub use hashmap::{HashMap, IntoIter, Iter};
#[cfg(feature = "synchronized")]
pub use hashtable::{Hashtable, TableCursor};
pub use spread::DefaultHashBuilder;
pub use view::{EntrySet, KeySet, Values};
