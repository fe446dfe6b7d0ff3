//! # arbortable
//!
//! Mutable map engines for Rust: an AVL-balanced ordered map with bounded
//! views, and a chained-bucket hash map with a synchronized variant.
//!
//! ## Overview
//!
//! - **Ordered maps**: [`TreeMap`](ordered::TreeMap) with relational queries
//!   (`lower`, `floor`, `ceiling`, `higher`), windowed views over a key range
//!   in either direction, and fail-fast cursors
//! - **Hash maps**: [`HashMap`](hash::HashMap) with power-of-two bucket
//!   tables, incremental capacity doubling, bulk pre-sizing and a null-key
//!   slot
//! - **Synchronized tables**: [`Hashtable`](hash::Hashtable), the same
//!   engine behind a per-call lock
//!
//! Operations that can fail return [`Result`] with a [`CollectionError`];
//! lookups that miss return `None`.
//!
//! ## Feature Flags
//!
//! - `ordered`: `TreeMap` and its views
//! - `hash`: `HashMap` and its views
//! - `synchronized`: `Hashtable`
//! - `serde`: serialization support
//! - `fxhash`: use `rustc_hash::FxBuildHasher` as the default hash builder
//! - `ahash`: use `ahash::RandomState` as the default hash builder
//! - `full`: Enable all features except the alternative hashers
//!
//! ## Example
//!
//! ```rust
//! use arbortable::prelude::*;
//!
//! let mut tree = TreeMap::new();
//! tree.insert(2, "two").unwrap();
//! tree.insert(1, "one").unwrap();
//! assert_eq!(tree.first_key(), Some(&1));
//!
//! let mut hash = HashMap::new();
//! hash.insert("one", 1);
//! assert_eq!(hash.get("one"), Some(&1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports the map types and the error type.
///
/// # Usage
///
/// ```rust
/// use arbortable::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CollectionError, Result};

    #[cfg(feature = "ordered")]
    pub use crate::ordered::{Comparator, SubMap, TreeMap};

    #[cfg(feature = "hash")]
    pub use crate::hash::HashMap;

    #[cfg(feature = "synchronized")]
    pub use crate::hash::Hashtable;
}

mod error;
#[cfg(any(feature = "ordered", feature = "hash"))]
mod identity;

pub use error::{CollectionError, Result};

#[cfg(feature = "ordered")]
pub mod ordered;

#[cfg(feature = "hash")]
pub mod hash;
