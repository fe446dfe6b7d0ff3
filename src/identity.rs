//! Per-instance identity of a map engine.
//!
//! Cursors are detached from the map they walk, so a cursor records the
//! identity of the map that created it and refuses to step through any
//! other map.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one map instance.
///
/// Every call to [`MapIdentity::new`] yields a fresh value, and so does
/// [`Clone`]: a clone is a different map whose cursors must not be mixed
/// with the original's.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MapIdentity(u64);

impl MapIdentity {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw value a cursor stores.
    #[inline]
    pub(crate) const fn get(&self) -> u64 {
        self.0
    }
}

impl Clone for MapIdentity {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Default for MapIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_identities_are_distinct() {
        let first = MapIdentity::new();
        let second = MapIdentity::new();
        assert_ne!(first.get(), second.get());
    }

    #[rstest]
    fn test_clone_is_a_new_identity() {
        let original = MapIdentity::new();
        let copy = original.clone();
        assert_ne!(original, copy);
    }
}
