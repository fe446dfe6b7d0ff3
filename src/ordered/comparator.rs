//! Key orderings used by [`TreeMap`](super::TreeMap).
//!
//! A [`Comparator`] may decline to order two keys by returning `None`. The
//! tree reports that as [`CollectionError::TypeMismatch`](crate::CollectionError)
//! at the comparison that failed, so a map of `f64` keys under
//! [`NaturalOrder`] accepts every number except `NaN`.

use std::cmp::Ordering;
use std::fmt;

/// A total order over keys, possibly undefined for some pairs.
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::{Comparator, NaturalOrder};
/// use std::cmp::Ordering;
///
/// assert_eq!(NaturalOrder.compare(&1, &2), Some(Ordering::Less));
/// assert_eq!(NaturalOrder.compare(&f64::NAN, &1.0), None);
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compares two keys, returning `None` when they cannot be ordered.
    fn compare(&self, left: &K, right: &K) -> Option<Ordering>;
}

/// Orders keys by their [`PartialOrd`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: PartialOrd + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Option<Ordering> {
        left.partial_cmp(right)
    }
}

/// Reverses another comparator.
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::{NaturalOrder, Reversed, TreeMap};
///
/// let mut map = TreeMap::with_comparator(Reversed(NaturalOrder));
/// map.insert(1, "one").unwrap();
/// map.insert(3, "three").unwrap();
/// assert_eq!(map.first_key(), Some(&3));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reversed<C>(pub C);

impl<K: ?Sized, C: Comparator<K>> Comparator<K> for Reversed<C> {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Option<Ordering> {
        self.0.compare(right, left)
    }
}

/// Adapts a total comparison function. Built with [`comparing`].
#[derive(Clone, Copy)]
pub struct FnComparator<F>(F);

impl<F> fmt::Debug for FnComparator<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("FnComparator")
    }
}

impl<K: ?Sized, F> Comparator<K> for FnComparator<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Option<Ordering> {
        Some((self.0)(left, right))
    }
}

/// Wraps a total comparison function as a [`Comparator`].
///
/// # Examples
///
/// ```rust
/// use arbortable::ordered::{comparing, TreeMap};
///
/// let mut map = TreeMap::with_comparator(comparing(|left: &String, right: &String| {
///     left.to_lowercase().cmp(&right.to_lowercase())
/// }));
/// map.insert("a".to_string(), 1).unwrap();
/// assert_eq!(map.get(&"A".to_string()).unwrap(), Some(&1));
/// ```
pub const fn comparing<K: ?Sized, F>(function: F) -> FnComparator<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    FnComparator(function)
}
