//! Error types shared by the map engines.
//!
//! Lookups that miss are not errors: they return `None`. The variants below
//! cover programming errors (bad arguments, keys that cannot be ordered) and
//! the recoverable conditions reported by fail-fast cursors. After any of them
//! is returned the map is still structurally valid.

use std::fmt;

/// Errors raised by [`TreeMap`](crate::ordered::TreeMap),
/// [`HashMap`](crate::hash::HashMap) and their views and cursors.
///
/// # Examples
///
/// ```rust
/// use arbortable::CollectionError;
///
/// let error = CollectionError::TypeMismatch { operation: "TreeMap::insert" };
/// assert_eq!(
///     format!("{error}"),
///     "TreeMap::insert: keys are not mutually comparable"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// An argument was rejected before any mutation happened.
    InvalidArgument {
        /// The operation that rejected the argument.
        operation: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// The comparator could not order two keys.
    TypeMismatch {
        /// The operation during which the comparison failed.
        operation: &'static str,
    },
    /// A cursor operation was called in a state that does not allow it.
    IllegalState {
        /// The rejected operation.
        operation: &'static str,
        /// Why the cursor was not ready.
        reason: &'static str,
    },
    /// A cursor observed a structural change it did not make itself.
    ConcurrentModification {
        /// Modification count recorded by the cursor.
        expected: u64,
        /// Modification count found on the map.
        actual: u64,
    },
}

impl CollectionError {
    pub(crate) fn invalid_argument(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors the caller may recover from by restarting
    /// the traversal (`ConcurrentModification` and `IllegalState`).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification { .. } | Self::IllegalState { .. }
        )
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { operation, reason } => {
                write!(formatter, "{operation}: invalid argument: {reason}")
            }
            Self::TypeMismatch { operation } => {
                write!(formatter, "{operation}: keys are not mutually comparable")
            }
            Self::IllegalState { operation, reason } => {
                write!(formatter, "{operation}: {reason}")
            }
            Self::ConcurrentModification { expected, actual } => write!(
                formatter,
                "concurrent modification detected (expected modification count {expected}, found {actual})"
            ),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollectionError>;
