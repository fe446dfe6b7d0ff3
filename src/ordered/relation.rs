//! Query relations for tree searches.

/// How a search key relates to the node a search should return.
///
/// Insertion (the "create if absent" relation) is not a variant: it needs
/// the key by value and is served by `TreeMap::find_or_create`, which shares
/// the same descent as every relation below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Relation {
    /// Greatest key strictly less than the search key.
    Lower,
    /// Greatest key less than or equal to the search key.
    Floor,
    /// Exactly the search key.
    Equal,
    /// Least key greater than or equal to the search key.
    Ceiling,
    /// Least key strictly greater than the search key.
    Higher,
}

impl Relation {
    /// Returns the relation to use against the backing tree when a view
    /// iterates in the given direction. Descending views swap the sides.
    #[inline]
    pub(crate) const fn for_order(self, ascending: bool) -> Self {
        if ascending {
            return self;
        }
        match self {
            Self::Lower => Self::Higher,
            Self::Floor => Self::Ceiling,
            Self::Equal => Self::Equal,
            Self::Ceiling => Self::Floor,
            Self::Higher => Self::Lower,
        }
    }

    /// `true` for relations that look at keys below the search key.
    #[inline]
    pub(crate) const fn looks_down(self) -> bool {
        matches!(self, Self::Lower | Self::Floor)
    }

    /// `true` for relations that look at keys above the search key.
    #[inline]
    pub(crate) const fn looks_up(self) -> bool {
        matches!(self, Self::Ceiling | Self::Higher)
    }
}
