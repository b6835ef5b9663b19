//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into the stores' `Vec`s, but callers should prefer the
//! `.index()` helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" (`u32::MAX`).
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a street vertex in the vertex store.
    pub struct VertexId(u32);
}

typed_id! {
    /// Index of a directed street edge in the edge store.
    ///
    /// Edges come in pairs: the even id is the forward traversal of a
    /// segment, the odd id right after it is the backward traversal.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Index of a routing state in a router's per-query arena.
    pub struct StateId(u32);
}

impl EdgeId {
    /// The edge traversing the same segment in the opposite direction.
    #[inline(always)]
    pub fn partner(self) -> EdgeId {
        EdgeId(self.0 ^ 1)
    }

    /// `true` for the forward (even) edge of a pair.
    #[inline(always)]
    pub fn is_forward(self) -> bool {
        self.0 & 1 == 0
    }

    /// The forward edge of this edge's pair.
    #[inline(always)]
    pub fn forward(self) -> EdgeId {
        EdgeId(self.0 & !1)
    }
}
