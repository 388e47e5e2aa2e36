//! Strongly typed identifiers.
//!
//! Internal graph handles (`NodeId`, `EdgeId`) are dense `u32` indices into
//! the store's `Vec`s and are never exposed to callers; external identity is
//! always the OSM integer id (`osmid` for intersections, `id` for places).
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID", equal to `u32::MAX`.
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
    /// Index of an intersection in the graph store.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a road segment in the graph store.
    pub struct EdgeId(u32);
}

// ── Places ────────────────────────────────────────────────────────────────────

/// The two searchable, associable entity kinds.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaceKind {
    Address,
    PointOfInterest,
}

impl PlaceKind {
    /// Label rendered in query results.
    pub fn label(self) -> &'static str {
        match self {
            PlaceKind::Address => "Address",
            PlaceKind::PointOfInterest => "PointOfInterest",
        }
    }
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// External identity of an Address or POI.
///
/// Address and POI ids live in separate namespaces (the same OSM node can be
/// both), so the kind is part of the key.  Ordering is id first, then kind,
/// which is the stable secondary key used by search ranking.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceKey {
    pub id:   i64,
    pub kind: PlaceKind,
}

impl PlaceKey {
    #[inline]
    pub fn address(id: i64) -> Self {
        Self { id, kind: PlaceKind::Address }
    }

    #[inline]
    pub fn poi(id: i64) -> Self {
        Self { id, kind: PlaceKind::PointOfInterest }
    }
}

impl fmt::Display for PlaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}
