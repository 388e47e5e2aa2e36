//! `sg-spatial` — geodesic point index.
//!
//! An R-tree (via `rstar`) keyed by `[lat, lon]` answers three questions over
//! a growing point set: the `k` nearest points, all points inside a circle,
//! and all points inside a closed box.  Distances are great-circle metres
//! (see [`sg_core::GeoPoint::distance_m`]), never planar degrees: the tree is
//! only used to narrow the candidate set.
//!
//! | Query                         | Semantics                                   |
//! |-------------------------------|---------------------------------------------|
//! | [`SpatialIndex::nearest`]     | ascending distance, ties by insertion order, strictly `< max_distance` |
//! | [`SpatialIndex::range_circle`]| distance strictly `< radius`                |
//! | [`SpatialIndex::range_bbox`]  | closed box on both axes                     |

pub mod index;

#[cfg(test)]
mod tests;

pub use index::{Neighbor, SpatialIndex};
