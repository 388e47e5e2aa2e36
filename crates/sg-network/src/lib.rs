//! `sg-network` — road graph store and shortest-path routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `GraphStore`, `Intersection`, `RoadSegment`, upsert + adjacency |
//! | [`router`]  | `Router` trait, `Path`, `DijkstraRouter`                    |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on entity types.           |

pub mod error;
pub mod network;
pub mod router;


pub use error::{NetworkError, NetworkResult};
pub use network::{
    Direction, GraphStore, Intersection, IntersectionAttrs, RoadSegment, SegmentAttrs, Step,
    Upsert, MISSING_SEGMENT_OSMID,
};
pub use router::{DijkstraRouter, Path, Router};
