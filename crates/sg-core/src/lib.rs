//! `sg-core` — foundational types for the `streetgraph` query engine.
//!
//! This crate is a dependency of every other `sg-*` crate.  It intentionally
//! has no `sg-*` dependencies and minimal external ones (only `thiserror` and
//! `serde_json`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`, `PlaceKind`, `PlaceKey`               |
//! | [`geo`]     | `GeoPoint`, haversine distance, `BoundingBox`             |
//! | [`tags`]    | `Tags` map and string coercion helpers                    |
//! | [`config`]  | `EngineConfig` (batch sizes, association bound, BM25)     |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `sg-store` snapshot persistence.               |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod tags;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{BoundingBox, GeoPoint};
pub use ids::{EdgeId, NodeId, PlaceKey, PlaceKind};
pub use tags::Tags;
