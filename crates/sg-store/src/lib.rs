//! `sg-store` — the in-memory state the engine publishes to readers.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`places`]   | `Address`, `PointOfInterest`, `Association`, record types |
//! | [`snapshot`] | `Snapshot` (graph + catalog + `Indexes`), `SchemaReport`  |
//! | [`persist`]  | JSON save/restore of entity stores                        |
//! | `pages`      | copy-on-write paged place storage                         |
//! | [`error`]    | `StoreError`, `StoreResult<T>`                            |
//!
//! A `Snapshot` is a plain value: cloning it yields an independent staging
//! copy, which is how writers prepare the next published state.  Clones
//! share unchanged components (see [`snapshot`]).

pub mod error;
mod pages;
pub mod persist;
pub mod places;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use error::{StoreError, StoreResult};
pub use persist::{restore, save};
pub use places::{
    format_full_address, Address, AddressRecord, Association, PointOfInterest, PoiRecord,
    COUNTRY_SUFFIX,
};
pub use snapshot::{Indexes, SchemaReport, Snapshot, SnapshotStats};
