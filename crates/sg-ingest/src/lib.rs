//! `sg-ingest` — turning flat source records into a populated [`Snapshot`].
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`record`]    | `Record` and lenient field coercion                        |
//! | [`tagblob`]   | JSON / Python-literal tag map parser                        |
//! | [`source`]    | `CsvSource`: CSV rows as records                           |
//! | [`rows`]      | `RecordKind` and per-kind typed rows                       |
//! | [`loader`]    | `BulkLoader`, `Publisher`, `LoadReport`                    |
//! | [`associate`] | `AssociationBuilder`, `AssociationReport`                  |
//! | [`error`]     | `RowError` (per-row skip), `IngestError` (dropped batch)   |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Rayon-parallel nearest-intersection lookups.            |
//!
//! [`Snapshot`]: sg_store::Snapshot

pub mod associate;
pub mod error;
pub mod loader;
pub mod record;
pub mod rows;
pub mod source;
pub mod tagblob;


pub use associate::{AssociationBuilder, AssociationReport};
pub use error::{IngestError, IngestResult, RowError, RowResult};
pub use loader::{BulkLoader, LoadReport, Publisher};
pub use record::Record;
pub use rows::RecordKind;
pub use source::CsvSource;
pub use tagblob::{parse_tag_blob, TagBlobError};
