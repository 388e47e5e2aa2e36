//! `sg-text` — ranked full-text search over addresses and POIs.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`analyzer`] | `Analyzer`: Unicode word split + lower-casing          |
//! | [`index`]    | `TextIndex` (term → postings), `Bm25Params`, `ScoredDoc` |
//!
//! Only [`sg_core::PlaceKey`] documents are indexed; intersections and road
//! segments are never searchable.

pub mod analyzer;
pub mod index;


pub use analyzer::Analyzer;
pub use index::{Bm25Params, ScoredDoc, TextIndex};
