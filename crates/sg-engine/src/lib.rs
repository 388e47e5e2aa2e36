//! `sg-engine` — the geospatial graph query engine.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`engine`] | `Engine`: snapshot publication, loading, admin ops, lookups   |
//! | [`query`]  | search, route, POI circle/box and address circle queries      |
//! | [`output`] | serializable result records                                   |
//! | [`error`]  | `EngineError`, `EngineResult<T>`                              |
//!
//! # Typical lifecycle
//!
//! ```rust,ignore
//! let engine = Engine::new(EngineConfig::default())?;
//! engine.provision()?;
//! engine.load_csv(RecordKind::Intersection, &data.join("road_nodes.csv"))?;
//! engine.load_csv(RecordKind::Segment, &data.join("road_rels.csv"))?;
//! engine.load_csv(RecordKind::Address, &data.join("addresses.csv"))?;
//! engine.load_csv(RecordKind::PointOfInterest, &data.join("poi.csv"))?;
//! engine.associate()?;
//!
//! let options = engine.search_text("Hlavni 10", 25)?;
//! let route = engine.route(options[0].id, other_id)?;
//! let nearby = engine.poi_in_circle(50.087, 14.421, 300.0)?;
//! ```
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Rayon-parallel nearest-intersection lookups.            |

pub mod engine;
pub mod error;
pub mod output;
pub mod query;


pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use output::{
    AddressInfo, AddressOption, IntersectionInfo, NearestIntersection, PointNode, PointOfInterest,
    Route,
};

pub use sg_core::EngineConfig;
pub use sg_ingest::{AssociationReport, LoadReport, Record, RecordKind};
pub use sg_store::{SchemaReport, SnapshotStats};
