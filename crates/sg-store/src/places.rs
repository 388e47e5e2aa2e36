//! Address and point-of-interest entities.
//!
//! Both are detached from the road graph; their only link to it is the
//! derived [`Association`] (the `NEAREST_INTERSECTION` edge) created by the
//! association builder.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use sg_core::tags::tag_text;
use sg_core::{GeoPoint, NodeId, Tags};

/// Country segment appended to every formatted address.
pub const COUNTRY_SUFFIX: &str = "Czech Republic";

/// Underscore-normalized OSM address tag keys.
pub const TAG_STREET: &str = "addr_street";
pub const TAG_HOUSENUMBER: &str = "addr_housenumber";
pub const TAG_CITY: &str = "addr_city";
pub const TAG_POSTCODE: &str = "addr_postcode";

/// Derived nearest-intersection edge.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub intersection: NodeId,
    /// Great-circle distance to the intersection, metres.
    pub length: f64,
}

// ── Address ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id:           i64,
    pub location:     GeoPoint,
    pub full_address: String,
    pub tags:         Tags,
    pub nearest:      Option<Association>,
}

/// One address row after coercion.
#[derive(Clone, Debug, PartialEq)]
pub struct AddressRecord {
    pub id:       i64,
    pub location: GeoPoint,
    pub tags:     Tags,
}

/// `"{street} {housenumber} {city}, {postcode}, Czech Republic"`.
///
/// Missing components stay as empty segments, so the separators are always
/// present.
pub fn format_full_address(tags: &Tags) -> String {
    let part = |key: &str| tag_text(tags, key).unwrap_or_default();
    format!(
        "{} {} {}, {}, {COUNTRY_SUFFIX}",
        part(TAG_STREET),
        part(TAG_HOUSENUMBER),
        part(TAG_CITY),
        part(TAG_POSTCODE),
    )
}

// ── PointOfInterest ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id:         i64,
    pub name:       String,
    pub location:   GeoPoint,
    /// `{class, subclass}` minus empty values.
    pub categories: BTreeSet<String>,
    pub tags:       Tags,
    pub nearest:    Option<Association>,
}

/// One POI row after coercion.
#[derive(Clone, Debug, PartialEq)]
pub struct PoiRecord {
    pub id:         i64,
    pub name:       String,
    pub location:   GeoPoint,
    pub categories: BTreeSet<String>,
    pub tags:       Tags,
}
