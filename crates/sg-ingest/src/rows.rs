//! Typed rows for the four record kinds.
//!
//! | Kind            | Key        | Required                    | Optional                                   |
//! |-----------------|------------|-----------------------------|--------------------------------------------|
//! | `Intersection`  | `osmid`    | `y`, `x`                    | `ref`, `highway`, `street_count`           |
//! | `Segment`       | `osmid`    | `u`, `v`, `length`          | `oneway`, `lanes`, `ref`, `name`, `highway`, `maxspeed` |
//! | `Address`       | `id`       | `lat`, `lon`                | `tags`                                     |
//! | `PointOfInterest` | `id`     | `lat`, `lon`                | `name`, `class`, `subclass`, `tags`        |
//!
//! A missing or unparseable key is [`RowError::MissingKey`]; any other bad
//! field is [`RowError::Malformed`].  The one exception is a segment `osmid`
//! that is present but not an integer (osmnx writes merged ways as a list):
//! it becomes [`MISSING_SEGMENT_OSMID`](sg_network::MISSING_SEGMENT_OSMID).

use std::collections::BTreeSet;

use sg_core::GeoPoint;
use sg_network::{IntersectionAttrs, SegmentAttrs};
use sg_store::{AddressRecord, PoiRecord};

use crate::error::{RowError, RowResult};
use crate::record::{bool_field, float_field, int_field, tags_field, text_field, Record};

/// The four ingestion record types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Intersection,
    Segment,
    Address,
    PointOfInterest,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Intersection => "intersection",
            RecordKind::Segment => "road segment",
            RecordKind::Address => "address",
            RecordKind::PointOfInterest => "point of interest",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionRow {
    pub osmid: i64,
    pub attrs: IntersectionAttrs,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRow {
    pub from:  i64,
    pub to:    i64,
    /// `None` when the way id was present but not a single integer.
    pub osmid: Option<i64>,
    pub attrs: SegmentAttrs,
}

fn key(rec: &Record, field: &'static str) -> RowResult<i64> {
    int_field(rec, field).ok().flatten().ok_or(RowError::MissingKey { field })
}

fn location(rec: &Record, lat_key: &'static str, lon_key: &'static str) -> RowResult<GeoPoint> {
    let lat = float_field(rec, lat_key)?
        .ok_or_else(|| RowError::malformed(lat_key, "missing coordinate"))?;
    let lon = float_field(rec, lon_key)?
        .ok_or_else(|| RowError::malformed(lon_key, "missing coordinate"))?;
    GeoPoint::checked(lat, lon).map_err(|e| RowError::malformed(lat_key, e.to_string()))
}

pub fn intersection_row(rec: &Record) -> RowResult<IntersectionRow> {
    let osmid = key(rec, "osmid")?;
    let location = location(rec, "y", "x")?;
    let street_count = int_field(rec, "street_count")?
        .map(|n| {
            u32::try_from(n).map_err(|_| RowError::malformed("street_count", format!("out of range: {n}")))
        })
        .transpose()?;
    Ok(IntersectionRow {
        osmid,
        attrs: IntersectionAttrs {
            location: Some(location),
            reference: text_field(rec, "ref"),
            highway: text_field(rec, "highway"),
            street_count,
        },
    })
}

pub fn segment_row(rec: &Record) -> RowResult<SegmentRow> {
    let from = key(rec, "u")?;
    let to = key(rec, "v")?;
    if text_field(rec, "osmid").is_none() {
        return Err(RowError::MissingKey { field: "osmid" });
    }
    let osmid = int_field(rec, "osmid").ok().flatten();

    let length = float_field(rec, "length")?
        .ok_or_else(|| RowError::malformed("length", "missing"))?;
    if !length.is_finite() || length < 0.0 {
        return Err(RowError::malformed("length", format!("must be finite and >= 0, got {length}")));
    }

    Ok(SegmentRow {
        from,
        to,
        osmid,
        attrs: SegmentAttrs {
            oneway: bool_field(rec, "oneway")?.unwrap_or(false),
            lanes: text_field(rec, "lanes"),
            reference: text_field(rec, "ref"),
            name: text_field(rec, "name"),
            highway: text_field(rec, "highway"),
            max_speed: text_field(rec, "maxspeed"),
            length,
        },
    })
}

pub fn address_row(rec: &Record) -> RowResult<AddressRecord> {
    let id = key(rec, "id")?;
    let location = location(rec, "lat", "lon")?;
    let tags = tags_field(rec, "tags")?;
    Ok(AddressRecord { id, location, tags })
}

pub fn poi_row(rec: &Record) -> RowResult<PoiRecord> {
    let id = key(rec, "id")?;
    let location = location(rec, "lat", "lon")?;
    let tags = tags_field(rec, "tags")?;
    let categories: BTreeSet<String> =
        ["class", "subclass"].into_iter().filter_map(|k| text_field(rec, k)).collect();
    Ok(PoiRecord {
        id,
        name: text_field(rec, "name").unwrap_or_default(),
        location,
        categories,
        tags,
    })
}
