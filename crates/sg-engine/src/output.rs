//! Entity-shaped query results.
//!
//! Plain serializable records, detached from the snapshot they were read
//! from, ready for a JSON envelope.

use serde::{Deserialize, Serialize};

use sg_core::Tags;
use sg_network::Intersection;
use sg_store::{Address, PointOfInterest as StoredPoi, Snapshot};

/// One text search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressOption {
    /// `full_address` for addresses, `name` for POIs.
    pub value: String,
    pub score: f64,
    /// `"Address"` or `"PointOfInterest"`.
    pub label: String,
    pub id:    i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id:         i64,
    pub latitude:   f64,
    pub longitude:  f64,
    pub name:       String,
    /// Sorted.
    pub categories: Vec<String>,
    pub tags:       Tags,
}

impl From<&StoredPoi> for PointOfInterest {
    fn from(p: &StoredPoi) -> Self {
        Self {
            id:         p.id,
            latitude:   p.location.lat,
            longitude:  p.location.lon,
            name:       p.name.clone(),
            categories: p.categories.iter().cloned().collect(),
            tags:       p.tags.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointNode {
    pub lat: f64,
    pub lon: f64,
}

/// Route as a coordinate sequence.  Empty when no path exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route:  Vec<PointNode>,
    /// Summed segment length in metres.
    pub length: f64,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionInfo {
    pub osmid:        i64,
    pub latitude:     f64,
    pub longitude:    f64,
    pub reference:    Option<String>,
    pub highway:      Option<String>,
    pub street_count: Option<u32>,
}

impl From<&Intersection> for IntersectionInfo {
    fn from(n: &Intersection) -> Self {
        Self {
            osmid:        n.osmid,
            latitude:     n.location.lat,
            longitude:    n.location.lon,
            reference:    n.reference.clone(),
            highway:      n.highway.clone(),
            street_count: n.street_count,
        }
    }
}

/// The nearest-intersection association of a place.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearestIntersection {
    pub osmid:  i64,
    /// Metres.
    pub length: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub id:           i64,
    pub latitude:     f64,
    pub longitude:    f64,
    pub full_address: String,
    pub tags:         Tags,
    pub nearest:      Option<NearestIntersection>,
}

impl AddressInfo {
    pub(crate) fn new(a: &Address, snapshot: &Snapshot) -> Self {
        let nearest = a.nearest.and_then(|n| {
            let osmid = snapshot.graph().intersection(n.intersection)?.osmid;
            Some(NearestIntersection { osmid, length: n.length })
        });
        Self {
            id:           a.id,
            latitude:     a.location.lat,
            longitude:    a.location.lon,
            full_address: a.full_address.clone(),
            tags:         a.tags.clone(),
            nearest,
        }
    }
}
