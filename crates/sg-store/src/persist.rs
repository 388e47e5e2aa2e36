//! JSON save/restore of a [`Snapshot`].
//!
//! Only entities are written: intersections in `NodeId` order, segments by
//! endpoint osmid, addresses and POIs with their associations.  Indexes are
//! rebuilt on restore when the saved snapshot was provisioned.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::info;

use sg_core::{GeoPoint, NodeId, PlaceKey};
use sg_network::{Intersection, IntersectionAttrs, SegmentAttrs};
use sg_text::Bm25Params;

use crate::places::{Address, AddressRecord, PoiRecord, PointOfInterest};
use crate::{Snapshot, StoreError, StoreResult};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SegmentRow {
    from:      i64,
    to:        i64,
    osmid:     i64,
    oneway:    bool,
    lanes:     Option<String>,
    reference: Option<String>,
    name:      Option<String>,
    highway:   Option<String>,
    max_speed: Option<String>,
    length:    f64,
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version:       u32,
    provisioned:   bool,
    bm25_k1:       f64,
    bm25_b:        f64,
    intersections: Vec<&'a Intersection>,
    segments:      Vec<SegmentRow>,
    addresses:     Vec<&'a Address>,
    pois:          Vec<&'a PointOfInterest>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version:       u32,
    provisioned:   bool,
    bm25_k1:       f64,
    bm25_b:        f64,
    intersections: Vec<Intersection>,
    segments:      Vec<SegmentRow>,
    addresses:     Vec<Address>,
    pois:          Vec<PointOfInterest>,
}

/// Write `snapshot` as JSON.
pub fn save<W: Write>(snapshot: &Snapshot, writer: W) -> StoreResult<()> {
    let graph = snapshot.graph();
    let mut segments = Vec::with_capacity(graph.edge_count());
    for (_, s) in graph.segments() {
        let endpoint = |node: NodeId| {
            graph
                .intersection(node)
                .map(|n| n.osmid)
                .ok_or_else(|| StoreError::Inconsistent(format!("segment endpoint {node} missing")))
        };
        segments.push(SegmentRow {
            from:      endpoint(s.from)?,
            to:        endpoint(s.to)?,
            osmid:     s.osmid,
            oneway:    s.oneway,
            lanes:     s.lanes.clone(),
            reference: s.reference.clone(),
            name:      s.name.clone(),
            highway:   s.highway.clone(),
            max_speed: s.max_speed.clone(),
            length:    s.length,
        });
    }

    let params = snapshot.text_params();
    let out = SnapshotOut {
        version:       FORMAT_VERSION,
        provisioned:   snapshot.is_provisioned(),
        bm25_k1:       params.k1,
        bm25_b:        params.b,
        intersections: graph.intersections().map(|(_, n)| n).collect(),
        segments,
        addresses:     snapshot.addresses().collect(),
        pois:          snapshot.pois().collect(),
    };
    serde_json::to_writer(writer, &out)?;
    Ok(())
}

/// Read a snapshot written by [`save`].
pub fn restore<R: Read>(reader: R) -> StoreResult<Snapshot> {
    let file: SnapshotIn = serde_json::from_reader(reader)?;
    if file.version != FORMAT_VERSION {
        return Err(StoreError::Inconsistent(format!(
            "unsupported snapshot version {} (expected {FORMAT_VERSION})",
            file.version
        )));
    }

    let mut snapshot = Snapshot::new(Bm25Params { k1: file.bm25_k1, b: file.bm25_b });

    for (i, n) in file.intersections.into_iter().enumerate() {
        let osmid = n.osmid;
        let outcome = snapshot.upsert_intersection(
            Some(osmid),
            IntersectionAttrs {
                location:     Some(n.location),
                reference:    n.reference,
                highway:      n.highway,
                street_count: n.street_count,
            },
        )?;
        // Associations refer to NodeIds, so the dense order must replay exactly.
        match outcome {
            Some(u) if u.is_created() && u.id().index() == i => {}
            _ => {
                return Err(StoreError::Inconsistent(format!(
                    "intersection osmid {osmid} is duplicated or out of order"
                )))
            }
        }
    }

    for s in file.segments {
        snapshot.upsert_segment(
            s.from,
            s.to,
            Some(s.osmid),
            SegmentAttrs {
                oneway:    s.oneway,
                lanes:     s.lanes,
                reference: s.reference,
                name:      s.name,
                highway:   s.highway,
                max_speed: s.max_speed,
                length:    s.length,
            },
        )?;
    }

    for a in file.addresses {
        check_location(a.location)?;
        let id = a.id;
        snapshot.upsert_address(AddressRecord { id, location: a.location, tags: a.tags });
        if let Some(association) = a.nearest {
            snapshot.associate(PlaceKey::address(id), association)?;
        }
    }

    for p in file.pois {
        check_location(p.location)?;
        let id = p.id;
        snapshot.upsert_poi(PoiRecord {
            id,
            name:       p.name,
            location:   p.location,
            categories: p.categories,
            tags:       p.tags,
        });
        if let Some(association) = p.nearest {
            snapshot.associate(PlaceKey::poi(id), association)?;
        }
    }

    if file.provisioned {
        snapshot.provision();
    }

    let stats = snapshot.stats();
    info!(
        intersections = stats.intersections,
        segments = stats.segments,
        addresses = stats.addresses,
        pois = stats.pois,
        provisioned = stats.provisioned,
        "snapshot restored"
    );
    Ok(snapshot)
}

fn check_location(p: GeoPoint) -> StoreResult<()> {
    if p.is_valid() {
        Ok(())
    } else {
        Err(StoreError::Inconsistent(format!("invalid location ({}, {})", p.lat, p.lon)))
    }
}
