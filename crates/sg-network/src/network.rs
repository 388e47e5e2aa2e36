//! Road graph store.
//!
//! # Data layout
//!
//! Intersections and road segments live in dense `Vec`s indexed by `NodeId`
//! and `EdgeId`.  External identity (`osmid`) maps to the dense index through
//! `FxHashMap`s, which is also how upserts find the row to merge into.
//!
//! Unlike a CSR layout, adjacency is kept as per-node `Vec<EdgeId>` lists
//! (outgoing and incoming) because segments keep arriving batch after batch.
//! Lists preserve insertion order, which makes every traversal, and therefore
//! every route, deterministic for a given ingestion order.
//!
//! # Multigraph identity
//!
//! Parallel segments between the same pair of intersections are allowed.  A
//! segment is identified by `(from, to, osmid)`; re-ingesting that triple
//! updates the existing segment instead of adding a new one.  A missing OSM
//! way id is stored as [`MISSING_SEGMENT_OSMID`] so the key stays total.

use rustc_hash::FxHashMap;

use sg_core::{EdgeId, GeoPoint, NodeId};

use crate::{NetworkError, NetworkResult};

/// Stand-in for a road segment without a usable OSM way id.
pub const MISSING_SEGMENT_OSMID: i64 = -1;

// ── Entities ──────────────────────────────────────────────────────────────────

/// A road-network graph node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Intersection {
    pub osmid:        i64,
    pub location:     GeoPoint,
    pub reference:    Option<String>,
    pub highway:      Option<String>,
    pub street_count: Option<u32>,
}

/// Attributes carried by one intersection row.  `None` leaves the stored
/// value untouched on update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntersectionAttrs {
    pub location:     Option<GeoPoint>,
    pub reference:    Option<String>,
    pub highway:      Option<String>,
    pub street_count: Option<u32>,
}

/// A directed, weighted edge between two intersections.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSegment {
    pub osmid:     i64,
    pub from:      NodeId,
    pub to:        NodeId,
    /// `true`: traversable `from → to` only.
    pub oneway:    bool,
    pub lanes:     Option<String>,
    pub reference: Option<String>,
    pub name:      Option<String>,
    pub highway:   Option<String>,
    pub max_speed: Option<String>,
    /// Metres.  Always finite and non-negative; used as the routing weight.
    pub length:    f64,
}

/// Attributes carried by one road-segment row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentAttrs {
    pub oneway:    bool,
    pub lanes:     Option<String>,
    pub reference: Option<String>,
    pub name:      Option<String>,
    pub highway:   Option<String>,
    pub max_speed: Option<String>,
    pub length:    f64,
}

/// Whether an upsert created a new entity or merged into an existing one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Upsert<T> {
    Created(T),
    Updated(T),
}

impl<T: Copy> Upsert<T> {
    pub fn id(self) -> T {
        match self {
            Upsert::Created(id) | Upsert::Updated(id) => id,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, Upsert::Created(_))
    }
}

/// Adjacency view requested from [`GraphStore::neighbors`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Segments that can be driven away from the node: its outgoing segments
    /// plus incoming segments that are not one-way (walked backwards).
    Traversable,
    /// Every segment touching the node, regardless of direction.
    Incident,
}

/// One adjacency entry: the segment and the intersection on its far side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub edge: EdgeId,
    pub node: NodeId,
}

// ── GraphStore ────────────────────────────────────────────────────────────────

/// Directed weighted multigraph of intersections and road segments.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    intersections: Vec<Intersection>,
    segments:      Vec<RoadSegment>,

    out_edges: Vec<Vec<EdgeId>>,
    in_edges:  Vec<Vec<EdgeId>>,

    by_osmid:   FxHashMap<i64, NodeId>,
    by_segment: FxHashMap<(NodeId, NodeId, i64), EdgeId>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn edge_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// Dense handle of the intersection with OSM id `osmid`.
    #[inline]
    pub fn node_by_osmid(&self, osmid: i64) -> Option<NodeId> {
        self.by_osmid.get(&osmid).copied()
    }

    #[inline]
    pub fn intersection(&self, node: NodeId) -> Option<&Intersection> {
        self.intersections.get(node.index())
    }

    #[inline]
    pub fn segment(&self, edge: EdgeId) -> Option<&RoadSegment> {
        self.segments.get(edge.index())
    }

    /// All intersections in `NodeId` order.
    pub fn intersections(&self) -> impl Iterator<Item = (NodeId, &Intersection)> + '_ {
        self.intersections
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// All segments in `EdgeId` order.
    pub fn segments(&self) -> impl Iterator<Item = (EdgeId, &RoadSegment)> + '_ {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (EdgeId(i as u32), s))
    }

    // ── Upsert ────────────────────────────────────────────────────────────

    /// Create the intersection `osmid` or merge `attrs` into it.
    ///
    /// Rows without an osmid are a no-op (`Ok(None)`).  A location is required
    /// when the intersection does not exist yet.
    pub fn upsert_intersection(
        &mut self,
        osmid: Option<i64>,
        attrs: IntersectionAttrs,
    ) -> NetworkResult<Option<Upsert<NodeId>>> {
        let Some(osmid) = osmid else {
            return Ok(None);
        };

        if let Some(&node) = self.by_osmid.get(&osmid) {
            let n = &mut self.intersections[node.index()];
            if let Some(location) = attrs.location {
                n.location = location;
            }
            if attrs.reference.is_some() {
                n.reference = attrs.reference;
            }
            if attrs.highway.is_some() {
                n.highway = attrs.highway;
            }
            if attrs.street_count.is_some() {
                n.street_count = attrs.street_count;
            }
            return Ok(Some(Upsert::Updated(node)));
        }

        let location = attrs.location.ok_or(NetworkError::MissingLocation { osmid })?;
        let node = NodeId::try_from(self.intersections.len())
            .ok()
            .filter(|id| *id != NodeId::INVALID)
            .ok_or_else(|| NetworkError::Capacity("too many intersections".into()))?;

        self.intersections.push(Intersection {
            osmid,
            location,
            reference:    attrs.reference,
            highway:      attrs.highway,
            street_count: attrs.street_count,
        });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.by_osmid.insert(osmid, node);
        Ok(Some(Upsert::Created(node)))
    }

    /// Create or update the segment `(from_osmid → to_osmid, osmid)`.
    ///
    /// Both endpoints must already exist; otherwise the row is rejected with
    /// [`NetworkError::DanglingReference`] and the graph is left untouched.
    pub fn upsert_segment(
        &mut self,
        from_osmid: i64,
        to_osmid: i64,
        osmid: Option<i64>,
        attrs: SegmentAttrs,
    ) -> NetworkResult<Upsert<EdgeId>> {
        if !attrs.length.is_finite() || attrs.length < 0.0 {
            return Err(NetworkError::InvalidLength { length: attrs.length });
        }
        let from = self
            .node_by_osmid(from_osmid)
            .ok_or(NetworkError::DanglingReference { osmid: from_osmid })?;
        let to = self
            .node_by_osmid(to_osmid)
            .ok_or(NetworkError::DanglingReference { osmid: to_osmid })?;
        let osmid = osmid.unwrap_or(MISSING_SEGMENT_OSMID);

        let segment = RoadSegment {
            osmid,
            from,
            to,
            oneway:    attrs.oneway,
            lanes:     attrs.lanes,
            reference: attrs.reference,
            name:      attrs.name,
            highway:   attrs.highway,
            max_speed: attrs.max_speed,
            length:    attrs.length,
        };

        if let Some(&edge) = self.by_segment.get(&(from, to, osmid)) {
            self.segments[edge.index()] = segment;
            return Ok(Upsert::Updated(edge));
        }

        let edge = EdgeId::try_from(self.segments.len())
            .ok()
            .filter(|id| *id != EdgeId::INVALID)
            .ok_or_else(|| NetworkError::Capacity("too many road segments".into()))?;

        self.segments.push(segment);
        self.out_edges[from.index()].push(edge);
        self.in_edges[to.index()].push(edge);
        self.by_segment.insert((from, to, osmid), edge);
        Ok(Upsert::Created(edge))
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Adjacency of `node` in insertion order: outgoing segments first, then
    /// incoming ones.
    ///
    /// With [`Direction::Traversable`] incoming one-way segments are skipped,
    /// so the result is exactly the set of moves a vehicle can make.
    pub fn neighbors(
        &self,
        node: NodeId,
        direction: Direction,
    ) -> NetworkResult<impl Iterator<Item = Step> + '_> {
        let (out, inc) = match (self.out_edges.get(node.index()), self.in_edges.get(node.index())) {
            (Some(out), Some(inc)) => (out, inc),
            _ => return Err(NetworkError::NodeNotFound(node)),
        };

        let forward = out.iter().map(move |&edge| Step {
            edge,
            node: self.segments[edge.index()].to,
        });
        let backward = inc
            .iter()
            .filter(move |&&edge| {
                direction == Direction::Incident || !self.segments[edge.index()].oneway
            })
            .map(move |&edge| Step {
                edge,
                node: self.segments[edge.index()].from,
            });

        Ok(forward.chain(backward))
    }

    /// Out-degree of `node` counting only stored direction.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_edges.get(node.index()).map_or(0, Vec::len)
    }
}
