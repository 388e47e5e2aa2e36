//! The engine's complete state at one point in time.
//!
//! # Provisioning
//!
//! Uniqueness of `Intersection.osmid`, `Address.id` and `PointOfInterest.id`
//! is structural (keyed maps) and always enforced.  The spatial and text
//! indexes only exist after [`Snapshot::provision`]; from then on every
//! upsert keeps them current.  Provisioning an already provisioned snapshot
//! is a no-op.
//!
//! # Sharing
//!
//! The graph, each index, the id maps and the place pages sit behind `Arc`.
//! A clone shares all of them and a write copies only the component it
//! touches, so staging the next batch costs what the batch changes.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use sg_core::tags::merge_tags;
use sg_core::{EdgeId, GeoPoint, NodeId, PlaceKey, PlaceKind};
use sg_network::{GraphStore, IntersectionAttrs, NetworkError, NetworkResult, SegmentAttrs, Upsert};
use sg_spatial::SpatialIndex;
use sg_text::{Bm25Params, TextIndex};

use crate::pages::Pages;
use crate::places::{
    format_full_address, Address, AddressRecord, Association, PoiRecord, PointOfInterest,
};
use crate::{StoreError, StoreResult};

// ── Indexes ───────────────────────────────────────────────────────────────────

/// Derived lookup structures.  Rebuildable at any time from the entities.
#[derive(Clone)]
pub struct Indexes {
    pub intersections: Arc<SpatialIndex<NodeId>>,
    pub addresses:     Arc<SpatialIndex<i64>>,
    pub pois:          Arc<SpatialIndex<i64>>,
    pub text:          Arc<TextIndex>,
}

/// Constraints and indexes in place after provisioning.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaReport {
    pub constraints: Vec<&'static str>,
    pub indexes:     Vec<&'static str>,
    /// `false` if everything already existed.
    pub created:     bool,
}

/// Entity counts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub intersections:        usize,
    pub segments:             usize,
    pub addresses:            usize,
    pub pois:                 usize,
    pub associated_addresses: usize,
    pub associated_pois:      usize,
    pub provisioned:          bool,
}

impl SchemaReport {
    /// The schema in place once provisioned.
    pub fn new(created: bool) -> Self {
        Self {
            constraints: CONSTRAINTS.to_vec(),
            indexes: INDEXES.to_vec(),
            created,
        }
    }
}

const CONSTRAINTS: [&str; 3] = [
    "UNIQUE Intersection.osmid",
    "UNIQUE Address.id",
    "UNIQUE PointOfInterest.id",
];

const INDEXES: [&str; 4] = [
    "POINT Intersection.location",
    "POINT Address.location",
    "POINT PointOfInterest.location",
    "FULLTEXT Address.full_address, PointOfInterest.name",
];

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Snapshot {
    graph: Arc<GraphStore>,

    addresses:     Pages<Address>,
    address_slots: Arc<FxHashMap<i64, usize>>,

    pois:      Pages<PointOfInterest>,
    poi_slots: Arc<FxHashMap<i64, usize>>,

    indexes:     Option<Indexes>,
    text_params: Bm25Params,
}

impl Snapshot {
    /// Empty, unprovisioned snapshot whose text index (once provisioned)
    /// uses `text_params`.
    pub fn new(text_params: Bm25Params) -> Self {
        Self { text_params, ..Self::default() }
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn indexes(&self) -> Option<&Indexes> {
        self.indexes.as_ref()
    }

    /// Indexes, or [`StoreError::NotProvisioned`].
    pub fn require_indexes(&self) -> StoreResult<&Indexes> {
        self.indexes.as_ref().ok_or(StoreError::NotProvisioned)
    }

    pub fn is_provisioned(&self) -> bool {
        self.indexes.is_some()
    }

    pub fn text_params(&self) -> Bm25Params {
        self.text_params
    }

    pub fn address(&self, id: i64) -> Option<&Address> {
        self.address_slots.get(&id).and_then(|&slot| self.addresses.get(slot))
    }

    pub fn poi(&self, id: i64) -> Option<&PointOfInterest> {
        self.poi_slots.get(&id).and_then(|&slot| self.pois.get(slot))
    }

    /// All addresses in first-ingestion order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> + '_ {
        self.addresses.iter()
    }

    /// All POIs in first-ingestion order.
    pub fn pois(&self) -> impl Iterator<Item = &PointOfInterest> + '_ {
        self.pois.iter()
    }

    /// The place's association; `Ok(None)` if it has none yet.
    pub fn association(&self, key: PlaceKey) -> StoreResult<Option<Association>> {
        match key.kind {
            PlaceKind::Address => self.address(key.id).map(|a| a.nearest),
            PlaceKind::PointOfInterest => self.poi(key.id).map(|p| p.nearest),
        }
        .ok_or(StoreError::PlaceNotFound(key))
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            intersections:        self.graph.node_count(),
            segments:             self.graph.edge_count(),
            addresses:            self.addresses.len(),
            pois:                 self.pois.len(),
            associated_addresses: self.addresses().filter(|a| a.nearest.is_some()).count(),
            associated_pois:      self.pois().filter(|p| p.nearest.is_some()).count(),
            provisioned:          self.is_provisioned(),
        }
    }

    // ── Schema ────────────────────────────────────────────────────────────

    /// Build the spatial and text indexes from the current entities unless
    /// they already exist.
    pub fn provision(&mut self) -> SchemaReport {
        let created = self.indexes.is_none();
        if created {
            self.indexes = Some(self.build_indexes());
            debug!(
                intersections = self.graph.node_count(),
                addresses = self.addresses.len(),
                pois = self.pois.len(),
                "indexes provisioned"
            );
        }
        SchemaReport::new(created)
    }

    fn build_indexes(&self) -> Indexes {
        let mut text = TextIndex::new(self.text_params);
        for a in self.addresses() {
            text.upsert(PlaceKey::address(a.id), &a.full_address);
        }
        for p in self.pois() {
            text.upsert(PlaceKey::poi(p.id), &p.name);
        }
        Indexes {
            intersections: Arc::new(SpatialIndex::bulk_load(
                self.graph.intersections().map(|(id, n)| (n.location, id)),
            )),
            addresses: Arc::new(SpatialIndex::bulk_load(self.addresses().map(|a| (a.location, a.id)))),
            pois:      Arc::new(SpatialIndex::bulk_load(self.pois().map(|p| (p.location, p.id)))),
            text:      Arc::new(text),
        }
    }

    // ── Graph upserts ─────────────────────────────────────────────────────

    /// [`GraphStore::upsert_intersection`] plus spatial index maintenance.
    ///
    /// Moving an intersection drops every association pointing at it; the
    /// next association run finds those places a new nearest intersection.
    pub fn upsert_intersection(
        &mut self,
        osmid: Option<i64>,
        attrs: IntersectionAttrs,
    ) -> NetworkResult<Option<Upsert<NodeId>>> {
        let before = osmid
            .and_then(|o| self.graph.node_by_osmid(o))
            .and_then(|n| self.graph.intersection(n))
            .map(|n| n.location);

        let Some(outcome) = Arc::make_mut(&mut self.graph).upsert_intersection(osmid, attrs)? else {
            return Ok(None);
        };
        let node = outcome.id();
        let after = self.graph.intersection(node).map(|n| n.location);

        match (before, after) {
            (None, Some(after)) => {
                if let Some(indexes) = self.indexes.as_mut() {
                    Arc::make_mut(&mut indexes.intersections).insert(after, node);
                }
            }
            (Some(old), Some(after)) if old != after => {
                if let Some(indexes) = self.indexes.as_mut() {
                    Arc::make_mut(&mut indexes.intersections).relocate(node, old, after);
                }
                let dropped = self.detach_intersection(node);
                if dropped > 0 {
                    debug!(%node, dropped, "intersection moved, associations dropped");
                }
            }
            _ => {}
        }
        Ok(Some(outcome))
    }

    pub fn upsert_segment(
        &mut self,
        from_osmid: i64,
        to_osmid: i64,
        osmid: Option<i64>,
        attrs: SegmentAttrs,
    ) -> NetworkResult<Upsert<EdgeId>> {
        Arc::make_mut(&mut self.graph).upsert_segment(from_osmid, to_osmid, osmid, attrs)
    }

    // ── Place upserts ─────────────────────────────────────────────────────

    /// Create the address or merge into it: tags merge per key, the location
    /// is replaced and `full_address` is recomputed from the merged tags.
    ///
    /// Moving an address drops its association; it is recomputed by the next
    /// association run.
    pub fn upsert_address(&mut self, record: AddressRecord) -> Upsert<i64> {
        let id = record.id;
        let existing = self.address_slots.get(&id).and_then(|&slot| self.addresses.get_mut(slot));
        let outcome = match existing {
            Some(a) => {
                let old = a.location;
                merge_tags(&mut a.tags, record.tags);
                a.full_address = format_full_address(&a.tags);
                if old != record.location {
                    a.location = record.location;
                    a.nearest = None;
                    if let Some(indexes) = self.indexes.as_mut() {
                        Arc::make_mut(&mut indexes.addresses).relocate(id, old, record.location);
                    }
                }
                Upsert::Updated(id)
            }
            None => {
                let location = record.location;
                let slot = self.addresses.push(Address {
                    id,
                    location,
                    full_address: format_full_address(&record.tags),
                    tags: record.tags,
                    nearest: None,
                });
                Arc::make_mut(&mut self.address_slots).insert(id, slot);
                if let Some(indexes) = self.indexes.as_mut() {
                    Arc::make_mut(&mut indexes.addresses).insert(location, id);
                }
                Upsert::Created(id)
            }
        };

        let stored = self.address_slots.get(&id).and_then(|&slot| self.addresses.get(slot));
        if let (Some(indexes), Some(a)) = (self.indexes.as_mut(), stored) {
            Arc::make_mut(&mut indexes.text).upsert(PlaceKey::address(id), &a.full_address);
        }
        outcome
    }

    /// Create the POI or merge into it: name, location and categories are
    /// replaced, tags merge per key.
    pub fn upsert_poi(&mut self, record: PoiRecord) -> Upsert<i64> {
        let id = record.id;
        let existing = self.poi_slots.get(&id).and_then(|&slot| self.pois.get_mut(slot));
        let outcome = match existing {
            Some(p) => {
                let old = p.location;
                p.name = record.name;
                p.categories = record.categories;
                merge_tags(&mut p.tags, record.tags);
                if old != record.location {
                    p.location = record.location;
                    p.nearest = None;
                    if let Some(indexes) = self.indexes.as_mut() {
                        Arc::make_mut(&mut indexes.pois).relocate(id, old, record.location);
                    }
                }
                Upsert::Updated(id)
            }
            None => {
                let location = record.location;
                let slot = self.pois.push(PointOfInterest {
                    id,
                    name:       record.name,
                    location,
                    categories: record.categories,
                    tags:       record.tags,
                    nearest:    None,
                });
                Arc::make_mut(&mut self.poi_slots).insert(id, slot);
                if let Some(indexes) = self.indexes.as_mut() {
                    Arc::make_mut(&mut indexes.pois).insert(location, id);
                }
                Upsert::Created(id)
            }
        };

        let stored = self.poi_slots.get(&id).and_then(|&slot| self.pois.get(slot));
        if let (Some(indexes), Some(p)) = (self.indexes.as_mut(), stored) {
            Arc::make_mut(&mut indexes.text).upsert(PlaceKey::poi(id), &p.name);
        }
        outcome
    }

    // ── Associations ──────────────────────────────────────────────────────

    /// Places without an association, addresses first, each in ingestion
    /// order.
    pub fn unassociated(&self) -> Vec<(PlaceKey, GeoPoint)> {
        let addresses = self
            .addresses()
            .filter(|a| a.nearest.is_none())
            .map(|a| (PlaceKey::address(a.id), a.location));
        let pois = self
            .pois()
            .filter(|p| p.nearest.is_none())
            .map(|p| (PlaceKey::poi(p.id), p.location));
        addresses.chain(pois).collect()
    }

    /// Attach `association` to `key` unless it already has one.
    ///
    /// Returns `Ok(false)` for an already associated place (the existing edge
    /// is kept).
    pub fn associate(&mut self, key: PlaceKey, association: Association) -> StoreResult<bool> {
        if self.graph.intersection(association.intersection).is_none() {
            return Err(NetworkError::NodeNotFound(association.intersection).into());
        }
        if self.association(key)?.is_some() {
            return Ok(false);
        }
        let nearest = match key.kind {
            PlaceKind::Address => self
                .address_slots
                .get(&key.id)
                .and_then(|&slot| self.addresses.get_mut(slot))
                .map(|a| &mut a.nearest),
            PlaceKind::PointOfInterest => self
                .poi_slots
                .get(&key.id)
                .and_then(|&slot| self.pois.get_mut(slot))
                .map(|p| &mut p.nearest),
        }
        .ok_or(StoreError::PlaceNotFound(key))?;
        *nearest = Some(association);
        Ok(true)
    }

    /// Remove every association.  Returns how many were cleared.
    pub fn clear_associations(&mut self) -> usize {
        self.addresses.update_where(|a| a.nearest.is_some(), |a| a.nearest = None)
            + self.pois.update_where(|p| p.nearest.is_some(), |p| p.nearest = None)
    }

    /// Drop the associations that point at `node`.
    fn detach_intersection(&mut self, node: NodeId) -> usize {
        let stale = |nearest: &Option<Association>| nearest.is_some_and(|a| a.intersection == node);
        self.addresses.update_where(|a| stale(&a.nearest), |a| a.nearest = None)
            + self.pois.update_where(|p| stale(&p.nearest), |p| p.nearest = None)
    }
}
