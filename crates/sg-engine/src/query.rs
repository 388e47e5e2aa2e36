//! Query façade: text search, routing and spatial range queries.
//!
//! Every query works on one snapshot obtained at its start and never
//! mutates it.  Parameters are validated before any index is consulted.

use std::time::{Duration, Instant};

use tracing::warn;

use sg_core::{BoundingBox, GeoPoint, NodeId, PlaceKind};
use sg_network::{NetworkError, Router};
use sg_store::{Association, Snapshot};

use crate::output::{AddressInfo, AddressOption, PointNode, PointOfInterest, Route};
use crate::{Engine, EngineError, EngineResult};

impl<R: Router> Engine<R> {
    // ── Text search ───────────────────────────────────────────────────────

    /// Top `limit` addresses and POIs for `query`, best match first.
    ///
    /// A query without indexable words matches nothing.
    pub fn search_text(&self, query: &str, limit: usize) -> EngineResult<Vec<AddressOption>> {
        if limit == 0 {
            return Err(EngineError::InvalidQuery("limit must be > 0".into()));
        }
        let snapshot = self.snapshot()?;
        let indexes = snapshot.require_indexes()?;

        let hits = indexes.text.search(query, limit);
        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            let value = match hit.key.kind {
                PlaceKind::Address => snapshot.address(hit.key.id).map(|a| a.full_address.clone()),
                PlaceKind::PointOfInterest => snapshot.poi(hit.key.id).map(|p| p.name.clone()),
            };
            // Index and catalog are published together.
            let Some(value) = value else { continue };
            out.push(AddressOption {
                value,
                score: hit.score,
                label: hit.key.kind.label().to_string(),
                id: hit.key.id,
            });
        }
        Ok(out)
    }

    /// [`Engine::search_text`] with the configured default limit.
    pub fn search_text_default(&self, query: &str) -> EngineResult<Vec<AddressOption>> {
        self.search_text(query, self.config().default_search_limit)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Shortest route between two places.
    ///
    /// Each id is resolved as an address, then a POI, then an intersection
    /// osmid.  Addresses and POIs start from their nearest intersection.
    /// Disconnected endpoints yield an empty route.
    pub fn route(&self, source: i64, dest: i64) -> EngineResult<Route> {
        self.route_until(source, dest, None)
    }

    /// [`Engine::route`] bounded by `timeout`; fails with `Timeout` instead of
    /// returning a partial route.
    pub fn route_with_deadline(&self, source: i64, dest: i64, timeout: Duration) -> EngineResult<Route> {
        self.route_until(source, dest, Instant::now().checked_add(timeout))
    }

    fn route_until(&self, source: i64, dest: i64, deadline: Option<Instant>) -> EngineResult<Route> {
        let snapshot = self.snapshot()?;
        let from = resolve_endpoint(&snapshot, source)?;
        let to = resolve_endpoint(&snapshot, dest)?;
        let graph = snapshot.graph();

        let path = match self.router().route(graph, from, to, deadline) {
            Ok(path) => path,
            Err(NetworkError::Timeout { settled }) => {
                warn!(source, dest, settled, "route search timed out");
                return Err(EngineError::Timeout);
            }
            Err(e) => return Err(e.into()),
        };

        let route = path
            .nodes
            .iter()
            .filter_map(|&n| graph.intersection(n))
            .map(|n| PointNode { lat: n.location.lat, lon: n.location.lon })
            .collect();
        Ok(Route { route, length: path.length })
    }

    // ── Range queries ─────────────────────────────────────────────────────

    /// POIs strictly closer than `radius_m` to the center, ordered by id.
    pub fn poi_in_circle(&self, lat: f64, lon: f64, radius_m: f64) -> EngineResult<Vec<PointOfInterest>> {
        let center = circle_params(lat, lon, radius_m)?;
        let snapshot = self.snapshot()?;
        let ids = snapshot
            .require_indexes()?
            .pois
            .range_circle(center, radius_m)
            .into_iter()
            .map(|n| n.item)
            .collect();
        Ok(pois_by_id(&snapshot, ids))
    }

    /// POIs inside the closed box, ordered by id.
    pub fn poi_in_bbox(
        &self,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    ) -> EngineResult<Vec<PointOfInterest>> {
        let bbox = BoundingBox::new(lat_min, lat_max, lon_min, lon_max)?;
        let snapshot = self.snapshot()?;
        let ids = snapshot
            .require_indexes()?
            .pois
            .range_bbox(&bbox)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        Ok(pois_by_id(&snapshot, ids))
    }

    /// Addresses strictly closer than `radius_m` to the center, ordered by id.
    pub fn addresses_in_circle(&self, lat: f64, lon: f64, radius_m: f64) -> EngineResult<Vec<AddressInfo>> {
        let center = circle_params(lat, lon, radius_m)?;
        let snapshot = self.snapshot()?;
        let mut ids: Vec<i64> = snapshot
            .require_indexes()?
            .addresses
            .range_circle(center, radius_m)
            .into_iter()
            .map(|n| n.item)
            .collect();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .filter_map(|id| snapshot.address(id))
            .map(|a| AddressInfo::new(a, &snapshot))
            .collect())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn resolve_endpoint(snapshot: &Snapshot, id: i64) -> EngineResult<NodeId> {
    let nearest = |association: Option<Association>| {
        association
            .map(|a| a.intersection)
            .ok_or(EngineError::UnroutableEndpoint { id })
    };
    if let Some(a) = snapshot.address(id) {
        return nearest(a.nearest);
    }
    if let Some(p) = snapshot.poi(id) {
        return nearest(p.nearest);
    }
    snapshot
        .graph()
        .node_by_osmid(id)
        .ok_or_else(|| EngineError::NotFound(format!("no address, POI or intersection with id {id}")))
}

fn circle_params(lat: f64, lon: f64, radius_m: f64) -> EngineResult<GeoPoint> {
    let center = GeoPoint::checked(lat, lon)?;
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(EngineError::InvalidQuery(format!(
            "radius must be a finite, non-negative distance, got {radius_m}"
        )));
    }
    Ok(center)
}

fn pois_by_id(snapshot: &Snapshot, mut ids: Vec<i64>) -> Vec<PointOfInterest> {
    ids.sort_unstable();
    ids.into_iter()
        .filter_map(|id| snapshot.poi(id))
        .map(PointOfInterest::from)
        .collect()
}
