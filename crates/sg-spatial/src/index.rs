//! R-tree backed point index.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use sg_core::{BoundingBox, GeoPoint};

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a `[lat, lon]` point, the caller's payload and
/// an insertion sequence number used for stable tie-breaking.
#[derive(Clone, Debug, PartialEq)]
struct Entry<T> {
    point: [f64; 2], // [lat, lon]
    seq:   u64,
    item:  T,
}

impl<T> RTreeObject for Entry<T> {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl<T> PointDistance for Entry<T> {
    /// Squared Euclidean distance in lat/lon space.  Only used to seed the
    /// unbounded nearest search; results are re-ranked geodesically.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

impl<T> Entry<T> {
    #[inline]
    fn location(&self) -> GeoPoint {
        GeoPoint::new(self.point[0], self.point[1])
    }
}

// ── Neighbor ──────────────────────────────────────────────────────────────────

/// A query hit with its geodesic distance from the query point.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor<T> {
    pub item:       T,
    pub location:   GeoPoint,
    pub distance_m: f64,
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

/// Point index over payloads of type `T`.
///
/// Supports bulk load, incremental insertion after the bulk load, and moving
/// an existing payload to a new location (an upsert that changes
/// coordinates).  Nothing is ever removed otherwise.
#[derive(Clone)]
pub struct SpatialIndex<T> {
    tree:     RTree<Entry<T>>,
    next_seq: u64,
}

impl<T: Copy + PartialEq> SpatialIndex<T> {
    pub fn new() -> Self {
        Self { tree: RTree::new(), next_seq: 0 }
    }

    /// Build from a batch of points in one O(N log N) pass.  Insertion order
    /// is the order of `items`.
    pub fn bulk_load(items: impl IntoIterator<Item = (GeoPoint, T)>) -> Self {
        let entries: Vec<Entry<T>> = items
            .into_iter()
            .enumerate()
            .map(|(i, (location, item))| Entry {
                point: location.as_array(),
                seq:   i as u64,
                item,
            })
            .collect();
        let next_seq = entries.len() as u64;
        Self { tree: RTree::bulk_load(entries), next_seq }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Add a point.  It ranks after every point inserted earlier on ties.
    pub fn insert(&mut self, location: GeoPoint, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tree.insert(Entry { point: location.as_array(), seq, item });
    }

    /// Move `item` from `old` to `new`, keeping its original insertion rank.
    ///
    /// Returns `false` (and inserts `item` at `new`) if it was not found at
    /// `old`.
    pub fn relocate(&mut self, item: T, old: GeoPoint, new: GeoPoint) -> bool {
        let found = self
            .tree
            .locate_all_at_point(&old.as_array())
            .find(|e| e.item == item)
            .cloned();
        match found {
            Some(entry) => {
                self.tree.remove(&entry);
                self.tree.insert(Entry { point: new.as_array(), ..entry });
                true
            }
            None => {
                self.insert(new, item);
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Up to `max_count` points closest to `point` by great-circle distance,
    /// nearest first, ties broken by insertion order.
    ///
    /// With `max_distance_m`, only points strictly closer than the bound are
    /// considered.
    pub fn nearest(
        &self,
        point: GeoPoint,
        max_count: usize,
        max_distance_m: Option<f64>,
    ) -> Vec<Neighbor<T>> {
        if max_count == 0 || self.is_empty() {
            return Vec::new();
        }

        let mut hits = match max_distance_m {
            Some(bound) => self.within(point, bound, |d, r| d < r),
            None => {
                // The first `max_count` points in planar order bound the
                // geodesic radius holding the true `max_count` nearest.
                let seed_radius = self
                    .tree
                    .nearest_neighbor_iter(&point.as_array())
                    .take(max_count)
                    .map(|e| point.distance_m(e.location()))
                    .fold(0.0_f64, f64::max);
                self.within(point, seed_radius, |d, r| d <= r)
            }
        };

        hits.truncate(max_count);
        hits.into_iter().map(|(_, n)| n).collect()
    }

    /// All points with great-circle distance strictly less than `radius_m`,
    /// nearest first.
    pub fn range_circle(&self, center: GeoPoint, radius_m: f64) -> Vec<Neighbor<T>> {
        if radius_m <= 0.0 || radius_m.is_nan() {
            return Vec::new();
        }
        self.within(center, radius_m, |d, r| d < r)
            .into_iter()
            .map(|(_, n)| n)
            .collect()
    }

    /// All points inside the closed box, in insertion order.
    pub fn range_bbox(&self, bbox: &BoundingBox) -> Vec<(T, GeoPoint)> {
        let envelope = AABB::from_corners([bbox.lat_min, bbox.lon_min], [bbox.lat_max, bbox.lon_max]);
        let mut hits: Vec<&Entry<T>> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|e| bbox.contains(e.location()))
            .collect();
        hits.sort_by_key(|e| e.seq);
        hits.into_iter().map(|e| (e.item, e.location())).collect()
    }

    /// Candidates from the degree window around `center`, filtered by the
    /// exact geodesic predicate and sorted by (distance, insertion order).
    fn within(
        &self,
        center: GeoPoint,
        radius_m: f64,
        keep: impl Fn(f64, f64) -> bool,
    ) -> Vec<(u64, Neighbor<T>)> {
        let window = BoundingBox::around(center, radius_m);
        let envelope = AABB::from_corners(
            [window.lat_min, window.lon_min],
            [window.lat_max, window.lon_max],
        );

        let mut hits: Vec<(u64, Neighbor<T>)> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter_map(|e| {
                let location = e.location();
                let distance_m = center.distance_m(location);
                keep(distance_m, radius_m).then_some((
                    e.seq,
                    Neighbor { item: e.item, location, distance_m },
                ))
            })
            .collect();

        hits.sort_by(|a, b| {
            a.1.distance_m
                .total_cmp(&b.1.distance_m)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits
    }
}

impl<T: Copy + PartialEq> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
