//! Unit tests for sg-spatial.

#[cfg(test)]
mod helpers {
    use sg_core::GeoPoint;

    use crate::SpatialIndex;

    /// Metres → degrees of latitude on the engine's sphere.
    pub fn north_deg(m: f64) -> f64 {
        (m / sg_core::geo::EARTH_RADIUS_M).to_degrees()
    }

    pub const CENTER: GeoPoint = GeoPoint { lat: 50.0870, lon: 14.4210 };

    /// Points due north of `CENTER` at 50, 100, 150, 300 and 1000 m, labelled
    /// by their distance.
    pub fn ladder() -> SpatialIndex<u32> {
        SpatialIndex::bulk_load([50u32, 100, 150, 300, 1000].into_iter().map(|m| {
            (GeoPoint::new(CENTER.lat + north_deg(f64::from(m)), CENTER.lon), m)
        }))
    }
}

#[cfg(test)]
mod nearest {
    use sg_core::GeoPoint;

    use super::helpers::{ladder, north_deg, CENTER};
    use crate::SpatialIndex;

    #[test]
    fn empty_index() {
        let idx: SpatialIndex<u32> = SpatialIndex::new();
        assert!(idx.nearest(CENTER, 1, None).is_empty());
    }

    #[test]
    fn single_nearest() {
        let idx = ladder();
        let hits = idx.nearest(CENTER, 1, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item, 50);
        assert!((hits[0].distance_m - 50.0).abs() < 1e-6);
    }

    #[test]
    fn k_nearest_sorted() {
        let idx = ladder();
        let items: Vec<u32> = idx.nearest(CENTER, 3, None).into_iter().map(|n| n.item).collect();
        assert_eq!(items, vec![50, 100, 150]);
    }

    #[test]
    fn max_distance_is_strict() {
        let idx = ladder();
        assert!(idx.nearest(CENTER, 1, Some(40.0)).is_empty());
        let hits = idx.nearest(CENTER, 10, Some(200.0));
        let items: Vec<u32> = hits.into_iter().map(|n| n.item).collect();
        assert_eq!(items, vec![50, 100, 150]);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        // Two payloads at the same spot, plus a decoy inserted in between.
        let spot = GeoPoint::new(CENTER.lat, CENTER.lon + 0.001);
        let mut idx = SpatialIndex::new();
        idx.insert(spot, "first");
        idx.insert(GeoPoint::new(CENTER.lat + 0.01, CENTER.lon), "far");
        idx.insert(spot, "second");
        let hits = idx.nearest(CENTER, 2, None);
        assert_eq!(hits[0].distance_m, hits[1].distance_m);
        assert_eq!(hits[0].item, "first");
        assert_eq!(hits[1].item, "second");
    }

    #[test]
    fn geodesic_not_planar() {
        // At 60°N a degree of longitude is half a degree of latitude.
        // Planar distance prefers A, geodesic distance prefers B.
        let center = GeoPoint::new(60.0, 10.0);
        let a = GeoPoint::new(60.0 + 0.0015, 10.0);
        let b = GeoPoint::new(60.0, 10.0 + 0.0020);
        let idx = SpatialIndex::bulk_load([(a, 'a'), (b, 'b')]);
        assert!(center.distance_m(b) < center.distance_m(a));
        assert_eq!(idx.nearest(center, 1, None)[0].item, 'b');
    }

    #[test]
    fn insert_after_bulk_load() {
        let mut idx = ladder();
        idx.insert(GeoPoint::new(CENTER.lat + north_deg(10.0), CENTER.lon), 10);
        assert_eq!(idx.len(), 6);
        assert_eq!(idx.nearest(CENTER, 1, None)[0].item, 10);
    }

    #[test]
    fn relocate_moves_point() {
        let mut idx = ladder();
        let old = GeoPoint::new(CENTER.lat + north_deg(1000.0), CENTER.lon);
        assert!(idx.relocate(1000, old, CENTER));
        assert_eq!(idx.len(), 5);
        assert_eq!(idx.nearest(CENTER, 1, None)[0].item, 1000);
    }
}

#[cfg(test)]
mod range {
    use sg_core::{BoundingBox, GeoPoint};

    use super::helpers::{ladder, north_deg, CENTER};
    use crate::SpatialIndex;

    #[test]
    fn circle_is_strict() {
        let idx = ladder();
        let items: Vec<u32> = idx.range_circle(CENTER, 300.0).into_iter().map(|n| n.item).collect();
        assert_eq!(items, vec![50, 100, 150]);
        for n in idx.range_circle(CENTER, 300.0) {
            assert!(n.distance_m < 300.0);
        }
    }

    #[test]
    fn circle_boundary_point_excluded() {
        let p = GeoPoint::new(CENTER.lat + north_deg(100.0), CENTER.lon);
        let exact = CENTER.distance_m(p);
        let idx = SpatialIndex::bulk_load([(p, 1u8)]);
        assert!(idx.range_circle(CENTER, exact).is_empty());
        assert_eq!(idx.range_circle(CENTER, exact + 1e-6).len(), 1);
    }

    #[test]
    fn zero_radius_is_empty() {
        let idx = SpatialIndex::bulk_load([(CENTER, 1u8)]);
        assert!(idx.range_circle(CENTER, 0.0).is_empty());
    }

    #[test]
    fn bbox_is_closed() {
        let idx = SpatialIndex::bulk_load([
            (GeoPoint::new(50.0, 14.0), 1u8),
            (GeoPoint::new(50.5, 14.5), 2),
            (GeoPoint::new(51.0, 15.0), 3),
            (GeoPoint::new(51.5, 15.0), 4),
        ]);
        let bb = BoundingBox::new(50.0, 51.0, 14.0, 15.0).unwrap();
        let items: Vec<u8> = idx.range_bbox(&bb).into_iter().map(|(i, _)| i).collect();
        assert_eq!(items, vec![1, 2, 3]);
    }
}
