//! Unit tests for sg-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId, PlaceKey, PlaceKind};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::default(), NodeId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(EdgeId(7).to_string(), "EdgeId(7)");
        assert_eq!(PlaceKey::poi(3).to_string(), "PointOfInterest(3)");
    }

    #[test]
    fn place_keys_order_by_id_first() {
        let mut keys = vec![PlaceKey::poi(1), PlaceKey::address(2), PlaceKey::address(1)];
        keys.sort();
        assert_eq!(keys, vec![PlaceKey::address(1), PlaceKey::poi(1), PlaceKey::address(2)]);
    }

    #[test]
    fn labels() {
        assert_eq!(PlaceKind::Address.label(), "Address");
        assert_eq!(PlaceKind::PointOfInterest.label(), "PointOfInterest");
    }
}

#[cfg(test)]
mod geo {
    use crate::{BoundingBox, GeoPoint};

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(50.087, 14.421);
        assert!(p.distance_m(p) < 1e-6);
    }

    #[test]
    fn one_degree_latitude() {
        // 1° of latitude on a 6 378 140 m sphere ≈ 111 319.5 m
        let a = GeoPoint::new(50.0, 14.0);
        let b = GeoPoint::new(51.0, 14.0);
        let d = a.distance_m(b);
        assert!((d - 111_319.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(50.0755, 14.4378);
        let b = GeoPoint::new(50.0880, 14.4208);
        assert!((a.distance_m(b) - b.distance_m(a)).abs() < 1e-9);
    }

    #[test]
    fn checked_rejects_out_of_range() {
        assert!(GeoPoint::checked(91.0, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, -180.5).is_err());
        assert!(GeoPoint::checked(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::checked(50.0, 14.0).is_ok());
    }

    #[test]
    fn bbox_contains_is_closed() {
        let bb = BoundingBox::new(50.0, 51.0, 14.0, 15.0).unwrap();
        assert!(bb.contains(GeoPoint::new(50.0, 14.0)));
        assert!(bb.contains(GeoPoint::new(51.0, 15.0)));
        assert!(!bb.contains(GeoPoint::new(51.000_001, 15.0)));
    }

    #[test]
    fn bbox_rejects_inverted_bounds() {
        assert!(BoundingBox::new(51.0, 50.0, 14.0, 15.0).is_err());
        assert!(BoundingBox::new(50.0, 51.0, 15.0, 14.0).is_err());
    }

    #[test]
    fn window_covers_circle() {
        let c = GeoPoint::new(50.08, 14.42);
        let w = BoundingBox::around(c, 200.0);
        // Points 199.9 m due north and due east are inside the window.
        let north = GeoPoint::new(c.lat + (199.9 / crate::geo::EARTH_RADIUS_M).to_degrees(), c.lon);
        assert!(c.distance_m(north) < 200.0);
        assert!(w.contains(north));
        let east_deg = (199.9 / crate::geo::EARTH_RADIUS_M).to_degrees() / c.lat.to_radians().cos();
        let east = GeoPoint::new(c.lat, c.lon + east_deg);
        assert!(w.contains(east));
    }

    #[test]
    fn window_near_pole_spans_all_longitudes() {
        let w = BoundingBox::around(GeoPoint::new(89.9999, 0.0), 1_000.0);
        assert_eq!(w.lon_min, -180.0);
        assert_eq!(w.lon_max, 180.0);
        assert_eq!(w.lat_max, 90.0);
    }
}

#[cfg(test)]
mod config {
    use crate::EngineConfig;

    #[test]
    fn default_batch_sizes_and_bound() {
        let c = EngineConfig::default();
        assert_eq!(c.load_batch_size, 10_000);
        assert_eq!(c.association_batch_size, 1_000);
        assert_eq!(c.association_max_distance_m, 200.0);
        assert!(!c.association_parallel);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_batch_rejected() {
        let c = EngineConfig { load_batch_size: 0, ..EngineConfig::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn non_positive_distance_rejected() {
        let c = EngineConfig { association_max_distance_m: 0.0, ..EngineConfig::default() };
        assert!(c.validate().is_err());
        let c = EngineConfig { association_max_distance_m: f64::INFINITY, ..EngineConfig::default() };
        assert!(c.validate().is_err());
    }
}

#[cfg(test)]
mod tags {
    use serde_json::json;

    use crate::Tags;
    use crate::tags::{merge_tags, tag_text};

    #[test]
    fn text_rendering() {
        let mut t = Tags::new();
        t.insert("s".into(), json!("Praha"));
        t.insert("n".into(), json!(11000));
        t.insert("z".into(), json!(null));
        assert_eq!(tag_text(&t, "s").as_deref(), Some("Praha"));
        assert_eq!(tag_text(&t, "n").as_deref(), Some("11000"));
        assert_eq!(tag_text(&t, "z"), None);
        assert_eq!(tag_text(&t, "missing"), None);
    }

    #[test]
    fn merge_last_write_wins() {
        let mut t = Tags::new();
        t.insert("a".into(), json!(1));
        t.insert("b".into(), json!(2));
        let mut incoming = Tags::new();
        incoming.insert("b".into(), json!(3));
        incoming.insert("c".into(), json!(4));
        merge_tags(&mut t, incoming);
        assert_eq!(t.get("a"), Some(&json!(1)));
        assert_eq!(t.get("b"), Some(&json!(3)));
        assert_eq!(t.get("c"), Some(&json!(4)));
    }
}
