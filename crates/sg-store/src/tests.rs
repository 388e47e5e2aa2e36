//! Unit tests for sg-store.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeSet;

    use serde_json::json;

    use sg_core::{GeoPoint, Tags};
    use sg_network::{IntersectionAttrs, SegmentAttrs};
    use sg_text::Bm25Params;

    use crate::{AddressRecord, PoiRecord, Snapshot};

    pub fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect()
    }

    pub fn address(id: i64, lat: f64, lon: f64, street: &str, number: &str) -> AddressRecord {
        AddressRecord {
            id,
            location: GeoPoint::new(lat, lon),
            tags: tags(&[
                ("addr_street", street),
                ("addr_housenumber", number),
                ("addr_city", "Praha"),
                ("addr_postcode", "11000"),
            ]),
        }
    }

    pub fn poi(id: i64, name: &str, lat: f64, lon: f64) -> PoiRecord {
        PoiRecord {
            id,
            name: name.to_string(),
            location: GeoPoint::new(lat, lon),
            categories: BTreeSet::from(["amenity".to_string(), "cafe".to_string()]),
            tags: tags(&[("cuisine", "coffee_shop")]),
        }
    }

    /// Two intersections joined by a two-way 120 m segment, one address and
    /// one POI.
    pub fn small_city() -> Snapshot {
        let mut s = Snapshot::new(Bm25Params::default());
        for (osmid, lat, lon) in [(1, 50.0870, 14.4200), (2, 50.0880, 14.4200)] {
            s.upsert_intersection(
                Some(osmid),
                IntersectionAttrs {
                    location: Some(GeoPoint::new(lat, lon)),
                    ..IntersectionAttrs::default()
                },
            )
            .unwrap();
        }
        s.upsert_segment(1, 2, Some(77), SegmentAttrs { length: 120.0, ..SegmentAttrs::default() })
            .unwrap();
        s.upsert_address(address(10, 50.0871, 14.4201, "Hlavni", "10"));
        s.upsert_poi(poi(20, "Kavarna Slavia", 50.0879, 14.4201));
        s
    }
}

#[cfg(test)]
mod places {
    use sg_core::Tags;

    use super::helpers::tags;
    use crate::format_full_address;

    #[test]
    fn full_address_format() {
        let t = tags(&[
            ("addr_street", "Hlavni"),
            ("addr_housenumber", "10"),
            ("addr_city", "Praha"),
            ("addr_postcode", "11000"),
        ]);
        assert_eq!(format_full_address(&t), "Hlavni 10 Praha, 11000, Czech Republic");
    }

    #[test]
    fn missing_components_stay_empty() {
        assert_eq!(format_full_address(&Tags::new()), "  , , Czech Republic");
        let t = tags(&[("addr_street", "Karlova")]);
        assert_eq!(format_full_address(&t), "Karlova  , , Czech Republic");
    }
}

#[cfg(test)]
mod upserts {
    use sg_core::{GeoPoint, PlaceKey};
    use sg_network::IntersectionAttrs;
    use sg_text::Bm25Params;

    use super::helpers::{address, poi, small_city, tags};
    use crate::{AddressRecord, Association, Snapshot};

    #[test]
    fn address_tags_merge_and_full_address_recomputed() {
        let mut s = small_city();
        let outcome = s.upsert_address(AddressRecord {
            id: 10,
            location: GeoPoint::new(50.0871, 14.4201),
            tags: tags(&[("addr_housenumber", "12"), ("building", "yes")]),
        });
        assert!(!outcome.is_created());
        let a = s.address(10).unwrap();
        assert_eq!(a.full_address, "Hlavni 12 Praha, 11000, Czech Republic");
        assert_eq!(a.tags.len(), 5);
        assert_eq!(s.addresses().count(), 1);
    }

    #[test]
    fn poi_upsert_replaces_name_and_merges_tags() {
        let mut s = small_city();
        let mut update = poi(20, "Cafe Slavia", 50.0879, 14.4201);
        update.tags = tags(&[("wifi", "yes")]);
        s.upsert_poi(update);
        let p = s.poi(20).unwrap();
        assert_eq!(p.name, "Cafe Slavia");
        assert_eq!(p.tags.len(), 2);
        assert_eq!(s.pois().count(), 1);
    }

    #[test]
    fn moving_a_place_drops_its_association() {
        let mut s = small_city();
        let node = s.graph().node_by_osmid(1).unwrap();
        assert!(s.associate(PlaceKey::address(10), Association { intersection: node, length: 12.0 }).unwrap());

        // Same location: association kept.
        s.upsert_address(address(10, 50.0871, 14.4201, "Hlavni", "10"));
        assert!(s.association(PlaceKey::address(10)).unwrap().is_some());

        s.upsert_address(address(10, 50.0900, 14.4300, "Hlavni", "10"));
        assert!(s.association(PlaceKey::address(10)).unwrap().is_none());
    }

    #[test]
    fn moving_an_intersection_drops_associations_to_it() {
        let mut s = small_city();
        s.provision();
        let n1 = s.graph().node_by_osmid(1).unwrap();
        let n2 = s.graph().node_by_osmid(2).unwrap();
        s.associate(PlaceKey::address(10), Association { intersection: n1, length: 11.0 }).unwrap();
        s.associate(PlaceKey::poi(20), Association { intersection: n2, length: 12.0 }).unwrap();

        let at = |lat: f64| IntersectionAttrs { location: Some(GeoPoint::new(lat, 14.4200)), ..Default::default() };

        // Same location: nothing to redo.
        s.upsert_intersection(Some(1), at(50.0870)).unwrap();
        assert!(s.association(PlaceKey::address(10)).unwrap().is_some());

        // About 11 km north.
        s.upsert_intersection(Some(1), at(50.1870)).unwrap();
        assert!(s.association(PlaceKey::address(10)).unwrap().is_none());
        assert_eq!(s.association(PlaceKey::poi(20)).unwrap().map(|a| a.intersection), Some(n2));
        let keys: Vec<PlaceKey> = s.unassociated().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![PlaceKey::address(10)]);
    }

    #[test]
    fn associate_is_first_write_wins() {
        let mut s = small_city();
        let n1 = s.graph().node_by_osmid(1).unwrap();
        let n2 = s.graph().node_by_osmid(2).unwrap();
        let key = PlaceKey::poi(20);
        assert!(s.associate(key, Association { intersection: n2, length: 5.0 }).unwrap());
        assert!(!s.associate(key, Association { intersection: n1, length: 1.0 }).unwrap());
        assert_eq!(s.association(key).unwrap().unwrap().intersection, n2);
    }

    #[test]
    fn associate_unknown_place_or_node_fails() {
        let mut s = small_city();
        let n1 = s.graph().node_by_osmid(1).unwrap();
        assert!(s.associate(PlaceKey::poi(999), Association { intersection: n1, length: 1.0 }).is_err());
        let bogus = sg_core::NodeId::try_from(42usize).unwrap();
        assert!(s.associate(PlaceKey::poi(20), Association { intersection: bogus, length: 1.0 }).is_err());
        assert!(s.association(PlaceKey::address(999)).is_err());
    }

    #[test]
    fn unassociated_lists_addresses_then_pois() {
        let mut s = small_city();
        let keys: Vec<PlaceKey> = s.unassociated().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![PlaceKey::address(10), PlaceKey::poi(20)]);

        let n1 = s.graph().node_by_osmid(1).unwrap();
        s.associate(PlaceKey::address(10), Association { intersection: n1, length: 1.0 }).unwrap();
        assert_eq!(s.unassociated().len(), 1);
        assert_eq!(s.clear_associations(), 1);
        assert_eq!(s.unassociated().len(), 2);
    }

    #[test]
    fn stats_count_entities() {
        let s = small_city();
        let st = s.stats();
        assert_eq!((st.intersections, st.segments, st.addresses, st.pois), (2, 1, 1, 1));
        assert_eq!(st.associated_addresses + st.associated_pois, 0);
        assert!(!st.provisioned);
        assert_eq!(Snapshot::new(Bm25Params::default()).stats().intersections, 0);
    }
}

#[cfg(test)]
mod provisioning {
    use sg_core::{GeoPoint, PlaceKey};
    use sg_network::IntersectionAttrs;

    use super::helpers::{address, small_city};
    use crate::StoreError;

    #[test]
    fn indexes_absent_until_provisioned() {
        let s = small_city();
        assert!(matches!(s.require_indexes(), Err(StoreError::NotProvisioned)));
    }

    #[test]
    fn provision_is_idempotent() {
        let mut s = small_city();
        let first = s.provision();
        assert!(first.created);
        assert_eq!(first.constraints.len(), 3);
        let second = s.provision();
        assert!(!second.created);
        assert_eq!(first.indexes, second.indexes);
    }

    #[test]
    fn provision_indexes_existing_entities() {
        let mut s = small_city();
        s.provision();
        let idx = s.require_indexes().unwrap();
        assert_eq!(idx.intersections.len(), 2);
        assert_eq!(idx.addresses.len(), 1);
        assert_eq!(idx.pois.len(), 1);
        assert_eq!(idx.text.search("hlavni", 5)[0].key, PlaceKey::address(10));
        assert_eq!(idx.text.search("slavia", 5)[0].key, PlaceKey::poi(20));
    }

    #[test]
    fn upserts_after_provisioning_maintain_indexes() {
        let mut s = small_city();
        s.provision();
        s.upsert_address(address(11, 50.0875, 14.4205, "Vedlejsi", "5"));
        s.upsert_address(address(10, 50.0871, 14.4201, "Karlova", "10"));
        s.upsert_intersection(
            Some(2),
            IntersectionAttrs { location: Some(GeoPoint::new(50.1, 14.5)), ..Default::default() },
        )
        .unwrap();

        let idx = s.require_indexes().unwrap();
        assert_eq!(idx.addresses.len(), 2);
        assert!(idx.text.search("hlavni", 5).is_empty());
        assert_eq!(idx.text.search("karlova", 5)[0].key, PlaceKey::address(10));
        assert_eq!(idx.text.search("vedlejsi", 5)[0].key, PlaceKey::address(11));

        let moved = s.graph().node_by_osmid(2).unwrap();
        let hit = idx.intersections.nearest(GeoPoint::new(50.1, 14.5), 1, None);
        assert_eq!(hit[0].item, moved);
        assert_eq!(idx.intersections.len(), 2);
    }
}

#[cfg(test)]
mod persistence {
    use std::fs::File;
    use std::io::{BufReader, BufWriter};

    use sg_core::PlaceKey;

    use super::helpers::small_city;
    use crate::{restore, save, Association, StoreError};

    #[test]
    fn save_then_restore_preserves_entities_and_associations() {
        let mut s = small_city();
        let n2 = s.graph().node_by_osmid(2).unwrap();
        s.associate(PlaceKey::poi(20), Association { intersection: n2, length: 11.5 }).unwrap();
        s.provision();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        save(&s, BufWriter::new(File::create(&path).unwrap())).unwrap();
        let back = restore(BufReader::new(File::open(&path).unwrap())).unwrap();

        assert_eq!(back.stats(), s.stats());
        assert_eq!(back.address(10), s.address(10));
        assert_eq!(back.poi(20), s.poi(20));
        assert_eq!(back.association(PlaceKey::poi(20)).unwrap().unwrap().intersection, n2);
        let seg = back.graph().segments().next().unwrap().1;
        assert_eq!((seg.osmid, seg.length), (77, 120.0));
        assert_eq!(back.require_indexes().unwrap().text.search("hlavni", 1).len(), 1);
    }

    #[test]
    fn unprovisioned_stays_unprovisioned() {
        let s = small_city();
        let mut buf = Vec::new();
        save(&s, &mut buf).unwrap();
        let back = restore(buf.as_slice()).unwrap();
        assert!(!back.is_provisioned());
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(restore(&b"{not json"[..]), Err(StoreError::Format(_))));
    }

    #[test]
    fn wrong_version_rejected() {
        let s = small_city();
        let mut buf = Vec::new();
        save(&s, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap().replacen("\"version\":1", "\"version\":99", 1);
        assert!(matches!(restore(text.as_bytes()), Err(StoreError::Inconsistent(_))));
    }
}

#[cfg(test)]
mod sharing {
    use std::sync::Arc;

    use sg_core::{GeoPoint, PlaceKey};
    use sg_network::IntersectionAttrs;

    use super::helpers::{address, small_city};
    use crate::pages::{Pages, PAGE_LEN};
    use crate::Association;

    #[test]
    fn pages_copy_only_the_page_written() {
        let mut original = Pages::default();
        for i in 0..2 * PAGE_LEN + 1 {
            original.push(i);
        }
        let mut staged = original.clone();
        *staged.get_mut(3).unwrap() = 0;

        assert_eq!(original.get(3), Some(&3));
        assert_eq!(staged.get(3), Some(&0));
        assert!(std::ptr::eq(original.get(PAGE_LEN).unwrap(), staged.get(PAGE_LEN).unwrap()));
        assert!(!std::ptr::eq(original.get(0).unwrap(), staged.get(0).unwrap()));
        assert_eq!(staged.len(), 2 * PAGE_LEN + 1);
    }

    #[test]
    fn update_where_skips_pages_without_a_match() {
        let mut original = Pages::default();
        for i in 0..2 * PAGE_LEN {
            original.push(i);
        }
        let mut staged = original.clone();
        assert_eq!(staged.update_where(|&i| i >= PAGE_LEN && i % 2 == 0, |i| *i += 1), PAGE_LEN / 2);
        assert!(std::ptr::eq(original.get(0).unwrap(), staged.get(0).unwrap()));
        assert_eq!(staged.get(PAGE_LEN), Some(&(PAGE_LEN + 1)));
        assert_eq!(original.get(PAGE_LEN), Some(&PAGE_LEN));
    }

    #[test]
    fn association_leaves_graph_and_indexes_shared() {
        let mut s = small_city();
        s.provision();
        let mut staged = s.clone();
        let n1 = staged.graph().node_by_osmid(1).unwrap();
        staged.associate(PlaceKey::address(10), Association { intersection: n1, length: 11.0 }).unwrap();

        assert!(std::ptr::eq(s.graph(), staged.graph()));
        let (before, after) = (s.require_indexes().unwrap(), staged.require_indexes().unwrap());
        assert!(Arc::ptr_eq(&before.intersections, &after.intersections));
        assert!(Arc::ptr_eq(&before.text, &after.text));
        assert!(s.association(PlaceKey::address(10)).unwrap().is_none());
    }

    #[test]
    fn staged_writes_leave_the_original_alone() {
        let mut s = small_city();
        s.provision();
        let mut staged = s.clone();
        staged
            .upsert_intersection(
                Some(3),
                IntersectionAttrs { location: Some(GeoPoint::new(50.0890, 14.4200)), ..Default::default() },
            )
            .unwrap();
        staged.upsert_address(address(11, 50.0875, 14.4205, "Vedlejsi", "5"));

        assert!(!std::ptr::eq(s.graph(), staged.graph()));
        assert_eq!(s.stats().intersections, 2);
        assert_eq!(s.stats().addresses, 1);
        assert!(s.require_indexes().unwrap().text.search("vedlejsi", 5).is_empty());
        assert_eq!(staged.stats().addresses, 2);
        assert_eq!(staged.require_indexes().unwrap().intersections.len(), 3);
    }
}
