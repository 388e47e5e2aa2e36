//! Full pipeline over CSV exports: provision, load, associate, query.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use sg_engine::{Engine, EngineConfig, EngineError, RecordKind};

const ROAD_NODES: &str = "\
osmid,y,x,ref,highway,street_count
1,50.0870,14.4200,,traffic_signals,3
2,50.0880,14.4200,,,4
3,50.0875,14.4190,,,3
4,50.0890,14.4200,E55,,2
5,50.1000,14.5000,,,1
";

// Both directions of A-B cost 5 so only the oneway flags decide reachability
// of 4.  `osmid` lists collapse to -1.
const ROAD_RELS: &str = "\
u,v,osmid,oneway,lanes,ref,name,highway,maxspeed,length
1,2,100,False,2,,Hlavni,residential,50,5
2,1,100,False,2,,Hlavni,residential,50,5
1,3,101,True,,,,service,,2
3,2,102,True,,,,service,,1
2,4,\"[103, 104]\",True,,,,primary,,3
4,9,105,True,,,,primary,,1
";

const ADDRESSES: &str = r#"id,lat,lon,tags
10,50.08701,14.42001,"{'addr_street': 'Hlavni', 'addr_housenumber': '10', 'addr_city': 'Praha', 'addr_postcode': '11000'}"
11,50.08901,14.42000,"{'addr_street': 'Vedlejsi', 'addr_housenumber': '5', 'addr_city': 'Praha', 'addr_postcode': '11000'}"
12,50.20000,14.20000,"{'addr_street': 'Karlova', 'addr_housenumber': '1', 'addr_city': 'Praha'}"
13,,14.20000,"{'addr_street': 'Nikde'}"
"#;

const POIS: &str = r#"id,lat,lon,name,class,subclass,tags
20,50.08751,14.41900,Kavarna Slavia,amenity,cafe,"{""opening_hours"": ""Mo-Su 08:00-22:00""}"
21,50.08801,14.42000,Lekarna,amenity,pharmacy,
"#;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

fn loaded() -> Engine {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig { load_batch_size: 2, association_batch_size: 2, ..EngineConfig::default() };
    let engine = Engine::new(config).unwrap();
    engine.provision().unwrap();

    let nodes = engine.load_csv(RecordKind::Intersection, &write(dir.path(), "road_nodes.csv", ROAD_NODES)).unwrap();
    assert_eq!(nodes.created, 5);
    assert_eq!(nodes.batches, 3);

    let rels = engine.load_csv(RecordKind::Segment, &write(dir.path(), "road_rels.csv", ROAD_RELS)).unwrap();
    assert_eq!(rels.created, 5);
    assert_eq!(rels.dangling, 1);

    let addresses = engine.load_csv(RecordKind::Address, &write(dir.path(), "addresses.csv", ADDRESSES)).unwrap();
    assert_eq!(addresses.created, 3);
    assert_eq!(addresses.skipped(), 1);

    let pois = engine.load_csv(RecordKind::PointOfInterest, &write(dir.path(), "poi.csv", POIS)).unwrap();
    assert_eq!(pois.created, 2);

    let report = engine.associate().unwrap();
    assert_eq!(report.candidates, 5);
    assert_eq!(report.associated, 4);
    assert_eq!(report.out_of_range, 1);
    engine
}

#[test]
fn search_ranks_exact_street_first() {
    let engine = loaded();
    let hits = engine.search_text("Hlavni 10", 5).unwrap();
    assert_eq!(hits[0].id, 10);
    assert_eq!(hits[0].label, "Address");
    assert!(hits.iter().all(|h| h.id != 11 || h.score < hits[0].score));
}

#[test]
fn route_over_the_diamond() {
    let engine = loaded();
    let route = engine.route(10, 11).unwrap();
    assert_eq!(route.length, 6.0);
    let lats: Vec<f64> = route.route.iter().map(|p| p.lat).collect();
    assert_eq!(lats, [50.0870, 50.0875, 50.0880, 50.0890]);
}

#[test]
fn two_way_street_routes_back_but_oneway_does_not() {
    let engine = loaded();
    assert_eq!(engine.route(2, 1).unwrap().length, 5.0);
    assert!(engine.route(4, 2).unwrap().is_empty());
    assert!(engine.route(1, 5).unwrap().is_empty());
}

#[test]
fn far_address_is_unroutable() {
    let engine = loaded();
    assert!(matches!(engine.route(12, 10), Err(EngineError::UnroutableEndpoint { id: 12 })));
}

#[test]
fn poi_queries_return_full_records() {
    let engine = loaded();
    let circle = engine.poi_in_circle(50.0875, 14.4195, 100.0).unwrap();
    assert_eq!(circle.iter().map(|p| p.id).collect::<Vec<_>>(), [20, 21]);
    assert_eq!(circle[0].categories, ["amenity", "cafe"]);
    assert_eq!(circle[0].tags.len(), 1);
    assert!(circle[1].tags.is_empty());

    let bbox = engine.poi_in_bbox(50.0874, 50.0876, 14.4185, 14.4195).unwrap();
    assert_eq!(bbox.iter().map(|p| p.id).collect::<Vec<_>>(), [20]);

    let json = serde_json::to_value(&bbox[0]).unwrap();
    assert_eq!(json["name"], "Kavarna Slavia");
    assert_eq!(json["latitude"], 50.08751);
}

#[test]
fn reloading_the_same_files_changes_nothing() {
    let engine = loaded();
    let before = engine.stats().unwrap();
    let dir = TempDir::new().unwrap();
    let again = engine.load_csv(RecordKind::Address, &write(dir.path(), "addresses.csv", ADDRESSES)).unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.updated, 3);
    assert_eq!(engine.stats().unwrap(), before);
    assert_eq!(engine.route(10, 11).unwrap().length, 6.0);
}

#[test]
fn missing_file_is_a_storage_error() {
    let engine = loaded();
    let result = engine.load_csv(RecordKind::Address, Path::new("/nonexistent/addresses.csv"));
    assert!(matches!(result, Err(EngineError::Storage(_))));
}

#[test]
fn snapshot_persists_through_a_file() {
    let engine = loaded();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");
    engine.save_to(std::fs::File::create(&path).unwrap()).unwrap();

    let restored = Engine::new(EngineConfig::default()).unwrap();
    restored.load_from(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(restored.stats().unwrap(), engine.stats().unwrap());
    assert_eq!(restored.route(10, 11).unwrap(), engine.route(10, 11).unwrap());
    assert_eq!(restored.intersection(4).unwrap().reference.as_deref(), Some("E55"));
}

#[test]
fn readers_run_alongside_a_writer() {
    let engine = Arc::new(loaded());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    // Every published snapshot has the full road graph.
                    let hits = engine.poi_in_circle(50.0875, 14.4195, 100.0).unwrap();
                    assert_eq!(hits.len(), 2);
                    let route = engine.route(1, 4).unwrap();
                    assert!(route.is_empty() || route.length == 6.0);
                }
            })
        })
        .collect();

    for _ in 0..10 {
        engine.reset_associations().unwrap();
        engine.associate().unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(engine.route(10, 11).unwrap().length, 6.0);
}
