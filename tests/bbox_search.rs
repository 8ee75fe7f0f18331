use geocell::compute::bbox::best_bbox_search_cells_with_limit;
use geocell::{
    BoundingBox, Config, GeoEntity, GeocellQuery, GeocellSearch, MemoryQueryEngine, Point,
    best_bbox_search_cells, bounding_box_fetch, decode,
};
use serde_json::json;
use std::io::Write;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bbox(north: f64, east: f64, south: f64, west: f64) -> BoundingBox {
    BoundingBox::new(north, east, south, west).expect("valid box")
}

fn point(lat: f64, lon: f64) -> Point {
    Point::new(lat, lon).expect("valid coordinates")
}

/// Union of the decoded cells as (north, east, south, west).
fn cell_union(cells: &[String]) -> (f64, f64, f64, f64) {
    cells
        .iter()
        .map(|cell| decode(cell).expect("decodable cell"))
        .fold(
            (f64::MIN, f64::MIN, f64::MAX, f64::MAX),
            |(n, e, s, w), b| (n.max(b.north()), e.max(b.east()), s.min(b.south()), w.min(b.west())),
        )
}

#[test]
fn test_box_around_origin_shares_one_resolution() {
    init_logging();

    let b = bbox(10.0, 10.0, -10.0, -10.0);
    let cells = best_bbox_search_cells(&b, None).unwrap();

    let resolution = cells[0].len();
    assert!(cells.iter().all(|c| c.len() == resolution));

    let (north, east, south, west) = cell_union(&cells);
    assert!(north > b.north() && south < b.south());
    assert!(east > b.east() && west < b.west());
}

#[test]
fn test_union_covers_box() {
    init_logging();

    let boxes = [
        bbox(52.0, 13.6, 51.8, 13.1),
        bbox(-22.8, -43.1, -23.1, -43.8),
        bbox(89.0, 179.0, 80.0, 170.0),
        bbox(-80.0, -170.0, -89.5, -179.5),
        bbox(1.0, 100.0, -1.0, 99.0),
        bbox(45.0, 90.0, 0.0, 0.0),
    ];

    for b in boxes {
        let cells = best_bbox_search_cells(&b, None).unwrap();
        assert!(!cells.is_empty(), "no cells for {:?}", b);

        let resolution = cells[0].len();
        assert!(cells.iter().all(|c| c.len() == resolution));

        let (north, east, south, west) = cell_union(&cells);
        assert!(north >= b.north() && south <= b.south(), "{:?}", b);
        assert!(east >= b.east() && west <= b.west(), "{:?}", b);

        // Every cell overlaps the box.
        for cell in &cells {
            let c = decode(cell).unwrap();
            assert!(c.south() <= b.north() && c.north() >= b.south());
            assert!(c.west() <= b.east() && c.east() >= b.west());
        }
    }
}

#[test]
fn test_antimeridian_box_is_two_uniform_halves() {
    init_logging();

    let cells = best_bbox_search_cells(&bbox(10.0, -170.0, -10.0, 170.0), None).unwrap();

    let (east_side, west_side): (Vec<String>, Vec<String>) = cells
        .iter()
        .cloned()
        .partition(|cell| decode(cell).unwrap().west() < 0.0);

    // East half (west of -170) first, then the half east of 170.
    assert_eq!(cells, [east_side.clone(), west_side.clone()].concat());

    for half in [&east_side, &west_side] {
        assert!(!half.is_empty());
        let resolution = half[0].len();
        assert!(half.iter().all(|c| c.len() == resolution));
    }

    let (_, east, _, west) = cell_union(&east_side);
    assert!(west <= -180.0 && east >= -170.0);
    let (_, east, _, west) = cell_union(&west_side);
    assert!(west <= 170.0 && east >= 180.0);
}

#[test]
fn test_feasibility_limit_skips_large_sets() {
    init_logging();

    let b = bbox(40.0, 40.0, -40.0, -40.0);
    let generous = best_bbox_search_cells_with_limit(&b, None, 300).unwrap();
    let strict = best_bbox_search_cells_with_limit(&b, None, 4).unwrap();

    assert!(strict.len() <= 4);
    assert!(strict[0].len() <= generous[0].len());
}

#[test]
fn test_bounding_box_fetch() {
    init_logging();

    let engine = MemoryQueryEngine::new();
    engine
        .insert_all(vec![
            GeoEntity::new("inside-1", point(37.78, -122.41)),
            GeoEntity::new("inside-2", point(37.76, -122.45)),
            // Same cell as the box at coarse resolutions, but outside it.
            GeoEntity::new("outside", point(37.70, -122.41)),
            GeoEntity::new("far", point(40.71, -74.00)),
        ])
        .unwrap();

    let b = bbox(37.80, -122.38, 37.74, -122.52);
    let found = bounding_box_fetch(&b, 10, None, &engine, None).unwrap();

    let mut keys: Vec<&str> = found.iter().map(|e| e.key()).collect();
    keys.sort();
    assert_eq!(keys, vec!["inside-1", "inside-2"]);

    let capped = bounding_box_fetch(&b, 1, None, &engine, None).unwrap();
    assert_eq!(capped.len(), 1);

    assert!(bounding_box_fetch(&b, 0, None, &engine, None).is_err());
}

#[test]
fn test_bounding_box_fetch_across_antimeridian() {
    init_logging();

    let engine = MemoryQueryEngine::new();
    engine
        .insert_all(vec![
            GeoEntity::new("fiji", point(-17.7, 178.0)),
            GeoEntity::new("samoa", point(-13.8, -172.1)),
            GeoEntity::new("australia", point(-25.0, 133.0)),
        ])
        .unwrap();

    let b = bbox(-10.0, -170.0, -20.0, 175.0);
    let found = bounding_box_fetch(&b, 10, None, &engine, None).unwrap();

    let mut keys: Vec<&str> = found.iter().map(|e| e.key()).collect();
    keys.sort();
    assert_eq!(keys, vec!["fiji", "samoa"]);
}

#[test]
fn test_bounding_box_fetch_with_base_query() {
    init_logging();

    let engine = MemoryQueryEngine::new();
    engine
        .insert_all(vec![
            GeoEntity::new("open", point(1.0, 1.0)).with_property("open", json!(true)),
            GeoEntity::new("closed", point(1.5, 1.5)).with_property("open", json!(false)),
        ])
        .unwrap();

    let only_open = GeocellQuery::new("open == isOpen", vec![json!(true)]).unwrap();
    let found =
        bounding_box_fetch(&bbox(2.0, 2.0, 0.0, 0.0), 10, Some(&only_open), &engine, None).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key(), "open");
}

#[test]
fn test_facade_from_config_file() {
    init_logging();

    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("temp file");
    write!(
        file,
        r#"{{"max_feasible_bbox_search_cells": 8, "default_max_results": 3}}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    let engine: MemoryQueryEngine<GeoEntity> = MemoryQueryEngine::new();
    let search = GeocellSearch::builder(engine).config(config).build().unwrap();

    let b = bbox(40.0, 40.0, -40.0, -40.0);
    let cells = search.bbox_cells(&b).unwrap();
    assert_eq!(
        cells,
        best_bbox_search_cells_with_limit(&b, None, 8).unwrap()
    );
    assert!(cells.len() <= 8);
}
