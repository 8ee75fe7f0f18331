//! Index a handful of places and query them by distance and by area.
//!
//! Run with `RUST_LOG=debug cargo run --example nearby_places` to see every
//! backend fetch the searches issue.

use geocell::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    env_logger::init();

    let engine = MemoryQueryEngine::new();
    let places = [
        ("ferry-building", 37.7955, -122.3937, "landmark"),
        ("coit-tower", 37.8024, -122.4058, "landmark"),
        ("blue-bottle", 37.7764, -122.4232, "cafe"),
        ("sightglass", 37.7770, -122.4086, "cafe"),
        ("golden-gate-park", 37.7694, -122.4862, "park"),
        ("dolores-park", 37.7596, -122.4269, "park"),
        ("oakland-museum", 37.7987, -122.2640, "museum"),
    ];

    for (key, lat, lon, category) in places {
        let entity = GeoEntity::new(key, Point::new(lat, lon)?)
            .with_property("category", json!(category));
        engine.insert(entity)?;
    }

    let search = GeocellSearch::builder(engine)
        .default_max_results(3)
        .build()?;

    let union_square = Point::new(37.7880, -122.4075)?;
    println!("Nearest to Union Square ({}):", union_square);
    for (place, meters) in search.nearest(union_square)?.iter() {
        println!("  {:<18} {:>8.0} m", place.key(), meters);
    }

    let cafes = GeocellQuery::new("category == cat", vec![json!("cafe")])?;
    let query = search
        .proximity_query(union_square)
        .with_max_distance(3_000.0);
    println!("\nCafes within 3 km:");
    for (place, meters) in search.proximity(&query, Some(&cafes))?.iter() {
        println!("  {:<18} {:>8.0} m", place.key(), meters);
    }

    let downtown = BoundingBox::new(37.81, -122.38, 37.77, -122.43)?;
    println!("\nCells covering downtown: {:?}", search.bbox_cells(&downtown)?);
    for place in search.query_bbox(&downtown, 10, None)? {
        println!("  inside: {}", place.key());
    }

    println!("\nGeocells stored for Union Square:");
    for cell in generate_geocells(&union_square)? {
        println!("  {}", cell);
    }

    Ok(())
}
