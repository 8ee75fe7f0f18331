//! Hierarchical geocell encoding with bounding-box and proximity search.
//!
//! Geocells are short hexadecimal strings naming nested rectangles of the
//! latitude/longitude plane. Storing every geocell of an entity's location in
//! an indexed list field lets any store with equality lookups answer
//! "what is near here" and "what is inside this box".
//!
//! ```rust
//! use geocell::prelude::*;
//!
//! let engine = MemoryQueryEngine::new();
//! engine.insert(GeoEntity::new("cafe", Point::new(37.7749, -122.4194)?))?;
//! engine.insert(GeoEntity::new("park", Point::new(37.7694, -122.4862)?))?;
//!
//! let query = ProximityQuery::new(Point::new(37.7750, -122.4180)?, 1);
//! let nearest = proximity_search(&query, None, &engine)?;
//! assert_eq!(nearest.results()[0].key(), "cafe");
//!
//! let cells = generate_geocells(&Point::new(37.7749, -122.4194)?)?;
//! assert_eq!(cells.len(), 13);
//! # Ok::<(), geocell::GeocellError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod memory;
pub mod query;
pub mod results;
pub mod search;

pub use builder::SearchBuilder;
pub use config::Config;
pub use error::{GeocellError, Result};
pub use search::GeocellSearch;

pub use geocell_types::{BoundingBox, CoordinateError, Point};

pub use compute::bbox::{
    CostFunction, DefaultCostFunction, MAX_FEASIBLE_BBOX_SEARCH_CELLS, best_bbox_search_cells,
    best_bbox_search_cells_with_limit, bounding_box_fetch,
};
pub use compute::distance::{EARTH_RADIUS_METERS, distance};
pub use compute::geocell::{
    Direction, GEOCELL_ALPHABET, GEOCELL_GRID_SIZE, MAX_GEOCELL_RESOLUTION, adjacent, compute,
    decode, generate_geocells, interpolate, interpolation_count,
};
pub use compute::proximity::{ProximityQuery, proximity_search};

pub use memory::{EngineStats, FieldAccess, GeoEntity, MemoryQueryEngine};
pub use query::{FilterClause, FilterOp, GeocellQuery, GeocellQueryEngine, LocationCapable};
pub use results::SearchResults;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, GeocellError, GeocellSearch, Result, SearchBuilder};

    pub use crate::{BoundingBox, Point};

    pub use crate::compute::geocell::{Direction, adjacent, compute, decode, generate_geocells};

    pub use crate::{
        CostFunction, ProximityQuery, SearchResults, best_bbox_search_cells, bounding_box_fetch,
        proximity_search,
    };

    pub use crate::{GeoEntity, GeocellQuery, GeocellQueryEngine, LocationCapable, MemoryQueryEngine};
}
