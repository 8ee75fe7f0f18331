//! High-level search facade.
//!
//! ```rust
//! use geocell::{BoundingBox, GeoEntity, GeocellSearch, MemoryQueryEngine, Point};
//!
//! let engine = MemoryQueryEngine::new();
//! engine.insert(GeoEntity::new("nyc", Point::new(40.7128, -74.0060)?))?;
//! engine.insert(GeoEntity::new("jersey-city", Point::new(40.7178, -74.0431)?))?;
//! engine.insert(GeoEntity::new("boston", Point::new(42.3601, -71.0589)?))?;
//!
//! let search = GeocellSearch::builder(engine).default_max_results(2).build()?;
//!
//! let nearest = search.nearest(Point::new(40.7306, -73.9352)?)?;
//! assert_eq!(nearest.len(), 2);
//! assert_eq!(nearest.results()[0].key(), "nyc");
//!
//! let bbox = BoundingBox::new(41.0, -73.5, 40.5, -74.5)?;
//! let inside = search.query_bbox(&bbox, 10, None)?;
//! assert_eq!(inside.len(), 2);
//! # Ok::<(), geocell::GeocellError>(())
//! ```

use crate::builder::SearchBuilder;
use crate::compute::bbox::{CostFunction, best_bbox_search_cells_with_limit, fetch_in_box};
use crate::compute::proximity::{ProximityQuery, proximity_search};
use crate::config::Config;
use crate::error::Result;
use crate::query::{GeocellQuery, GeocellQueryEngine};
use crate::results::SearchResults;
use geocell_types::{BoundingBox, Point};

/// A query engine bound to search settings.
pub struct GeocellSearch<E> {
    engine: E,
    config: Config,
    cost_function: Option<Box<dyn CostFunction + Send + Sync>>,
}

impl<E> GeocellSearch<E> {
    pub fn builder(engine: E) -> SearchBuilder<E> {
        SearchBuilder::new(engine)
    }

    /// Facade with the default configuration.
    pub fn new(engine: E) -> Self {
        Self::from_parts(engine, Config::default(), None)
    }

    pub(crate) fn from_parts(
        engine: E,
        config: Config,
        cost_function: Option<Box<dyn CostFunction + Send + Sync>>,
    ) -> Self {
        Self {
            engine,
            config,
            cost_function,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_custom_cost_function(&self) -> bool {
        self.cost_function.is_some()
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    fn cost_function(&self) -> Option<&dyn CostFunction> {
        self.cost_function
            .as_deref()
            .map(|cost| cost as &dyn CostFunction)
    }
}

impl<E: GeocellQueryEngine> GeocellSearch<E> {
    /// A proximity query around `center` using the configured defaults.
    pub fn proximity_query(&self, center: Point) -> ProximityQuery {
        ProximityQuery::new(center, self.config.default_max_results)
            .with_max_geocell_resolution(self.config.max_geocell_resolution)
    }

    /// The `default_max_results` entities nearest to `center`.
    pub fn nearest(&self, center: Point) -> Result<SearchResults<E::Entity>> {
        self.proximity(&self.proximity_query(center), None)
    }

    /// The `max_results` entities nearest to `center`.
    pub fn nearest_n(&self, center: Point, max_results: usize) -> Result<SearchResults<E::Entity>> {
        let query = ProximityQuery::new(center, max_results)
            .with_max_geocell_resolution(self.config.max_geocell_resolution);
        self.proximity(&query, None)
    }

    /// Run a fully specified proximity search.
    pub fn proximity(
        &self,
        query: &ProximityQuery,
        base_query: Option<&GeocellQuery>,
    ) -> Result<SearchResults<E::Entity>> {
        proximity_search(query, base_query, &self.engine)
    }

    /// Cells covering `bbox` under the configured feasibility limit and cost function.
    pub fn bbox_cells(&self, bbox: &BoundingBox) -> Result<Vec<String>> {
        best_bbox_search_cells_with_limit(
            bbox,
            self.cost_function(),
            self.config.max_feasible_bbox_search_cells,
        )
    }

    /// Up to `max_results` entities inside `bbox`.
    pub fn query_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
        base_query: Option<&GeocellQuery>,
    ) -> Result<Vec<E::Entity>> {
        let cells = self.bbox_cells(bbox)?;
        fetch_in_box(bbox, &cells, max_results, base_query, &self.engine)
    }
}
