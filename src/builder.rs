//! Builder for [`GeocellSearch`].
//!
//! Binds a query engine to a [`Config`] and, optionally, a custom bounding-box
//! cost function.

use crate::compute::bbox::CostFunction;
use crate::config::Config;
use crate::error::{GeocellError, Result};
use crate::search::GeocellSearch;

/// Builder for a [`GeocellSearch`] over one query engine.
pub struct SearchBuilder<E> {
    engine: E,
    config: Config,
    cost_function: Option<Box<dyn CostFunction + Send + Sync>>,
}

impl<E> SearchBuilder<E> {
    /// Start from the default configuration.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: Config::default(),
            cost_function: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Resolution at which proximity searches start.
    pub fn max_geocell_resolution(mut self, resolution: usize) -> Self {
        self.config = self.config.with_max_geocell_resolution(resolution);
        self
    }

    pub fn max_feasible_bbox_search_cells(mut self, max_cells: usize) -> Self {
        self.config = self.config.with_max_feasible_bbox_search_cells(max_cells);
        self
    }

    pub fn default_max_results(mut self, max_results: usize) -> Self {
        self.config = self.config.with_default_max_results(max_results);
        self
    }

    /// Score bounding-box cell sets with `cost_function` instead of the default.
    pub fn cost_function<C>(mut self, cost_function: C) -> Self
    where
        C: CostFunction + Send + Sync + 'static,
    {
        self.cost_function = Some(Box::new(cost_function));
        self
    }

    /// Validate the configuration and build the search facade.
    pub fn build(self) -> Result<GeocellSearch<E>> {
        self.config.validate().map_err(GeocellError::Config)?;
        Ok(GeocellSearch::from_parts(
            self.engine,
            self.config,
            self.cost_function,
        ))
    }
}
