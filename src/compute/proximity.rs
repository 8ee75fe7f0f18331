//! Nearest-neighbor search over a geocell-indexed backend.
//!
//! The search starts in the finest cell holding the center and widens a ring
//! of same-resolution cells around it: one cell, then two side by side, then a
//! 2x2 block, then that block's parents, and so on up to the 16 top-level
//! cells. Every fetched entity is merged into a bounded list kept sorted by
//! distance, and the search stops once that list is full.

use crate::compute::distance::distance;
use crate::compute::geocell::{
    CellCoords, Direction, GEOCELL_ALPHABET, MAX_GEOCELL_RESOLUTION, SortedEdges, adjacent,
    compute, distance_sorted_edges, parent,
};
use crate::compute::validation::{validate_distance, validate_resolution};
use crate::error::{GeocellError, Result};
use crate::query::{GeocellQuery, GeocellQueryEngine, LocationCapable};
use crate::results::SearchResults;
use geocell_types::Point;
use log::debug;
use rustc_hash::FxHashSet;
use smallvec::smallvec;

/// Parameters of a proximity search.
///
/// A `max_distance` of zero means unbounded. Results satisfy
/// `min_distance <= d` and, when bounded, `d < max_distance`.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::proximity::ProximityQuery;
/// use geocell::Point;
///
/// let query = ProximityQuery::new(Point::new(51.5074, -0.1278)?, 20)
///     .with_max_distance(5_000.0)
///     .with_max_geocell_resolution(11);
/// assert!(query.validate().is_ok());
/// # Ok::<(), geocell::GeocellError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityQuery {
    center: Point,
    max_results: usize,
    min_distance: f64,
    max_distance: f64,
    max_geocell_resolution: usize,
}

impl ProximityQuery {
    pub fn new(center: Point, max_results: usize) -> Self {
        Self {
            center,
            max_results,
            min_distance: 0.0,
            max_distance: 0.0,
            max_geocell_resolution: MAX_GEOCELL_RESOLUTION,
        }
    }

    pub fn with_min_distance(mut self, meters: f64) -> Self {
        self.min_distance = meters;
        self
    }

    pub fn with_max_distance(mut self, meters: f64) -> Self {
        self.max_distance = meters;
        self
    }

    pub fn with_max_geocell_resolution(mut self, resolution: usize) -> Self {
        self.max_geocell_resolution = resolution;
        self
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn max_geocell_resolution(&self) -> usize {
        self.max_geocell_resolution
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(GeocellError::InvalidArgument(
                "max_results must be greater than zero".to_string(),
            ));
        }
        validate_resolution(self.max_geocell_resolution)?;
        validate_distance("min_distance", self.min_distance)?;
        validate_distance("max_distance", self.max_distance)?;
        Ok(())
    }

    fn accepts(&self, meters: f64) -> bool {
        meters >= self.min_distance && (self.max_distance == 0.0 || meters < self.max_distance)
    }
}

/// Find the entities nearest to `query.center()`, nearest first.
///
/// The query is validated before the backend is touched. A backend error
/// aborts the search and is returned as is; no partial results survive.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::proximity::{proximity_search, ProximityQuery};
/// use geocell::{GeoEntity, MemoryQueryEngine, Point};
///
/// let engine = MemoryQueryEngine::new();
/// engine.insert(GeoEntity::new("tower", Point::new(48.8584, 2.2945)?))?;
/// engine.insert(GeoEntity::new("louvre", Point::new(48.8606, 2.3376)?))?;
///
/// let query = ProximityQuery::new(Point::new(48.8600, 2.3300)?, 5);
/// let found = proximity_search(&query, None, &engine)?;
/// assert_eq!(found.results()[0].key(), "louvre");
/// assert_eq!(found.len(), 2);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn proximity_search<E>(
    query: &ProximityQuery,
    base_query: Option<&GeocellQuery>,
    engine: &E,
) -> Result<SearchResults<E::Entity>>
where
    E: GeocellQueryEngine + ?Sized,
{
    query.validate()?;

    let mut search = SearchContext::new(query)?;
    search.run(base_query, engine)?;
    Ok(search.finish())
}

/// Working state of one search, dropped when it returns.
struct SearchContext<'q, T> {
    query: &'q ProximityQuery,
    /// Ancestor of the center cell at the ring's current resolution.
    containing: String,
    /// Same-resolution cells forming a rectangle around the center.
    ring: Vec<String>,
    searched: FxHashSet<String>,
    results: Vec<T>,
    distances: Vec<f64>,
    sorted_edges: SortedEdges,
    /// Set once the ring holds every top-level cell.
    exhausted: bool,
}

impl<'q, T: LocationCapable> SearchContext<'q, T> {
    fn new(query: &'q ProximityQuery) -> Result<Self> {
        let containing = compute(&query.center, query.max_geocell_resolution)?;
        Ok(Self {
            query,
            ring: vec![containing.clone()],
            containing,
            searched: FxHashSet::default(),
            results: Vec::with_capacity(query.max_results),
            distances: Vec::with_capacity(query.max_results),
            sorted_edges: smallvec![(Direction::NONE, 0.0)],
            exhausted: false,
        })
    }

    fn run<E>(&mut self, base_query: Option<&GeocellQuery>, engine: &E) -> Result<()>
    where
        E: GeocellQueryEngine<Entity = T> + ?Sized,
    {
        while !self.ring.is_empty() && self.results.len() < self.query.max_results {
            let closest_possible = self.sorted_edges.first().map_or(0.0, |(_, d)| *d);
            if self.query.max_distance > 0.0 && closest_possible > self.query.max_distance {
                debug!(
                    "Nearest unsearched edge is {:.1}m away, past the {:.1}m limit",
                    closest_possible, self.query.max_distance
                );
                break;
            }

            let unsearched: Vec<String> = self
                .ring
                .iter()
                .filter(|cell| !self.searched.contains(*cell))
                .cloned()
                .collect();

            let fetched = if unsearched.is_empty() {
                Vec::new()
            } else {
                engine.query(base_query, None, &unsearched)?
            };
            debug!(
                "Fetched {} entities from [{}]",
                fetched.len(),
                unsearched.join(", ")
            );

            self.searched.extend(self.ring.iter().cloned());

            let fetched_any = !fetched.is_empty();
            for entity in fetched {
                self.merge(entity);
            }

            if self.exhausted {
                break;
            }

            self.sorted_edges = distance_sorted_edges(&self.ring, &self.query.center)?;
            self.expand(fetched_any)?;

            if self.results.len() < self.query.max_results {
                debug!(
                    "{} results found but want {}, continuing search",
                    self.results.len(),
                    self.query.max_results
                );
            }
        }

        Ok(())
    }

    /// Insert an entity keeping `results` sorted by distance and bounded.
    fn merge(&mut self, entity: T) {
        let meters = distance(&self.query.center, &entity.location());
        if meters.is_nan() || !self.query.accepts(meters) {
            return;
        }

        let start = self.distances.partition_point(|d| *d < meters);
        let end = start + self.distances[start..].partition_point(|d| *d <= meters);

        // Equal distance may be the same entity fetched again from another cell.
        let key = entity.key_string();
        if self.results[start..end]
            .iter()
            .any(|existing| existing.key_string() == key)
        {
            return;
        }

        self.results.insert(end, entity);
        self.distances.insert(end, meters);

        self.results.truncate(self.query.max_results);
        self.distances.truncate(self.query.max_results);
    }

    /// Grow the ring for the next round.
    fn expand(&mut self, fetched_any: bool) -> Result<()> {
        if !fetched_any || self.ring.len() == 4 {
            self.climb();
        } else if self.ring.len() == 1 {
            let cell = &self.ring[0];
            let next = self
                .sorted_edges
                .iter()
                .find_map(|(direction, _)| adjacent(cell, *direction));
            if let Some(next) = next {
                debug!("Extending ring from {} to {}", cell, next);
                self.ring.push(next);
            }
        } else if self.ring.len() == 2 {
            let first = CellCoords::parse(&self.ring[0])?;
            let second = CellCoords::parse(&self.ring[1])?;
            let vertical_pair = first.x == second.x;

            // Grow across the axis the pair already spans, on the nearest
            // side that stays on the grid.
            let extra = self
                .sorted_edges
                .iter()
                .map(|(direction, _)| *direction)
                .filter(|direction| {
                    if vertical_pair {
                        direction.is_horizontal()
                    } else {
                        direction.is_vertical()
                    }
                })
                .find_map(|direction| {
                    self.ring
                        .iter()
                        .map(|cell| adjacent(cell, direction))
                        .collect::<Option<Vec<String>>>()
                });

            if let Some(extra) = extra {
                debug!("Extending ring by [{}]", extra.join(", "));
                self.ring.extend(extra);
            }
        }

        Ok(())
    }

    /// Replace the ring by its parents, or by every top-level cell once the
    /// center's ancestry is used up.
    fn climb(&mut self) {
        let containing_parent = parent(&self.containing).unwrap_or("").to_string();
        self.containing = containing_parent;

        if self.containing.is_empty() {
            debug!("Searching all top-level geocells");
            self.ring = GEOCELL_ALPHABET.chars().map(String::from).collect();
            self.exhausted = true;
            return;
        }

        let mut parents: Vec<String> = Vec::with_capacity(self.ring.len());
        for cell in &self.ring {
            if let Some(p) = parent(cell).filter(|p| !p.is_empty())
                && !parents.iter().any(|existing| existing == p)
            {
                parents.push(p.to_string());
            }
        }

        debug!(
            "Climbing to resolution {} with [{}]",
            self.containing.len(),
            parents.join(", ")
        );
        self.ring = parents;
    }

    fn finish(self) -> SearchResults<T> {
        let last_resolution = self.ring.first().map_or(0, String::len);
        SearchResults::new(self.results, self.distances, last_resolution)
    }
}
