//! Bounding-box cell selection and fetching.
//!
//! [`best_bbox_search_cells`] picks one resolution and returns every cell of
//! that resolution overlapping a box, trading cell count against resolution
//! through a [`CostFunction`].

use crate::compute::geocell::{
    MAX_GEOCELL_RESOLUTION, common_prefix_len, compute, interpolate, interpolation_count,
};
use crate::error::{GeocellError, Result};
use crate::query::{GeocellQuery, GeocellQueryEngine, LocationCapable};
use geocell_types::{BoundingBox, MAX_LONGITUDE, MIN_LONGITUDE};
use rustc_hash::FxHashSet;

/// Resolutions needing more cells than this are never considered.
pub const MAX_FEASIBLE_BBOX_SEARCH_CELLS: usize = 300;

/// Scores a candidate cell set by its size and resolution; lower is better.
pub trait CostFunction {
    fn cost(&self, num_cells: usize, resolution: usize) -> f64;
}

impl<F> CostFunction for F
where
    F: Fn(usize, usize) -> f64,
{
    fn cost(&self, num_cells: usize, resolution: usize) -> f64 {
        self(num_cells, resolution)
    }
}

/// Free up to 16 cells, prohibitive beyond.
///
/// Selection therefore settles on the finest resolution covering the box in
/// at most 16 cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultCostFunction;

impl CostFunction for DefaultCostFunction {
    fn cost(&self, num_cells: usize, _resolution: usize) -> f64 {
        if num_cells > 16 { f64::MAX } else { 0.0 }
    }
}

/// Cells of a single resolution whose union covers `bbox`.
///
/// Resolutions are tried from coarse to fine, starting at the deepest level
/// where both corners still share a cell. The cheapest set wins, and the
/// search stops at the first resolution whose cost exceeds the best so far,
/// so a cost function that dips again later is not explored further.
///
/// A box crossing the antimeridian (`east < west`) is split at ±180°. Each
/// half is solved on its own and the two cell lists are concatenated, so the
/// halves may differ in resolution.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::bbox::best_bbox_search_cells;
/// use geocell::BoundingBox;
///
/// let bbox = BoundingBox::new(10.0, 10.0, -10.0, -10.0)?;
/// let cells = best_bbox_search_cells(&bbox, None)?;
/// assert_eq!(cells, vec!["3f", "6a", "95", "c0"]);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn best_bbox_search_cells(
    bbox: &BoundingBox,
    cost_function: Option<&dyn CostFunction>,
) -> Result<Vec<String>> {
    best_bbox_search_cells_with_limit(bbox, cost_function, MAX_FEASIBLE_BBOX_SEARCH_CELLS)
}

/// [`best_bbox_search_cells`] with a custom feasibility ceiling.
pub fn best_bbox_search_cells_with_limit(
    bbox: &BoundingBox,
    cost_function: Option<&dyn CostFunction>,
    max_cells: usize,
) -> Result<Vec<String>> {
    if bbox.crosses_antimeridian() {
        let east_half = BoundingBox::new(bbox.north(), bbox.east(), bbox.south(), MIN_LONGITUDE)?;
        let west_half = BoundingBox::new(bbox.north(), MAX_LONGITUDE, bbox.south(), bbox.west())?;

        let mut cells = best_bbox_search_cells_with_limit(&east_half, cost_function, max_cells)?;
        cells.extend(best_bbox_search_cells_with_limit(
            &west_half,
            cost_function,
            max_cells,
        )?);
        return Ok(cells);
    }

    let cost_function = cost_function.unwrap_or(&DefaultCostFunction);

    let cell_ne = compute(&bbox.north_east(), MAX_GEOCELL_RESOLUTION)?;
    let cell_sw = compute(&bbox.south_west(), MAX_GEOCELL_RESOLUTION)?;

    // Coarser than the common prefix, the whole box sits in one cell.
    let min_resolution = common_prefix_len(&cell_ne, &cell_sw).max(1);

    let mut min_cost = f64::MAX;
    let mut best: Vec<String> = Vec::new();

    for resolution in min_resolution..=MAX_GEOCELL_RESOLUTION {
        let cur_ne = &cell_ne[..resolution];
        let cur_sw = &cell_sw[..resolution];

        let num_cells = interpolation_count(cur_ne, cur_sw)?;
        if num_cells > max_cells {
            continue;
        }

        let mut cells = interpolate(cur_ne, cur_sw)?;
        cells.sort();

        let cost = cost_function.cost(cells.len(), resolution);
        if cost <= min_cost {
            min_cost = cost;
            best = cells;
        } else {
            if best.is_empty() {
                best = cells;
            }
            break;
        }
    }

    log::info!(
        "Selected {} geocells [{}] for box ({}, {}) ({}, {})",
        best.len(),
        best.join(", "),
        bbox.south(),
        bbox.west(),
        bbox.north(),
        bbox.east()
    );

    Ok(best)
}

/// Fetch up to `max_results` entities located inside `bbox`.
///
/// The backend is queried once with the cells picked by
/// [`best_bbox_search_cells`]. Entities outside the box itself (cells overhang
/// its edges) and repeated identities are dropped; backend order is kept.
pub fn bounding_box_fetch<E>(
    bbox: &BoundingBox,
    max_results: usize,
    base_query: Option<&GeocellQuery>,
    engine: &E,
    cost_function: Option<&dyn CostFunction>,
) -> Result<Vec<E::Entity>>
where
    E: GeocellQueryEngine + ?Sized,
{
    let cells = best_bbox_search_cells(bbox, cost_function)?;
    fetch_in_box(bbox, &cells, max_results, base_query, engine)
}

/// Query `cells` and keep the first `max_results` distinct entities inside `bbox`.
pub(crate) fn fetch_in_box<E>(
    bbox: &BoundingBox,
    cells: &[String],
    max_results: usize,
    base_query: Option<&GeocellQuery>,
    engine: &E,
) -> Result<Vec<E::Entity>>
where
    E: GeocellQueryEngine + ?Sized,
{
    if max_results == 0 {
        return Err(GeocellError::InvalidArgument(
            "max_results must be greater than zero".to_string(),
        ));
    }
    if cells.is_empty() {
        return Ok(Vec::new());
    }

    let fetched = engine.query(base_query, None, cells)?;
    log::debug!(
        "Bounding box fetch returned {} candidates from {} geocells",
        fetched.len(),
        cells.len()
    );

    let mut seen = FxHashSet::default();
    let mut results = Vec::with_capacity(max_results.min(fetched.len()));
    for entity in fetched {
        if results.len() >= max_results {
            break;
        }
        if !bbox.contains(&entity.location()) {
            continue;
        }
        if seen.insert(entity.key_string().to_string()) {
            results.push(entity);
        }
    }

    Ok(results)
}
