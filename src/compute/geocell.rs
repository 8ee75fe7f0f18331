//! The geocell codec.
//!
//! A geocell is a hexadecimal string naming a rectangle inside the
//! [-90, 90] x [-180, 180] latitude/longitude space. Its length is its
//! resolution, and every prefix of a geocell is one of its ancestors.
//!
//! The first symbol picks one cell of a 4x4 grid laid over the whole space:
//!
//! ```text
//!              +---+---+---+---+ (90, 180)
//!              | a | b | e | f |
//!              +---+---+---+---+
//!              | 8 | 9 | c | d |
//!              +---+---+---+---+
//!              | 2 | 3 | 6 | 7 |
//!              +---+---+---+---+
//!              | 0 | 1 | 4 | 5 |
//!   (-90,-180) +---+---+---+---+
//! ```
//!
//! Each further symbol re-divides the current rectangle into another 4x4 grid
//! with the same layout. Cell `7` spans (-45, 90) to (0, 180); inside it,
//! `78a` is the rectangle reached by taking `8` in `7`'s grid and then `a`
//! inside that.
//!
//! A point lying exactly on an edge shared by two cells belongs to the cell
//! north and/or east of the edge. Points on the north pole or on +180°
//! longitude belong to the last row or column.

use crate::compute::distance::distance;
use crate::compute::validation::validate_geocell;
use crate::error::{GeocellError, Result};
use geocell_types::{
    BoundingBox, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE, Point,
};
use smallvec::SmallVec;

/// The maximum practical geocell resolution.
pub const MAX_GEOCELL_RESOLUTION: usize = 13;

/// Cells per side of the grid each symbol subdivides into.
pub const GEOCELL_GRID_SIZE: usize = 4;

/// Symbols, in index order; see the module docs for their grid positions.
pub const GEOCELL_ALPHABET: &str = "0123456789abcdef";

const ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// Edge directions ordered by distance from a point, nearest first.
pub type SortedEdges = SmallVec<[(Direction, f64); 4]>;

/// A step on the geocell grid: `dx` is east(+1)/west(-1), `dy` is north(+1)/south(-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    dx: i8,
    dy: i8,
}

impl Direction {
    pub const NORTHWEST: Direction = Direction { dx: -1, dy: 1 };
    pub const NORTH: Direction = Direction { dx: 0, dy: 1 };
    pub const NORTHEAST: Direction = Direction { dx: 1, dy: 1 };
    pub const EAST: Direction = Direction { dx: 1, dy: 0 };
    pub const SOUTHEAST: Direction = Direction { dx: 1, dy: -1 };
    pub const SOUTH: Direction = Direction { dx: 0, dy: -1 };
    pub const SOUTHWEST: Direction = Direction { dx: -1, dy: -1 };
    pub const WEST: Direction = Direction { dx: -1, dy: 0 };
    /// No movement; `adjacent` returns the cell itself.
    pub const NONE: Direction = Direction { dx: 0, dy: 0 };

    /// The eight neighbor directions, clockwise from north-west.
    pub const ALL: [Direction; 8] = [
        Self::NORTHWEST,
        Self::NORTH,
        Self::NORTHEAST,
        Self::EAST,
        Self::SOUTHEAST,
        Self::SOUTH,
        Self::SOUTHWEST,
        Self::WEST,
    ];

    /// Build a direction from components in {-1, 0, 1}.
    pub fn new(dx: i8, dy: i8) -> Result<Self> {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            return Err(GeocellError::InvalidArgument(format!(
                "Direction components must be -1, 0 or 1, got ({}, {})",
                dx, dy
            )));
        }
        Ok(Self { dx, dy })
    }

    pub fn dx(&self) -> i8 {
        self.dx
    }

    pub fn dy(&self) -> i8 {
        self.dy
    }

    pub fn is_none(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Purely north or south.
    pub fn is_vertical(&self) -> bool {
        self.dx == 0 && self.dy != 0
    }

    /// Purely east or west.
    pub fn is_horizontal(&self) -> bool {
        self.dy == 0 && self.dx != 0
    }
}

/// Integer position of a cell on the grid of its own resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellCoords {
    pub(crate) x: u64,
    pub(crate) y: u64,
    pub(crate) resolution: usize,
}

impl CellCoords {
    pub(crate) fn parse(cell: &str) -> Result<Self> {
        validate_geocell(cell)?;

        let (mut x, mut y) = (0u64, 0u64);
        for idx in cell.bytes().filter_map(symbol_index) {
            let (cx, cy) = subdiv_xy(idx);
            x = x * GEOCELL_GRID_SIZE as u64 + cx;
            y = y * GEOCELL_GRID_SIZE as u64 + cy;
        }

        Ok(Self {
            x,
            y,
            resolution: cell.len(),
        })
    }

    pub(crate) fn to_geocell(self) -> String {
        let mut cell = String::with_capacity(self.resolution);
        for level in (0..self.resolution).rev() {
            let shift = 2 * level;
            cell.push(subdiv_char((self.x >> shift) & 3, (self.y >> shift) & 3));
        }
        cell
    }

    /// Shift by one step, or `None` when that leaves the encodable space.
    fn step(self, direction: Direction) -> Option<Self> {
        let extent = grid_extent(self.resolution);
        Some(Self {
            x: offset(self.x, direction.dx, extent)?,
            y: offset(self.y, direction.dy, extent)?,
            resolution: self.resolution,
        })
    }
}

/// Number of cells per side at a resolution (4^resolution).
fn grid_extent(resolution: usize) -> u64 {
    1u64 << (2 * resolution)
}

fn offset(value: u64, delta: i8, extent: u64) -> Option<u64> {
    match delta {
        0 => Some(value),
        1 => value.checked_add(1).filter(|v| *v < extent),
        -1 => value.checked_sub(1),
        _ => None,
    }
}

fn symbol_index(symbol: u8) -> Option<u8> {
    ALPHABET
        .iter()
        .position(|s| *s == symbol)
        .map(|idx| idx as u8)
}

/// Grid column and row of a symbol.
fn subdiv_xy(idx: u8) -> (u64, u64) {
    let x = ((idx & 4) >> 1) | (idx & 1);
    let y = ((idx & 8) >> 2) | ((idx & 2) >> 1);
    (x as u64, y as u64)
}

/// Symbol for a grid column and row.
fn subdiv_char(x: u64, y: u64) -> char {
    let idx = (y & 2) << 2 | (x & 2) << 1 | (y & 1) << 1 | (x & 1);
    ALPHABET[idx as usize] as char
}

/// Row or column of `value` within `[low, high]` split into 4 bands.
fn grid_index(value: f64, low: f64, high: f64) -> u64 {
    let grid = GEOCELL_GRID_SIZE as f64;
    let idx = (grid * (value - low) / (high - low)).floor().max(0.0) as u64;
    idx.min(GEOCELL_GRID_SIZE as u64 - 1)
}

/// Compute the geocell containing `point` at the given resolution.
///
/// Resolution 0 yields the empty string, the ancestor of every cell.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::geocell::compute;
/// use geocell::Point;
///
/// let point = Point::new(-20.0, 130.0)?;
/// assert_eq!(compute(&point, 1)?, "7");
/// assert_eq!(compute(&point, 4)?.len(), 4);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn compute(point: &Point, resolution: usize) -> Result<String> {
    if resolution > MAX_GEOCELL_RESOLUTION {
        return Err(GeocellError::InvalidArgument(format!(
            "Invalid resolution {}; must be at most {}",
            resolution, MAX_GEOCELL_RESOLUTION
        )));
    }

    let grid = GEOCELL_GRID_SIZE as f64;
    let (mut north, mut east, mut south, mut west) =
        (MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE);

    let mut cell = String::with_capacity(resolution);
    while cell.len() < resolution {
        let lon_span = (east - west) / grid;
        let lat_span = (north - south) / grid;

        let x = grid_index(point.longitude(), west, east);
        let y = grid_index(point.latitude(), south, north);
        cell.push(subdiv_char(x, y));

        south += lat_span * y as f64;
        north = south + lat_span;
        west += lon_span * x as f64;
        east = west + lon_span;
    }

    Ok(cell)
}

/// Decode a geocell into the rectangle it names.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::geocell::decode;
///
/// let bbox = decode("7")?;
/// assert_eq!((bbox.north(), bbox.east(), bbox.south(), bbox.west()), (0.0, 180.0, -45.0, 90.0));
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn decode(cell: &str) -> Result<BoundingBox> {
    validate_geocell(cell)?;

    let grid = GEOCELL_GRID_SIZE as f64;
    let (mut north, mut east, mut south, mut west) =
        (MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE);

    for idx in cell.bytes().filter_map(symbol_index) {
        let lon_span = (east - west) / grid;
        let lat_span = (north - south) / grid;
        let (x, y) = subdiv_xy(idx);

        south += lat_span * y as f64;
        north = south + lat_span;
        west += lon_span * x as f64;
        east = west + lon_span;
    }

    Ok(BoundingBox::new(north, east, south, west)?)
}

/// Alias of [`decode`].
pub fn compute_box(cell: &str) -> Result<BoundingBox> {
    decode(cell)
}

/// Whether `cell` is a non-empty, well-formed geocell.
pub fn is_valid(cell: &str) -> bool {
    !cell.is_empty() && validate_geocell(cell).is_ok()
}

/// The immediate ancestor of a cell, or `None` for the empty root.
pub fn parent(cell: &str) -> Option<&str> {
    cell.char_indices().next_back().map(|(idx, _)| &cell[..idx])
}

/// The 16 cells one resolution finer than `cell`, in symbol order.
pub fn children(cell: &str) -> Result<Vec<String>> {
    validate_geocell(cell)?;
    if cell.len() >= MAX_GEOCELL_RESOLUTION {
        return Err(GeocellError::InvalidInput(format!(
            "Geocell '{}' is already at the maximum resolution",
            cell
        )));
    }

    Ok(GEOCELL_ALPHABET
        .chars()
        .map(|symbol| {
            let mut child = String::with_capacity(cell.len() + 1);
            child.push_str(cell);
            child.push(symbol);
            child
        })
        .collect())
}

/// The same-resolution neighbor of `cell` one step in `direction`.
///
/// Returns `None` when the step would leave the encodable space: past either
/// pole or across the ±180° meridian. Invalid cells also yield `None`.
///
/// The neighbor may have a different prefix than `cell`; stepping east out of
/// the last column of a parent carries into the next parent over.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::geocell::{adjacent, Direction};
///
/// assert_eq!(adjacent("65", Direction::EAST).as_deref(), Some("70"));
/// assert_eq!(adjacent("a", Direction::NORTH), None);
/// ```
pub fn adjacent(cell: &str, direction: Direction) -> Option<String> {
    let coords = CellCoords::parse(cell).ok()?;
    coords.step(direction).map(CellCoords::to_geocell)
}

/// Neighbors in [`Direction::ALL`] order; `None` where the grid ends.
pub fn all_adjacents(cell: &str) -> Vec<Option<String>> {
    Direction::ALL
        .iter()
        .map(|direction| adjacent(cell, *direction))
        .collect()
}

fn corner_coords(cell_ne: &str, cell_sw: &str) -> Result<(CellCoords, CellCoords)> {
    let ne = CellCoords::parse(cell_ne)?;
    let sw = CellCoords::parse(cell_sw)?;

    if ne.resolution != sw.resolution {
        return Err(GeocellError::InvalidInput(format!(
            "Corner geocells '{}' and '{}' differ in resolution",
            cell_ne, cell_sw
        )));
    }

    Ok((ne, sw))
}

/// Number of cells in the rectangle whose north-east and south-west corners
/// are `cell_ne` and `cell_sw`.
///
/// Zero when `cell_ne` lies south or west of `cell_sw`.
pub fn interpolation_count(cell_ne: &str, cell_sw: &str) -> Result<usize> {
    let (ne, sw) = corner_coords(cell_ne, cell_sw)?;
    if ne.x < sw.x || ne.y < sw.y {
        return Ok(0);
    }

    let cols = ne.x - sw.x + 1;
    let rows = ne.y - sw.y + 1;
    Ok(usize::try_from(cols.saturating_mul(rows)).unwrap_or(usize::MAX))
}

/// Every cell in the rectangle spanned by `cell_ne` and `cell_sw`, corners included.
///
/// Cells are listed row by row from the south, each row west to east.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::geocell::interpolate;
///
/// assert_eq!(interpolate("c", "3")?, vec!["3", "6", "9", "c"]);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn interpolate(cell_ne: &str, cell_sw: &str) -> Result<Vec<String>> {
    let (ne, sw) = corner_coords(cell_ne, cell_sw)?;
    if ne.x < sw.x || ne.y < sw.y {
        return Ok(Vec::new());
    }

    let mut cells = Vec::with_capacity(interpolation_count(cell_ne, cell_sw)?);
    for y in sw.y..=ne.y {
        for x in sw.x..=ne.x {
            cells.push(
                CellCoords {
                    x,
                    y,
                    resolution: ne.resolution,
                }
                .to_geocell(),
            );
        }
    }
    Ok(cells)
}

/// Distances from `center` to the four edges of the box covering `cells`,
/// nearest first.
///
/// Edges are measured along the center's own meridian (north/south) or
/// parallel (east/west). Equal distances keep the order north, south, west,
/// east. An empty cell list yields no edges.
pub fn distance_sorted_edges<S: AsRef<str>>(cells: &[S], center: &Point) -> Result<SortedEdges> {
    let mut boxes = cells.iter().map(|cell| decode(cell.as_ref()));
    let Some(first) = boxes.next().transpose()? else {
        return Ok(SortedEdges::new());
    };

    let (mut north, mut east, mut south, mut west) =
        (first.north(), first.east(), first.south(), first.west());
    for bbox in boxes {
        let bbox = bbox?;
        north = north.max(bbox.north());
        east = east.max(bbox.east());
        south = south.min(bbox.south());
        west = west.min(bbox.west());
    }

    let lat = center.latitude();
    let lon = center.longitude();
    let mut edges = SortedEdges::from_buf([
        (Direction::NORTH, distance(center, &Point::new(north, lon)?)),
        (Direction::SOUTH, distance(center, &Point::new(south, lon)?)),
        (Direction::WEST, distance(center, &Point::new(lat, west)?)),
        (Direction::EAST, distance(center, &Point::new(lat, east)?)),
    ]);

    // Stable, so ties keep the N, S, W, E order above.
    edges.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(edges)
}

/// Every geocell containing `point`, one per resolution from 1 to 13.
///
/// This is the value to store in an entity's indexed geocell field.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::geocell::generate_geocells;
/// use geocell::Point;
///
/// let cells = generate_geocells(&Point::new(37.7749, -122.4194)?)?;
/// assert_eq!(cells.len(), 13);
/// assert!(cells[12].starts_with(&cells[0]));
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn generate_geocells(point: &Point) -> Result<Vec<String>> {
    let finest = compute(point, MAX_GEOCELL_RESOLUTION)?;
    Ok((1..=MAX_GEOCELL_RESOLUTION)
        .map(|resolution| finest[..resolution].to_string())
        .collect())
}

/// Length of the longest common prefix of two geocells.
pub(crate) fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}
