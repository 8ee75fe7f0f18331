//! Great-circle distance.

use geo::{Distance, HaversineMeasure};
use geocell_types::Point;

/// Earth radius used for every distance in this crate, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_010.0;

/// Haversine great-circle distance between two points, in meters.
///
/// # Examples
///
/// ```rust
/// use geocell::compute::distance::distance;
/// use geocell::Point;
///
/// let nyc = Point::new(40.7128, -74.0060)?;
/// let la = Point::new(34.0522, -118.2437)?;
///
/// let meters = distance(&nyc, &la);
/// assert!(meters > 3_900_000.0 && meters < 4_000_000.0);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    EARTH.distance(geo::Point::from(*p1), geo::Point::from(*p2))
}

const EARTH: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_METERS);
