use crate::error::CoordinateError;
use crate::point::Point;
use crate::{MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};
use geo::Rect;
use serde::{Deserialize, Serialize};

/// A latitude/longitude rectangle given by its north, east, south and west edges.
///
/// A box whose `east` is smaller than its `west` wraps across the antimeridian
/// (±180° longitude). That is a valid box, not an error.
///
/// # Examples
///
/// ```
/// use geocell_types::{BoundingBox, Point};
///
/// // Fiji straddles the antimeridian.
/// let fiji = BoundingBox::new(-12.0, -178.0, -21.0, 176.0).unwrap();
/// assert!(fiji.crosses_antimeridian());
/// assert!(fiji.contains(&Point::new(-17.7, 178.0).unwrap()));
/// assert!(fiji.contains(&Point::new(-17.7, -179.5).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox")]
pub struct BoundingBox {
    north: f64,
    east: f64,
    south: f64,
    west: f64,
}

#[derive(Deserialize)]
struct RawBoundingBox {
    north: f64,
    east: f64,
    south: f64,
    west: f64,
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = CoordinateError;

    fn try_from(raw: RawBoundingBox) -> Result<Self, Self::Error> {
        BoundingBox::new(raw.north, raw.east, raw.south, raw.west)
    }
}

impl BoundingBox {
    /// Create a bounding box from its edges, in degrees.
    ///
    /// Latitudes must be within [-90, 90] with `north >= south`; longitudes
    /// must be within [-180, 180].
    pub fn new(north: f64, east: f64, south: f64, west: f64) -> Result<Self, CoordinateError> {
        for lat in [north, south] {
            if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
                return Err(CoordinateError::Latitude(lat));
            }
        }
        for lon in [east, west] {
            if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lon) {
                return Err(CoordinateError::Longitude(lon));
            }
        }
        if north < south {
            return Err(CoordinateError::InvertedLatitudes { north, south });
        }

        Ok(Self {
            north,
            east,
            south,
            west,
        })
    }

    /// The whole encodable space.
    pub fn world() -> Self {
        Self {
            north: MAX_LATITUDE,
            east: MAX_LONGITUDE,
            south: MIN_LATITUDE,
            west: MIN_LONGITUDE,
        }
    }

    /// Box spanned by two corner points.
    pub fn from_corners(north_east: Point, south_west: Point) -> Result<Self, CoordinateError> {
        Self::new(
            north_east.latitude(),
            north_east.longitude(),
            south_west.latitude(),
            south_west.longitude(),
        )
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    /// The north-east corner.
    pub fn north_east(&self) -> Point {
        Point::from_validated(self.north, self.east)
    }

    /// The south-west corner.
    pub fn south_west(&self) -> Point {
        Point::from_validated(self.south, self.west)
    }

    /// Whether the box wraps across ±180° longitude.
    pub fn crosses_antimeridian(&self) -> bool {
        self.east < self.west
    }

    /// Check whether a point lies inside the box, edges included.
    pub fn contains(&self, point: &Point) -> bool {
        let lat = point.latitude();
        let lon = point.longitude();

        if lat < self.south || lat > self.north {
            return false;
        }

        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }

    /// Check whether `other` lies entirely inside this box.
    ///
    /// Only meaningful for boxes that do not cross the antimeridian.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.north <= self.north
            && other.south >= self.south
            && other.east <= self.east
            && other.west >= self.west
    }

    /// Latitude extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees, accounting for antimeridian wrap.
    pub fn lon_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            (MAX_LONGITUDE - self.west) + (self.east - MIN_LONGITUDE)
        } else {
            self.east - self.west
        }
    }

    /// Convert to a `geo::Rect` (x = longitude, y = latitude).
    ///
    /// Returns `None` for antimeridian boxes, which a single `Rect` cannot express.
    pub fn to_rect(&self) -> Option<Rect<f64>> {
        if self.crosses_antimeridian() {
            return None;
        }

        Some(Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        ))
    }
}

impl TryFrom<Rect<f64>> for BoundingBox {
    type Error = CoordinateError;

    fn try_from(rect: Rect<f64>) -> Result<Self, Self::Error> {
        BoundingBox::new(rect.max().y, rect.max().x, rect.min().y, rect.min().x)
    }
}
