use crate::error::CoordinateError;
use crate::{MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable geographic point in degrees.
///
/// Latitude must lie in [-90, 90] and longitude in [-180, 180]; anything else
/// (including NaN) is rejected at construction time rather than clamped.
///
/// Points order lexicographically by (latitude, longitude).
///
/// # Examples
///
/// ```
/// use geocell_types::Point;
///
/// let nyc = Point::new(40.7128, -74.0060).unwrap();
/// assert_eq!(nyc.latitude(), 40.7128);
///
/// assert!(Point::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct Point {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for Point {
    type Error = CoordinateError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Point::new(raw.latitude, raw.longitude)
    }
}

impl Point {
    /// Create a point from latitude and longitude in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }

        // Adding 0.0 folds -0.0 into 0.0 so equality and hashing agree.
        Ok(Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        })
    }

    /// Build from coordinates already range-checked elsewhere in this crate.
    pub(crate) fn from_validated(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        }
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in radians.
    pub fn latitude_radians(&self) -> f64 {
        self.latitude.to_radians()
    }

    /// Longitude in radians.
    pub fn longitude_radians(&self) -> f64 {
        self.longitude.to_radians()
    }
}

// Construction rejects NaN, so the partial order is total.
impl Eq for Point {}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(point: Point) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

impl TryFrom<geo::Point<f64>> for Point {
    type Error = CoordinateError;

    /// `geo` points are (x = longitude, y = latitude).
    fn try_from(point: geo::Point<f64>) -> Result<Self, Self::Error> {
        Point::new(point.y(), point.x())
    }
}
