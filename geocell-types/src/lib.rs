//! # geocell-types
//!
//! Geographic value types shared by the `geocell` crate and its query backends.
//!
//! - [`Point`]: a validated latitude/longitude pair in degrees
//! - [`BoundingBox`]: a north/east/south/west rectangle, which may cross the
//!   antimeridian when `east < west`
//!
//! Both types are plain values, serializable with Serde, and convert to the
//! `geo` crate's primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocell_types::{BoundingBox, Point};
//!
//! let paris = Point::new(48.8566, 2.3522).unwrap();
//! let france = BoundingBox::new(51.1, 9.6, 41.3, -5.2).unwrap();
//! assert!(france.contains(&paris));
//! ```

pub mod bbox;
pub mod error;
pub mod point;

pub use bbox::BoundingBox;
pub use error::CoordinateError;
pub use point::Point;

/// Southern limit of the latitude range, in degrees.
pub const MIN_LATITUDE: f64 = -90.0;
/// Northern limit of the latitude range, in degrees.
pub const MAX_LATITUDE: f64 = 90.0;
/// Western limit of the longitude range, in degrees.
pub const MIN_LONGITUDE: f64 = -180.0;
/// Eastern limit of the longitude range, in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;
