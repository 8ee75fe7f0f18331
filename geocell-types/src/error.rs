use thiserror::Error;

/// Rejected coordinate values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("Latitude must be in [-90, 90] but was {0}")]
    Latitude(f64),

    #[error("Longitude must be in [-180, 180] but was {0}")]
    Longitude(f64),

    #[error("North ({north}) must not be south of south ({south})")]
    InvertedLatitudes { north: f64, south: f64 },
}
