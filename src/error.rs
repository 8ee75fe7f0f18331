//! Error types for geocell computation and search.

use geocell_types::CoordinateError;
use thiserror::Error;

/// Errors raised by the codec, the search algorithms and query engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocellError {
    /// A point or bounding box had out-of-range coordinates.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    /// A geocell string or other input value was malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A search parameter was out of its permitted range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration or base-query setup error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The query engine failed to execute a fetch.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Reading or decoding a configuration document failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for geocell operations.
pub type Result<T> = std::result::Result<T, GeocellError>;

impl From<serde_json::Error> for GeocellError {
    fn from(err: serde_json::Error) -> Self {
        GeocellError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GeocellError {
    fn from(err: std::io::Error) -> Self {
        GeocellError::Serialization(err.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for GeocellError {
    fn from(err: toml::de::Error) -> Self {
        GeocellError::Serialization(err.to_string())
    }
}
