//! Validation for geocell strings and search parameters.

use crate::compute::geocell::{GEOCELL_ALPHABET, MAX_GEOCELL_RESOLUTION};
use crate::error::{GeocellError, Result};

/// Validates a geocell string: lowercase hex symbols, at most 13 of them.
///
/// The empty string is accepted; it denotes the whole encodable space.
///
/// # Examples
///
/// ```
/// use geocell::compute::validation::validate_geocell;
///
/// assert!(validate_geocell("8e3a").is_ok());
/// assert!(validate_geocell("").is_ok());
///
/// assert!(validate_geocell("8g").is_err());
/// assert!(validate_geocell("8E").is_err());
/// assert!(validate_geocell("00000000000000").is_err());
/// ```
pub fn validate_geocell(cell: &str) -> Result<()> {
    if cell.len() > MAX_GEOCELL_RESOLUTION {
        return Err(GeocellError::InvalidInput(format!(
            "Geocell '{}' exceeds the maximum resolution of {}",
            cell, MAX_GEOCELL_RESOLUTION
        )));
    }

    if let Some(bad) = cell.chars().find(|c| !GEOCELL_ALPHABET.contains(*c)) {
        return Err(GeocellError::InvalidInput(format!(
            "Geocell '{}' contains invalid symbol '{}'",
            cell, bad
        )));
    }

    Ok(())
}

/// Validates several geocells, reporting the index of the first bad one.
pub fn validate_geocells<S: AsRef<str>>(cells: &[S]) -> Result<()> {
    for (idx, cell) in cells.iter().enumerate() {
        validate_geocell(cell.as_ref()).map_err(|e| {
            GeocellError::InvalidInput(format!("Geocell at index {}: {}", idx, e))
        })?;
    }
    Ok(())
}

/// Validates a resolution lies in `1..=13`.
pub fn validate_resolution(resolution: usize) -> Result<()> {
    if !(1..=MAX_GEOCELL_RESOLUTION).contains(&resolution) {
        return Err(GeocellError::InvalidArgument(format!(
            "Invalid resolution {}; must be between 1 and {}",
            resolution, MAX_GEOCELL_RESOLUTION
        )));
    }
    Ok(())
}

/// Validates a distance bound in meters: finite and not negative.
pub fn validate_distance(name: &str, meters: f64) -> Result<()> {
    if !meters.is_finite() {
        return Err(GeocellError::InvalidArgument(format!(
            "{} must be finite, got: {}",
            name, meters
        )));
    }
    if meters < 0.0 {
        return Err(GeocellError::InvalidArgument(format!(
            "{} must not be negative, got: {}",
            name, meters
        )));
    }
    Ok(())
}
