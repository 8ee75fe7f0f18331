//! Search configuration.
//!
//! [`Config`] carries the tunables shared by the bounding-box selector and the
//! proximity search. It is serializable so it can live next to the rest of an
//! application's settings in JSON or TOML.
use crate::compute::geocell::MAX_GEOCELL_RESOLUTION;
use crate::error::Result;
use serde::de::Error;
use std::path::Path;

/// Geocell search configuration
///
/// # Example
///
/// ```rust
/// use geocell::Config;
///
/// let json = r#"{
///     "max_geocell_resolution": 11,
///     "default_max_results": 25
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.max_geocell_resolution, 11);
/// assert_eq!(config.max_feasible_bbox_search_cells, 300);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Resolution at which proximity searches start (1-13, default: 13)
    #[serde(default = "Config::default_max_geocell_resolution")]
    pub max_geocell_resolution: usize,

    /// Resolutions whose bounding-box covering exceeds this many cells are skipped
    #[serde(default = "Config::default_max_feasible_bbox_search_cells")]
    pub max_feasible_bbox_search_cells: usize,

    /// Result count used when a search does not specify one
    #[serde(default = "Config::default_max_results")]
    pub default_max_results: usize,
}

impl Config {
    const fn default_max_geocell_resolution() -> usize {
        MAX_GEOCELL_RESOLUTION
    }

    const fn default_max_feasible_bbox_search_cells() -> usize {
        300
    }

    const fn default_max_results() -> usize {
        10
    }

    pub fn with_max_geocell_resolution(mut self, resolution: usize) -> Self {
        assert!(
            (1..=MAX_GEOCELL_RESOLUTION).contains(&resolution),
            "Geocell resolution must be between 1 and 13"
        );
        self.max_geocell_resolution = resolution;
        self
    }

    pub fn with_max_feasible_bbox_search_cells(mut self, max_cells: usize) -> Self {
        assert!(max_cells > 0, "Feasible cell count must be greater than zero");

        if max_cells > 10_000 {
            log::warn!(
                "Feasible bbox cell count of {} is very large; each candidate set is \
                materialized and sorted during selection.",
                max_cells
            );
        }

        self.max_feasible_bbox_search_cells = max_cells;
        self
    }

    pub fn with_default_max_results(mut self, max_results: usize) -> Self {
        assert!(max_results > 0, "Max results must be greater than zero");
        self.default_max_results = max_results;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(1..=MAX_GEOCELL_RESOLUTION).contains(&self.max_geocell_resolution) {
            return Err("Geocell resolution must be between 1 and 13".to_string());
        }

        if self.max_feasible_bbox_search_cells == 0 {
            return Err("Feasible cell count must be greater than zero".to_string());
        }

        if self.default_max_results == 0 {
            return Err("Max results must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a file, picking the format from its extension.
    ///
    /// `.toml` files need the `toml` feature; anything else is read as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => Ok(Self::from_toml(&contents)?),
            #[cfg(not(feature = "toml"))]
            Some("toml") => Err(crate::error::GeocellError::Config(format!(
                "{} is TOML but the `toml` feature is disabled",
                path.display()
            ))),
            _ => Ok(Self::from_json(&contents)?),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_geocell_resolution: Self::default_max_geocell_resolution(),
            max_feasible_bbox_search_cells: Self::default_max_feasible_bbox_search_cells(),
            default_max_results: Self::default_max_results(),
        }
    }
}
