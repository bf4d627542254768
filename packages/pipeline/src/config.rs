//! Pipeline configuration.
//!
//! Defaults are embedded from `config/default.toml`. A user file overrides
//! any subset of keys, and the `RESOURCES_DIR` / `TWEETS_PATH` environment
//! variables override the input and cache locations.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use eclipse_map_census::CensusColumns;
use eclipse_map_tally_models::WindowSpec;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Environment variable overriding [`PipelineConfig::resources_dir`].
pub const RESOURCES_DIR_ENV: &str = "RESOURCES_DIR";
/// Environment variable overriding [`PipelineConfig::tweets_path`].
pub const TWEETS_PATH_ENV: &str = "TWEETS_PATH";

/// Reverse-geocoding cache file name.
pub const REVGEO_FILE: &str = "revgeodata.json";
/// Census table cache file name.
pub const CENSUS_FILE: &str = "censusdata.json";
/// Tally distribution cache file name.
pub const COUNTY_TALLY_FILE: &str = "countytallydata.json";
/// Map topology cache file name.
pub const TOPOLOGY_FILE: &str = "USTopoJSON.json";
/// Tweet points output file name.
pub const TWEET_GEOJSON_FILE: &str = "tweetGeoJSON.json";
/// Totality path output file name.
pub const TOTALITY_GEOJSON_FILE: &str = "eclipseGeoJSON.json";

/// Sliding window parameters in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Shift between consecutive window starts.
    pub increment_minutes: i64,
    /// Window length.
    pub length_minutes: i64,
    /// Start of the first window (`"YYYY-MM-DDTHH:MM:SS"`); defaults to the
    /// first tweet.
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
}

/// Census population API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusConfig {
    /// Population table query URL.
    pub url: String,
    /// Header of the population column.
    pub population_column: String,
    /// Header of the county name column.
    pub name_column: String,
}

/// Reverse geocoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Coordinates-to-politics endpoint.
    pub url: String,
    /// Coordinate pairs per request.
    pub batch_size: usize,
}

/// Map topology used to fill in counties missing from the census.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Whether to add map counties absent from the census data.
    pub enabled: bool,
    /// `TopoJSON` URL.
    pub url: String,
}

/// Everything the pipeline stages need to locate inputs, caches, and
/// remote services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding caches and outputs.
    pub resources_dir: PathBuf,
    /// Raw tweet collection file.
    pub tweets_path: PathBuf,
    /// NASA eclipse path table.
    pub totality_path: PathBuf,
    /// Date assumed for time-of-day-only timestamps.
    pub event_date: NaiveDate,
    /// Sliding window parameters.
    pub window: WindowConfig,
    /// Census API settings.
    pub census: CensusConfig,
    /// Reverse geocoder settings.
    pub geocoder: GeocoderConfig,
    /// Topology settings.
    pub topology: TopologyConfig,
}

/// Recursively overlays `overlay` onto `base`.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let overlay_table = match value {
            toml::Value::Table(table) => table,
            other => {
                base.insert(key, other);
                continue;
            }
        };
        if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
            merge(base_table, overlay_table);
            continue;
        }
        base.insert(key, toml::Value::Table(overlay_table));
    }
}

impl PipelineConfig {
    /// Parses the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Toml`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, PipelineError> {
        Ok(toml::de::from_str(DEFAULT_TOML)?)
    }

    /// Parses the embedded defaults overlaid with `overrides` (TOML text).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Toml`] if either document is malformed or
    /// the result is missing a field.
    pub fn from_overrides(overrides: &str) -> Result<Self, PipelineError> {
        let mut table: toml::Table = toml::de::from_str(DEFAULT_TOML)?;
        let overlay: toml::Table = toml::de::from_str(overrides)?;
        merge(&mut table, overlay);
        Ok(toml::Value::Table(table).try_into()?)
    }

    /// Loads the configuration: embedded defaults, then the optional file,
    /// then environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// resulting window is not positive.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_overrides(&std::fs::read_to_string(path)?)?
            }
            None => Self::embedded()?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies path overrides looked up by environment variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(RESOURCES_DIR_ENV).filter(|v| !v.is_empty()) {
            self.resources_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(TWEETS_PATH_ENV).filter(|v| !v.is_empty()) {
            self.tweets_path = PathBuf::from(path);
        }
    }

    /// Checks values that would otherwise fail deep inside a stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for a non-positive window or a zero
    /// geocoder batch size.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.window.increment_minutes <= 0 || self.window.length_minutes <= 0 {
            return Err(PipelineError::Config {
                message: format!(
                    "window increment ({}) and length ({}) must be positive",
                    self.window.increment_minutes, self.window.length_minutes
                ),
            });
        }
        if self.geocoder.batch_size == 0 {
            return Err(PipelineError::Config {
                message: "geocoder batch_size must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Window parameters as a [`WindowSpec`].
    #[must_use]
    pub const fn window_spec(&self) -> WindowSpec {
        let spec =
            WindowSpec::from_minutes(self.window.increment_minutes, self.window.length_minutes);
        match self.window.start {
            Some(start) => spec.starting_at(start),
            None => spec,
        }
    }

    /// Census column names.
    #[must_use]
    pub fn census_columns(&self) -> CensusColumns {
        CensusColumns {
            population: self.census.population_column.clone(),
            name: self.census.name_column.clone(),
        }
    }

    /// Raw reverse-geocoding results cache.
    #[must_use]
    pub fn revgeo_path(&self) -> PathBuf {
        self.resources_dir.join(REVGEO_FILE)
    }

    /// Raw census table cache.
    #[must_use]
    pub fn census_path(&self) -> PathBuf {
        self.resources_dir.join(CENSUS_FILE)
    }

    /// Per-tweet tally distribution cache.
    #[must_use]
    pub fn county_tally_path(&self) -> PathBuf {
        self.resources_dir.join(COUNTY_TALLY_FILE)
    }

    /// Sliding window tally cache for `window`.
    #[must_use]
    pub fn time_tally_path(&self, window: &WindowSpec) -> PathBuf {
        self.resources_dir
            .join("Tally")
            .join(format!("timetallydata{}.json", window.label()))
    }

    /// County color CSV for `window`.
    #[must_use]
    pub fn color_path(&self, window: &WindowSpec) -> PathBuf {
        self.resources_dir
            .join("Color")
            .join(format!("countycolordata{}.csv", window.label()))
    }

    /// Map topology cache.
    #[must_use]
    pub fn topology_path(&self) -> PathBuf {
        self.resources_dir.join(TOPOLOGY_FILE)
    }

    /// Tweet point GeoJSON output.
    #[must_use]
    pub fn tweet_geojson_path(&self) -> PathBuf {
        self.resources_dir.join(TWEET_GEOJSON_FILE)
    }

    /// Totality path GeoJSON output.
    #[must_use]
    pub fn totality_geojson_path(&self) -> PathBuf {
        self.resources_dir.join(TOTALITY_GEOJSON_FILE)
    }

    /// Histogram image directory.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.resources_dir.join("Images")
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensures the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config = PipelineConfig::embedded().unwrap();
        assert_eq!(config.resources_dir, PathBuf::from("Resources"));
        assert_eq!(config.event_date, NaiveDate::from_ymd_opt(2017, 8, 21).unwrap());
        assert_eq!(config.window.increment_minutes, 2);
        assert_eq!(config.window.length_minutes, 60);
        assert_eq!(config.window.start, None);
        assert_eq!(config.geocoder.batch_size, 500);
        assert_eq!(config.census.population_column, "POP");
        assert!(config.topology.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn overrides_replace_only_given_keys() {
        let config = PipelineConfig::from_overrides(
            r#"
            resources_dir = "/tmp/eclipse"

            [window]
            length_minutes = 30
            start = "2017-08-21T16:00:00"

            [topology]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.resources_dir, PathBuf::from("/tmp/eclipse"));
        assert_eq!(config.window.increment_minutes, 2);
        assert_eq!(config.window.length_minutes, 30);
        assert_eq!(
            config.window.start,
            Some(
                NaiveDate::from_ymd_opt(2017, 8, 21)
                    .unwrap()
                    .and_hms_opt(16, 0, 0)
                    .unwrap()
            )
        );
        assert!(!config.topology.enabled);
        assert_eq!(config.topology.url, "https://d3js.org/us-10m.v1.json");
    }

    #[test]
    fn env_lookup_overrides_paths() {
        let mut config = PipelineConfig::embedded().unwrap();
        config.apply_overrides(|key| match key {
            RESOURCES_DIR_ENV => Some("/data/eclipse".to_string()),
            TWEETS_PATH_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.resources_dir, PathBuf::from("/data/eclipse"));
        assert_eq!(
            config.tweets_path,
            PathBuf::from("Twitter Data/eclipsefile1.json")
        );
    }

    #[test]
    fn rejects_non_positive_window() {
        let config = PipelineConfig::from_overrides("[window]\nincrement_minutes = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn paths_carry_window_label() {
        let config = PipelineConfig::embedded().unwrap();
        let window = config.window_spec();
        assert_eq!(
            config.time_tally_path(&window),
            PathBuf::from("Resources/Tally/timetallydata_d2_delta60.json")
        );
        assert_eq!(
            config.color_path(&window),
            PathBuf::from("Resources/Color/countycolordata_d2_delta60.csv")
        );
        assert_eq!(
            config.images_dir(),
            PathBuf::from("Resources/Images")
        );
    }
}
