#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis stages for the eclipse tweet map.
//!
//! Each stage writes its result under the resources directory and is
//! skipped on later runs when that file already exists, unless the
//! pipeline was created with `force`. Remote services (census, reverse
//! geocoder, map topology) are therefore hit once per resources directory.
//!
//! [`Pipeline::analyze`] runs the full chain from the raw tweet file to
//! the county color CSV and tweet GeoJSON.

pub mod config;
pub mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eclipse_map_census::{CensusError, PopulationTable};
use eclipse_map_census_models::CountyCode;
use eclipse_map_export::ExportError;
use eclipse_map_geocoder::{GeocodeError, politics};
use eclipse_map_histogram::HistogramError;
use eclipse_map_tally::TallyError;
use eclipse_map_tally_models::{TallyEntry, TimeBlockTally};
use eclipse_map_tweets::TweetError;
use eclipse_map_tweets_models::TweetEvent;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use config::PipelineConfig;
use config::ensure_parent;
use progress::ProgressCallback;

/// Errors from any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration is invalid.
    #[error("Config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Census data could not be fetched or read.
    #[error(transparent)]
    Census(#[from] CensusError),

    /// The tweet file could not be read.
    #[error(transparent)]
    Tweets(#[from] TweetError),

    /// Reverse geocoding failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// Tally aggregation failed.
    #[error(transparent)]
    Tally(#[from] TallyError),

    /// Writing an output file failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Rendering a histogram failed.
    #[error(transparent)]
    Histogram(#[from] HistogramError),
}

/// What a full [`Pipeline::analyze`] run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSummary {
    /// Located tweet events.
    pub events: usize,
    /// Events no county could be found for.
    pub unresolved: usize,
    /// Number of sliding windows.
    pub windows: usize,
    /// County color CSV.
    pub color_path: PathBuf,
    /// Tweet point GeoJSON.
    pub tweet_geojson_path: PathBuf,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    std::fs::write(path, serde_json::to_string(value)?)?;
    Ok(())
}

fn progress_total(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Runs analysis stages against one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    force: bool,
    client: reqwest::Client,
}

impl Pipeline {
    /// Creates a pipeline. With `force`, cached stage results are ignored
    /// and rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: PipelineConfig, force: bool) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("eclipse-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            config,
            force,
            client,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn is_cached(&self, path: &Path) -> bool {
        if !self.force && path.exists() {
            log::info!("No action: using cached {}", path.display());
            true
        } else {
            false
        }
    }

    /// Reads the tweet file and builds located events.
    ///
    /// # Errors
    ///
    /// Returns an error if the tweet file cannot be read.
    pub fn load_events(&self) -> Result<Vec<TweetEvent>, PipelineError> {
        let raw = eclipse_map_tweets::read_tweet_file(&self.config.tweets_path)?;
        Ok(eclipse_map_tweets::build_events(
            &raw,
            self.config.event_date,
        ))
    }

    /// Reverse-geocodes every event's coordinate, one result per event.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or written or a request
    /// fails.
    pub async fn reverse_geocode(
        &self,
        events: &[TweetEvent],
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Vec<serde_json::Value>, PipelineError> {
        let path = self.config.revgeo_path();
        if self.is_cached(&path) {
            let results: Vec<serde_json::Value> = read_json(&path)?;
            if results.len() != events.len() {
                log::warn!(
                    "{} holds {} results for {} events; rerun with --force if the tweet file changed",
                    path.display(),
                    results.len(),
                    events.len()
                );
            }
            return Ok(results);
        }

        let coords: Vec<[f64; 2]> = events.iter().map(|e| [e.latitude, e.longitude]).collect();

        progress.set_message("Reverse geocoding".to_string());
        progress.set_total(progress_total(coords.len()));

        let results = politics::reverse_geocode_all(
            &self.client,
            &self.config.geocoder.url,
            &coords,
            self.config.geocoder.batch_size,
            |done, _| progress.set_position(progress_total(done)),
        )
        .await?;

        progress.finish(format!("Reverse geocoded {} coordinates", results.len()));

        write_json(&path, &results)?;
        log::info!("Reverse geocoding data saved to {}", path.display());
        Ok(results)
    }

    /// Loads county populations and names.
    ///
    /// # Errors
    ///
    /// Returns an error if the census request fails or the table is
    /// malformed.
    pub async fn census(&self) -> Result<PopulationTable, PipelineError> {
        let path = self.config.census_path();
        let raw: serde_json::Value = if self.is_cached(&path) {
            read_json(&path)?
        } else {
            let raw =
                eclipse_map_census::api::fetch_population(&self.client, &self.config.census.url)
                    .await?;
            write_json(&path, &raw)?;
            log::info!("Census data saved to {}", path.display());
            raw
        };

        let table = PopulationTable::from_json(&raw, &self.config.census_columns())?;
        log::info!("Loaded population data for {} counties", table.len());
        Ok(table)
    }

    /// Resolves every event to a county tally distribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or written.
    pub fn county_tallies(
        &self,
        events: &[TweetEvent],
        politics_results: &[serde_json::Value],
        populations: &PopulationTable,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Vec<TallyEntry>, PipelineError> {
        let path = self.config.county_tally_path();
        if self.is_cached(&path) {
            let entries: Vec<TallyEntry> = read_json(&path)?;
            let unresolved = eclipse_map_tally::extract::unresolved_indices(&entries);
            if !unresolved.is_empty() {
                log::warn!(
                    "No county could be found for {} of {} cached tweets",
                    unresolved.len(),
                    entries.len()
                );
            }
            return Ok(entries);
        }

        progress.set_message("Extracting county codes".to_string());
        progress.set_total(progress_total(events.len()));

        let extraction = eclipse_map_tally::extract::extract_county_tallies(
            events,
            politics_results,
            populations,
            || progress.inc(1),
        );

        progress.finish(format!(
            "County tallies for {} tweets ({} unresolved)",
            extraction.entries.len(),
            extraction.unresolved.len()
        ));

        write_json(&path, &extraction.entries)?;
        log::info!("County tally data saved to {}", path.display());
        Ok(extraction.entries)
    }

    /// Sums tallies over the configured sliding windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is invalid or the cache cannot be
    /// read or written.
    pub fn time_tallies(
        &self,
        entries: &[TallyEntry],
        populations: &PopulationTable,
    ) -> Result<TimeBlockTally, PipelineError> {
        let window = self.config.window_spec();
        let path = self.config.time_tally_path(&window);
        if self.is_cached(&path) {
            return read_json(&path);
        }

        let tally = eclipse_map_tally::blocks::aggregate(entries, &populations.codes(), &window)?;

        write_json(&path, &tally)?;
        log::info!(
            "Tallied {} windows into {}",
            tally.window_count(),
            path.display()
        );
        Ok(tally)
    }

    /// County codes known to the map topology, fetched once and cached.
    async fn topology_codes(&self) -> Result<Vec<CountyCode>, PipelineError> {
        if !self.config.topology.enabled {
            return Ok(Vec::new());
        }

        let path = self.config.topology_path();
        let topology: serde_json::Value = if self.is_cached(&path) {
            read_json(&path)?
        } else {
            let topology = eclipse_map_census::topology::fetch_topology(
                &self.client,
                &self.config.topology.url,
            )
            .await?;
            write_json(&path, &topology)?;
            topology
        };

        Ok(eclipse_map_census::topology::county_ids(&topology)?
            .into_iter()
            .collect())
    }

    /// Converts window tallies into color values and writes the county
    /// color CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be loaded or the CSV cannot
    /// be written.
    pub async fn color_values(
        &self,
        tally: &TimeBlockTally,
        populations: &PopulationTable,
    ) -> Result<PathBuf, PipelineError> {
        let path = self.config.color_path(&self.config.window_spec());
        if self.is_cached(&path) {
            return Ok(path);
        }

        log::info!("Converting tally counts to color values...");
        let normalized = eclipse_map_tally::normalize::normalize(&tally.tallies, populations);
        let extra = self.topology_codes().await?;
        let rows =
            eclipse_map_tally::normalize::color_rows(tally, &normalized, populations, extra);

        ensure_parent(&path)?;
        eclipse_map_export::colors::write_color_csv(&path, &rows)?;
        Ok(path)
    }

    /// Writes the tweet point GeoJSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn tweet_geojson(&self, events: &[TweetEvent]) -> Result<PathBuf, PipelineError> {
        let path = self.config.tweet_geojson_path();
        if self.is_cached(&path) {
            return Ok(path);
        }

        let collection = eclipse_map_export::tweets::tweet_feature_collection(events);
        ensure_parent(&path)?;
        eclipse_map_export::write_geojson(&path, &collection)?;
        Ok(path)
    }

    /// Converts the NASA path table into the totality GeoJSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read or parsed or the output
    /// cannot be written.
    pub fn totality_geojson(&self) -> Result<PathBuf, PipelineError> {
        let path = self.config.totality_geojson_path();
        if self.is_cached(&path) {
            return Ok(path);
        }

        log::info!("Creating GeoJSON from NASA eclipse path data...");
        let text = std::fs::read_to_string(&self.config.totality_path)?;
        let rows = eclipse_map_export::totality::parse_path(&text)?;
        let collection = eclipse_map_export::totality::path_feature_collection(&rows);

        ensure_parent(&path)?;
        eclipse_map_export::write_geojson(&path, &collection)?;
        Ok(path)
    }

    /// Renders the population histograms.
    ///
    /// # Errors
    ///
    /// Returns an error if an image cannot be written.
    pub fn histograms(&self, populations: &PopulationTable) -> Result<Vec<PathBuf>, PipelineError> {
        let dir = self.config.images_dir();
        let expected = [
            eclipse_map_histogram::plots::POPULATION_FILE,
            eclipse_map_histogram::plots::LOG_POPULATION_FILE,
            eclipse_map_histogram::plots::SCALED_FILE,
        ]
        .map(|name| dir.join(name));

        if !self.force && expected.iter().all(|p| p.exists()) {
            log::info!("No action: histograms already in {}", dir.display());
            return Ok(expected.to_vec());
        }

        let values: Vec<u64> = populations.iter().filter_map(|c| c.population).collect();
        Ok(eclipse_map_histogram::plots::population_histograms(
            &values, &dir,
        )?)
    }

    /// Runs every stage from the tweet file to the color CSV and tweet
    /// GeoJSON. `make_progress` creates a progress reporter per stage.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    #[allow(clippy::future_not_send)]
    pub async fn analyze(
        &self,
        make_progress: impl Fn(&str) -> Arc<dyn ProgressCallback>,
    ) -> Result<AnalysisSummary, PipelineError> {
        let events = self.load_events()?;

        let politics_results = self
            .reverse_geocode(&events, &make_progress("Reverse geocoding"))
            .await?;
        let populations = self.census().await?;
        let entries = self.county_tallies(
            &events,
            &politics_results,
            &populations,
            &make_progress("County tallies"),
        )?;
        let tally = self.time_tallies(&entries, &populations)?;
        let color_path = self.color_values(&tally, &populations).await?;
        let tweet_geojson_path = self.tweet_geojson(&events)?;

        let summary = AnalysisSummary {
            events: events.len(),
            unresolved: eclipse_map_tally::extract::unresolved_indices(&entries).len(),
            windows: tally.window_count(),
            color_path,
            tweet_geojson_path,
        };
        log::info!("Analysis complete.");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;

    const TWEETS: &str = r#"{"USER": "a", "TEXT": "dark!", "CREATED AT": "Mon Aug 21 17:00:00 +0000 2017", "PLACE": ["city", "Salem, OR", [[[-123.1, 44.8], [-123.1, 45.0], [-122.9, 45.0], [-122.9, 44.8]]]]}
{"USER": "b", "TEXT": "so dark", "CREATED AT": "Mon Aug 21 17:01:00 +0000 2017", "PLACE": ["admin", "Oregon, USA", [[[-124.5, 42.0], [-124.5, 46.3], [-116.5, 46.3], [-116.5, 42.0]]]]}
{"USER": "c", "TEXT": "clouds", "CREATED AT": "Mon Aug 21 17:03:00 +0000 2017", "PLACE": ["city", "Boise, ID", [[[-116.3, 43.5], [-116.3, 43.7], [-116.1, 43.7], [-116.1, 43.5]]]]}
{"USER": "d", "TEXT": "at sea", "CREATED AT": "Mon Aug 21 17:04:00 +0000 2017", "PLACE": ["poi", "Pacific", [[[-130.0, 40.0], [-130.0, 40.1], [-129.9, 40.1], [-129.9, 40.0]]]]}
{"USER": "e", "TEXT": "usa", "CREATED AT": "Mon Aug 21 17:05:00 +0000 2017", "PLACE": ["country", "United States", [[[-125.0, 24.0], [-125.0, 49.0], [-66.0, 49.0], [-66.0, 24.0]]]]}"#;

    fn census_table() -> serde_json::Value {
        serde_json::json!([
            ["POP", "GEONAME", "DATE", "state", "county"],
            ["336316", "Marion County, Oregon", "9", "41", "047"],
            ["83805", "Polk County, Oregon", "9", "41", "053"],
            ["446052", "Ada County, Idaho", "9", "16", "001"]
        ])
    }

    fn politics() -> serde_json::Value {
        serde_json::json!([
            { "politics": [{ "type": "admin6", "code": "41_047" }] },
            { "politics": [{ "type": "admin4", "code": "41" }] },
            { "politics": [{ "type": "admin6", "code": "16_001" }] },
            { "politics": null }
        ])
    }

    /// Resources directory with every remote result already cached.
    fn seeded_config(name: &str) -> PipelineConfig {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let tweets_path = dir.join("tweets.json");
        std::fs::write(&tweets_path, TWEETS).unwrap();
        std::fs::write(dir.join(config::REVGEO_FILE), politics().to_string()).unwrap();
        std::fs::write(dir.join(config::CENSUS_FILE), census_table().to_string()).unwrap();

        let mut config = PipelineConfig::embedded().unwrap();
        config.resources_dir = dir;
        config.tweets_path = tweets_path;
        config.topology.enabled = false;
        config.window.increment_minutes = 2;
        config.window.length_minutes = 2;
        config
    }

    #[tokio::test]
    async fn analyze_runs_offline_from_caches() {
        let config = seeded_config("eclipse_map_test_analyze");
        let dir = config.resources_dir.clone();
        let pipeline = Pipeline::new(config, false).unwrap();

        let summary = pipeline.analyze(|_| null_progress()).await.unwrap();

        // The country-level tweet is dropped; the one at sea is unresolved.
        assert_eq!(summary.events, 4);
        assert_eq!(summary.unresolved, 1);
        // Windows start at 17:00 and 17:02 and 17:04.
        assert_eq!(summary.windows, 3);
        assert!(summary.color_path.ends_with("Color/countycolordata_d2_delta2.csv"));
        assert!(summary.color_path.exists());
        assert!(summary.tweet_geojson_path.exists());
        assert!(dir.join(config::COUNTY_TALLY_FILE).exists());
        assert!(dir.join("Tally/timetallydata_d2_delta2.json").exists());

        let mut reader = csv::Reader::from_path(&summary.color_path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        let marion = rows.iter().find(|r| &r[0] == "41047").unwrap();
        let tally: Vec<f64> = serde_json::from_str(&marion[1]).unwrap();
        // Full tweet at 17:00 plus Marion's population share of the state
        // tweet at 17:01.
        let share = 336_316.0 / (336_316.0 + 83_805.0);
        assert!((tally[0] - (1.0 + share)).abs() < 1e-9);
        assert!(tally[1].abs() < f64::EPSILON);

        let geojson: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.tweet_geojson_path).unwrap())
                .unwrap();
        // Only point-precision tweets are mapped.
        assert_eq!(geojson["features"].as_array().unwrap().len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn cached_stage_results_are_reused() {
        let config = seeded_config("eclipse_map_test_cache_reuse");
        let dir = config.resources_dir.clone();
        let pipeline = Pipeline::new(config, false).unwrap();

        let populations = pipeline.census().await.unwrap();
        let events = pipeline.load_events().unwrap();
        let politics: Vec<serde_json::Value> =
            serde_json::from_value(politics()).unwrap();

        let first = pipeline
            .county_tallies(&events, &politics, &populations, &null_progress())
            .unwrap();
        // A second call with no geocoding results reads the cache instead.
        let second = pipeline
            .county_tallies(&events, &[], &populations, &null_progress())
            .unwrap();
        assert_eq!(first, second);

        let forced = Pipeline::new(pipeline.config().clone(), true).unwrap();
        let rebuilt = forced
            .county_tallies(&events, &[], &populations, &null_progress())
            .unwrap();
        assert_eq!(
            eclipse_map_tally::extract::unresolved_indices(&rebuilt),
            vec![0, 2, 3]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn time_tallies_round_trip_through_cache() {
        let config = seeded_config("eclipse_map_test_time_tally_cache");
        let dir = config.resources_dir.clone();
        let pipeline = Pipeline::new(config, false).unwrap();

        let populations = pipeline.census().await.unwrap();
        let events = pipeline.load_events().unwrap();
        let politics: Vec<serde_json::Value> =
            serde_json::from_value(politics()).unwrap();
        let entries = pipeline
            .county_tallies(&events, &politics, &populations, &null_progress())
            .unwrap();

        let built = pipeline.time_tallies(&entries, &populations).unwrap();
        let cached = pipeline.time_tallies(&[], &populations).unwrap();
        assert_eq!(built, cached);
        assert_eq!(cached.tallies.len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn totality_stage_writes_geojson() {
        let mut config = PipelineConfig::embedded().unwrap();
        let dir = std::env::temp_dir().join("eclipse_map_test_totality_stage");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let table = dir.join("path.txt");
        std::fs::write(
            &table,
            "  16:50   45 08.4N 141 06.3W  44 08.5N 141 15.7W  44 38.4N 141 11.0W  1.029\n  16:52   45 09.9N 134 04.3W  44 09.9N 134 12.8W  44 39.9N 134 08.5W  1.029\n",
        )
        .unwrap();
        config.resources_dir = dir.clone();
        config.totality_path = table;

        let pipeline = Pipeline::new(config, false).unwrap();
        let path = pipeline.totality_geojson().unwrap();
        assert!(path.ends_with(config::TOTALITY_GEOJSON_FILE));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["features"][1]["properties"]["Name"], "Region of totality");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn histograms_are_written_under_images() {
        let config = seeded_config("eclipse_map_test_histogram_stage");
        let dir = config.resources_dir.clone();
        let pipeline = Pipeline::new(config, false).unwrap();

        let populations = pipeline.census().await.unwrap();
        let paths = pipeline.histograms(&populations).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.starts_with(dir.join("Images"))));
        assert!(paths.iter().all(|p| p.exists()));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
