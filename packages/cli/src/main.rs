#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the eclipse tweet map.
//!
//! Each subcommand runs one pipeline stage together with the stages it
//! depends on; cached stage results are reused unless `--force` is given.
//! Without a subcommand an interactive menu asks which stage to run.
//!
//! Uses `indicatif-log-bridge` (via [`eclipse_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod interactive;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use eclipse_map_cli_utils::{IndicatifProgress, MultiProgress};
use eclipse_map_pipeline::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "eclipse_map",
    about = "Maps geotagged 2017 eclipse tweets onto US counties"
)]
struct Cli {
    /// TOML file overriding the default configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rebuild stage results even if cached files exist
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Run every stage from the tweet file to the color CSV and tweet GeoJSON
    Analyze,
    /// Download (or load cached) county population data
    Census,
    /// Reverse-geocode tweet coordinates
    Geocode,
    /// Resolve tweets to counties and sum them over sliding windows
    Tally,
    /// Compute county color values and write the color CSV
    Values,
    /// Write the tweet point GeoJSON
    Geojson,
    /// Convert the NASA eclipse path table into GeoJSON
    Totality,
    /// Render county population histograms
    Histograms,
}

impl Commands {
    const ALL: &[Self] = &[
        Self::Analyze,
        Self::Census,
        Self::Geocode,
        Self::Tally,
        Self::Values,
        Self::Geojson,
        Self::Totality,
        Self::Histograms,
    ];

    #[must_use]
    const fn label(self) -> &'static str {
        match self {
            Self::Analyze => "Run full analysis",
            Self::Census => "Fetch census population data",
            Self::Geocode => "Reverse-geocode tweets",
            Self::Tally => "Tally tweets per county and time window",
            Self::Values => "Compute county color values",
            Self::Geojson => "Export tweet GeoJSON",
            Self::Totality => "Export path of totality GeoJSON",
            Self::Histograms => "Render population histograms",
        }
    }
}

/// Runs one stage and everything it depends on.
async fn run_command(
    pipeline: &Pipeline,
    command: Commands,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    match command {
        Commands::Analyze => {
            let summary = pipeline
                .analyze(|msg| IndicatifProgress::tweets_bar(multi, msg))
                .await?;
            log::info!(
                "{} tweets ({} unresolved) over {} windows",
                summary.events,
                summary.unresolved,
                summary.windows
            );
            log::info!("County colors: {}", summary.color_path.display());
            log::info!("Tweet GeoJSON: {}", summary.tweet_geojson_path.display());
        }
        Commands::Census => {
            let populations = pipeline.census().await?;
            log::info!("{} counties with population data", populations.len());
        }
        Commands::Geocode => {
            let events = pipeline.load_events()?;
            let progress = IndicatifProgress::tweets_bar(multi, "Reverse geocoding");
            let results = pipeline.reverse_geocode(&events, &progress).await?;
            log::info!("{} reverse-geocoding results", results.len());
        }
        Commands::Tally | Commands::Values => {
            let events = pipeline.load_events()?;
            let progress = IndicatifProgress::tweets_bar(multi, "Reverse geocoding");
            let politics = pipeline.reverse_geocode(&events, &progress).await?;
            let populations = pipeline.census().await?;
            let progress = IndicatifProgress::tweets_bar(multi, "County tallies");
            let entries = pipeline.county_tallies(&events, &politics, &populations, &progress)?;
            let tally = pipeline.time_tallies(&entries, &populations)?;
            log::info!(
                "{} counties over {} windows",
                tally.tallies.len(),
                tally.window_count()
            );

            if command == Commands::Values {
                let path = pipeline.color_values(&tally, &populations).await?;
                log::info!("County colors: {}", path.display());
            }
        }
        Commands::Geojson => {
            let events = pipeline.load_events()?;
            let path = pipeline.tweet_geojson(&events)?;
            log::info!("Tweet GeoJSON: {}", path.display());
        }
        Commands::Totality => {
            let path = pipeline.totality_geojson()?;
            log::info!("Totality GeoJSON: {}", path.display());
        }
        Commands::Histograms => {
            let populations = pipeline.census().await?;
            for path in pipeline.histograms(&populations)? {
                log::info!("Histogram: {}", path.display());
            }
        }
    }

    log::info!("{} finished in {:.1?}", command.label(), start.elapsed());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = eclipse_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(config, cli.force, &multi).await;
    };

    let pipeline = Pipeline::new(config, cli.force)?;
    run_command(&pipeline, command, &multi).await
}
