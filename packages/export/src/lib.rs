#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output files consumed by the web map.
//!
//! * [`tweets`]: point features for every precisely located tweet
//! * [`totality`]: the eclipse path of totality from NASA's path table
//! * [`colors`]: per-county tallies and color values as CSV

pub mod colors;
pub mod totality;
pub mod tweets;

use std::io::{BufWriter, Write as _};
use std::path::Path;

use geojson::FeatureCollection;
use thiserror::Error;

/// Errors from writing or parsing export data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input text could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Writes a feature collection as a single JSON document.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection)?;
    writer.flush()?;
    log::info!(
        "Wrote {} features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}
