//! The three standard population plots.

use std::path::{Path, PathBuf};

use eclipse_map_tally::stats::mean_std;

use crate::render::{StatOverlay, render_png};
use crate::{Histogram, HistogramError};

/// Raw population histogram file name.
pub const POPULATION_FILE: &str = "HistogramPopulation.png";
/// `log(population)` histogram file name.
pub const LOG_POPULATION_FILE: &str = "HistogramLogPop.png";
/// Centred and scaled `log(population)` histogram file name.
pub const SCALED_FILE: &str = "HistogramScaled.png";

/// Range and bin count of one plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotSpec {
    /// Plotted value range.
    pub range: (f64, f64),
    /// Number of bins.
    pub bins: usize,
}

/// Raw population, 0 to 250 000.
pub const POPULATION_PLOT: PlotSpec = PlotSpec {
    range: (0.0, 250_000.0),
    bins: 2000,
};
/// `log(population)`, 6 to 15.
pub const LOG_POPULATION_PLOT: PlotSpec = PlotSpec {
    range: (6.0, 15.0),
    bins: 80,
};
/// Scaled `log(population)`, three deviations either side of the mean.
pub const SCALED_PLOT: PlotSpec = PlotSpec {
    range: (-3.0, 3.0),
    bins: 80,
};

/// Renders the raw, log, and scaled population histograms into
/// `images_dir` and returns the written paths.
///
/// Counties with no positive population are left out of the log plots.
///
/// # Errors
///
/// Returns an error if an image cannot be written.
pub fn population_histograms(
    populations: &[u64],
    images_dir: &Path,
) -> Result<Vec<PathBuf>, HistogramError> {
    #[allow(clippy::cast_precision_loss)]
    let raw: Vec<f64> = populations.iter().map(|p| *p as f64).collect();
    let log_pop: Vec<f64> = raw.iter().filter(|p| **p > 0.0).map(|p| p.ln()).collect();

    let population_path = images_dir.join(POPULATION_FILE);
    let hist = Histogram::compute(&raw, POPULATION_PLOT.range, POPULATION_PLOT.bins)?;
    render_png(&population_path, &hist, None)?;

    let Some((mean, std_dev)) = mean_std(&log_pop) else {
        log::warn!("No positive populations; skipping log histograms");
        return Ok(vec![population_path]);
    };
    log::info!("log(population): mean {mean:.2}, std dev {std_dev:.2}");

    let log_path = images_dir.join(LOG_POPULATION_FILE);
    let hist = Histogram::compute(
        &log_pop,
        LOG_POPULATION_PLOT.range,
        LOG_POPULATION_PLOT.bins,
    )?;
    render_png(&log_path, &hist, Some(StatOverlay { mean, std_dev }))?;

    let scaled: Vec<f64> = if std_dev > 0.0 {
        log_pop.iter().map(|v| (v - mean) / std_dev).collect()
    } else {
        vec![0.0; log_pop.len()]
    };
    let scaled_overlay = mean_std(&scaled).map(|(mean, std_dev)| StatOverlay { mean, std_dev });

    let scaled_path = images_dir.join(SCALED_FILE);
    let hist = Histogram::compute(&scaled, SCALED_PLOT.range, SCALED_PLOT.bins)?;
    render_png(&scaled_path, &hist, scaled_overlay)?;

    Ok(vec![population_path, log_path, scaled_path])
}
