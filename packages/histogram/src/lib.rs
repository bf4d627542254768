#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Histograms of county population.
//!
//! County population is roughly log-normal, which is what makes the
//! `log(tally / population)` color scale work. These plots show the raw
//! distribution, its log, and the log after centring and scaling.

pub mod plots;
pub mod render;

use thiserror::Error;

/// Errors from histogram computation or rendering.
#[derive(Debug, Error)]
pub enum HistogramError {
    /// Encoding or saving the image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Creating the output directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Empty or inverted range, or zero bins.
    #[error("Invalid histogram: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

/// Equal-width bin counts over a fixed range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Lower edge of the first bin.
    pub min: f64,
    /// Upper edge of the last bin.
    pub max: f64,
    /// Count per bin.
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bins `values` into `bins` equal-width bins over `[min, max]`.
    ///
    /// Values outside the range (and NaN) are ignored. Bins are half-open
    /// except the last, which includes `max`.
    ///
    /// # Errors
    ///
    /// Returns [`HistogramError::Invalid`] if `bins` is zero or the range
    /// is empty.
    pub fn compute(
        values: &[f64],
        (min, max): (f64, f64),
        bins: usize,
    ) -> Result<Self, HistogramError> {
        if bins == 0 {
            return Err(HistogramError::Invalid {
                message: "bin count must be positive".to_string(),
            });
        }
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(HistogramError::Invalid {
                message: format!("range [{min}, {max}] is empty"),
            });
        }

        let mut counts = vec![0_u64; bins];
        #[allow(clippy::cast_precision_loss)]
        let width = (max - min) / bins as f64;

        for v in values.iter().copied().filter(|v| (min..=max).contains(v)) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let bin = (((v - min) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Self { min, max, counts })
    }

    /// Width of one bin.
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let bins = self.counts.len() as f64;
        (self.max - self.min) / bins
    }

    /// Largest bin count.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of values that fell inside the range.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
