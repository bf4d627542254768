#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County tallies for geolocated tweets.
//!
//! Each tweet is resolved to one or more candidate counties and its unit
//! weight is split across them by population ([`allocate`]). The per-tweet
//! distributions are summed over sliding time windows ([`blocks`]) and the
//! resulting sums are turned into log-scaled, centred color values
//! ([`normalize`]).

pub mod allocate;
pub mod blocks;
pub mod extract;
pub mod normalize;
pub mod stats;

use thiserror::Error;

/// Errors from tally operations.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Window increment or length is zero or negative.
    #[error(
        "Invalid window: increment {increment_minutes} min, length {length_minutes} min (both must be positive)"
    )]
    InvalidWindow {
        /// Requested increment in minutes.
        increment_minutes: i64,
        /// Requested length in minutes.
        length_minutes: i64,
    },
}
