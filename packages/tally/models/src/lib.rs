#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County tally types.
//!
//! Every tweet carries one unit of weight. A [`TallyDistribution`] says
//! how that unit is split across counties; a [`TimeBlockTally`] holds the
//! per-county sums over a series of sliding time windows; a
//! [`CountyColorRow`] is the final per-county output with normalized
//! color values.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use eclipse_map_census_models::{CountyCode, InvalidCountyCode};
use serde::{Deserialize, Serialize};

/// Key used for the unresolved sentinel when a distribution is serialized.
pub const UNRESOLVED_KEY: &str = "null";

/// How one event's unit weight is divided among counties.
///
/// Serialized as a JSON object of `code -> weight`. An unresolved event is
/// written as `{"null": 0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub enum TallyDistribution {
    /// Weights in `[0, 1]` summing to 1.
    Resolved(BTreeMap<CountyCode, f64>),
    /// No county could be determined for the event.
    Unresolved,
}

impl TallyDistribution {
    /// Iterates over `(code, weight)` pairs; empty when unresolved.
    pub fn weights(&self) -> impl Iterator<Item = (&CountyCode, f64)> {
        let map = match self {
            Self::Resolved(map) => Some(map),
            Self::Unresolved => None,
        };
        map.into_iter().flatten().map(|(code, weight)| (code, *weight))
    }

    /// Whether the event could not be attributed.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    /// Total weight (1 when resolved, 0 when unresolved).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights().map(|(_, w)| w).sum()
    }
}

impl TryFrom<BTreeMap<String, f64>> for TallyDistribution {
    type Error = InvalidCountyCode;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        if map.is_empty() || map.contains_key(UNRESOLVED_KEY) {
            return Ok(Self::Unresolved);
        }
        map.into_iter()
            .map(|(code, weight)| Ok((CountyCode::parse(&code)?, weight)))
            .collect::<Result<_, _>>()
            .map(Self::Resolved)
    }
}

impl From<TallyDistribution> for BTreeMap<String, f64> {
    fn from(dist: TallyDistribution) -> Self {
        match dist {
            TallyDistribution::Resolved(map) => {
                map.into_iter().map(|(code, w)| (code.into(), w)).collect()
            }
            TallyDistribution::Unresolved => Self::from([(UNRESOLVED_KEY.to_string(), 0.0)]),
        }
    }
}

/// One event's timestamp and tally distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntry {
    /// When the event happened.
    pub datetime: NaiveDateTime,
    /// How its weight is split.
    pub distribution: TallyDistribution,
}

/// Sliding window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    /// Shift between consecutive window starts.
    pub increment: TimeDelta,
    /// Window length (windows overlap when `increment < length`).
    pub length: TimeDelta,
    /// Start of the first window; defaults to the first event.
    pub start: Option<NaiveDateTime>,
}

impl WindowSpec {
    /// Builds window parameters from whole minutes.
    #[must_use]
    pub const fn from_minutes(increment: i64, length: i64) -> Self {
        Self {
            increment: TimeDelta::minutes(increment),
            length: TimeDelta::minutes(length),
            start: None,
        }
    }

    /// Sets an explicit first window start.
    #[must_use]
    pub const fn starting_at(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// File-name suffix identifying these parameters, e.g. `_d2_delta60`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "_d{}_delta{}",
            self.increment.num_minutes(),
            self.length.num_minutes()
        )
    }
}

/// Per-county sums over a series of sliding windows.
///
/// Every county sequence has one value per entry of `window_starts`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockTally {
    /// Start of each window, in order.
    pub window_starts: Vec<NaiveDateTime>,
    /// County code -> summed weight per window.
    pub tallies: BTreeMap<CountyCode, Vec<f64>>,
}

impl TimeBlockTally {
    /// Number of windows.
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.window_starts.len()
    }
}

/// Final per-county output row.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyColorRow {
    /// County code.
    pub code: CountyCode,
    /// Summed weight per window.
    pub tally: Vec<f64>,
    /// Population estimate, if known.
    pub population: Option<u64>,
    /// County display name, if known.
    pub name: Option<String>,
    /// Normalized color value per window.
    pub value: Vec<f64>,
}
