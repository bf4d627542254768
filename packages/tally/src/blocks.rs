//! Sliding time-block aggregation.
//!
//! Produces a "movie" of tweet activity: each frame sums the tally
//! weights of all tweets inside one time window, and consecutive windows
//! are shifted by a fixed increment.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDateTime, TimeDelta};
use eclipse_map_census_models::CountyCode;
use eclipse_map_tally_models::{TallyEntry, TimeBlockTally, WindowSpec};

use crate::TallyError;

/// Sums entry weights per county over sliding windows.
///
/// Windows are half-open, `[start, start + length)`. The first window
/// starts at `window.start` or, if unset, at the earliest entry. Windows
/// keep being produced while their start is not past the latest entry, and
/// there is always at least one window.
///
/// Every code in `counties`, plus every code appearing in an entry, gets a
/// sequence with one value per window (0 where nothing was tallied).
/// Unresolved entries contribute nothing.
///
/// # Errors
///
/// Returns [`TallyError::InvalidWindow`] if the increment or length is not
/// positive.
pub fn aggregate(
    entries: &[TallyEntry],
    counties: &BTreeSet<CountyCode>,
    window: &WindowSpec,
) -> Result<TimeBlockTally, TallyError> {
    if window.increment <= TimeDelta::zero() || window.length <= TimeDelta::zero() {
        return Err(TallyError::InvalidWindow {
            increment_minutes: window.increment.num_minutes(),
            length_minutes: window.length.num_minutes(),
        });
    }

    let mut sorted: Vec<&TallyEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.datetime);

    let mut codes = counties.clone();
    for entry in &sorted {
        codes.extend(entry.distribution.weights().map(|(code, _)| code.clone()));
    }

    let mut result = TimeBlockTally {
        window_starts: Vec::new(),
        tallies: codes.into_iter().map(|code| (code, Vec::new())).collect(),
    };

    let first = sorted.first().map(|e| e.datetime);
    let last = sorted.last().map(|e| e.datetime);

    // With no events and no explicit start, the single empty window is
    // anchored at the Unix epoch.
    let mut start = window.start.or(first).unwrap_or_default();

    loop {
        let end = start + window.length;
        let block = block_tally(&sorted, start, end);
        push_window(&mut result, start, &block);

        start += window.increment;
        if last.is_none_or(|last| start > last) {
            break;
        }
    }

    log::debug!(
        "Aggregated {} entries into {} windows of {} min every {} min",
        entries.len(),
        result.window_count(),
        window.length.num_minutes(),
        window.increment.num_minutes()
    );

    Ok(result)
}

/// Sums weights per county for entries in `[start, end)`.
///
/// `sorted` must be ordered by datetime.
fn block_tally(
    sorted: &[&TallyEntry],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> BTreeMap<CountyCode, f64> {
    let from = sorted.partition_point(|e| e.datetime < start);
    let to = sorted.partition_point(|e| e.datetime < end);

    let mut block: BTreeMap<CountyCode, f64> = BTreeMap::new();
    for entry in sorted.get(from..to).unwrap_or_default() {
        for (code, weight) in entry.distribution.weights() {
            *block.entry(code.clone()).or_default() += weight;
        }
    }
    block
}

/// Appends one window's sums to every county sequence.
fn push_window(result: &mut TimeBlockTally, start: NaiveDateTime, block: &BTreeMap<CountyCode, f64>) {
    result.window_starts.push(start);
    for (code, series) in &mut result.tallies {
        series.push(block.get(code).copied().unwrap_or(0.0));
    }
}
