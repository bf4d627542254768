//! County resolution for every tweet event.

use eclipse_map_census::PopulationTable;
use eclipse_map_census_models::CountyCode;
use eclipse_map_geocoder::politics;
use eclipse_map_tally_models::{TallyDistribution, TallyEntry};
use eclipse_map_tweets_models::{LocationPrecision, TweetEvent};

use crate::allocate::allocate;

/// Result of resolving every event to a tally distribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// One entry per event, in event order.
    pub entries: Vec<TallyEntry>,
    /// Indices of events no county could be found for.
    pub unresolved: Vec<usize>,
}

/// Candidate county codes for one event.
///
/// State-level tweets could have come from any county of the state. For
/// point tweets the codes come from the reverse-geocoding result at the
/// same index; a missing result yields `None`.
fn candidate_codes(
    event: &TweetEvent,
    politics_results: &[serde_json::Value],
    populations: &PopulationTable,
) -> Option<Vec<CountyCode>> {
    match &event.precision {
        LocationPrecision::State(fips) => Some(populations.counties_in_state(fips)),
        LocationPrecision::Point => politics_results
            .get(event.index)
            .and_then(politics::county_codes),
    }
}

/// Resolves every event to a tally distribution.
///
/// Events with no candidate counties get the unresolved sentinel and are
/// listed in [`Extraction::unresolved`]; the batch always continues.
/// `on_event` is called once per processed event.
#[must_use]
pub fn extract_county_tallies(
    events: &[TweetEvent],
    politics_results: &[serde_json::Value],
    populations: &PopulationTable,
    mut on_event: impl FnMut(),
) -> Extraction {
    let mut extraction = Extraction {
        entries: Vec::with_capacity(events.len()),
        unresolved: Vec::new(),
    };

    for event in events {
        let codes = candidate_codes(event, politics_results, populations);
        let distribution = allocate(codes.as_deref(), populations);

        if distribution.is_unresolved() {
            log::trace!("{} - No codes found for {:?}", event.index, event.place);
            extraction.unresolved.push(event.index);
        }

        extraction.entries.push(TallyEntry {
            datetime: event.datetime,
            distribution,
        });
        on_event();
    }

    if !extraction.unresolved.is_empty() {
        log::warn!(
            "No county could be found for {} of {} tweets",
            extraction.unresolved.len(),
            events.len()
        );
    }

    extraction
}

/// Indices of unresolved entries, for reporting a cached extraction.
#[must_use]
pub fn unresolved_indices(entries: &[TallyEntry]) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e.distribution, TallyDistribution::Unresolved))
        .map(|(i, _)| i)
        .collect()
}
