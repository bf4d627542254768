//! Population-proportional splitting of one event across counties.

use std::collections::BTreeMap;

use eclipse_map_census::PopulationTable;
use eclipse_map_census_models::CountyCode;
use eclipse_map_tally_models::TallyDistribution;

/// Splits one unit of weight across the candidate counties of an event.
///
/// * one code: it gets the whole unit;
/// * several codes: each gets `population / total population`, with
///   duplicates collapsed and codes of unknown population dropped. If none
///   of the codes has a positive population the unit is split evenly;
/// * no codes: [`TallyDistribution::Unresolved`].
#[must_use]
pub fn allocate(codes: Option<&[CountyCode]>, populations: &PopulationTable) -> TallyDistribution {
    let Some(codes) = codes.filter(|c| !c.is_empty()) else {
        return TallyDistribution::Unresolved;
    };

    if let [only] = codes {
        return TallyDistribution::Resolved(BTreeMap::from([(only.clone(), 1.0)]));
    }

    let mut known: BTreeMap<CountyCode, f64> = BTreeMap::new();
    for code in codes {
        if let Some(pop) = populations.population(code).filter(|p| *p > 0) {
            #[allow(clippy::cast_precision_loss)]
            known.insert(code.clone(), pop as f64);
        }
    }

    let total: f64 = known.values().sum();
    if total > 0.0 {
        for weight in known.values_mut() {
            *weight /= total;
        }
        return TallyDistribution::Resolved(known);
    }

    let distinct: BTreeMap<CountyCode, f64> = codes.iter().map(|c| (c.clone(), 0.0)).collect();
    #[allow(clippy::cast_precision_loss)]
    let share = 1.0 / distinct.len() as f64;
    TallyDistribution::Resolved(distinct.into_keys().map(|c| (c, share)).collect())
}
