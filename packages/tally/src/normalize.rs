//! Conversion of window tallies into centred color values.
//!
//! County population is roughly log-normal, so `log(tally / population)`
//! is close to normal when activity is proportional to population. Scaling
//! that to zero mean and unit deviation puts anomalous counties at the
//! extremes of a fixed color range.

use std::collections::BTreeMap;

use eclipse_map_census::PopulationTable;
use eclipse_map_census_models::CountyCode;
use eclipse_map_tally_models::{CountyColorRow, TimeBlockTally};

use crate::stats::mean_std;

/// Color values for every county and window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedValues {
    /// County code -> value per window.
    pub values: BTreeMap<CountyCode, Vec<f64>>,
    /// Smallest scaled value; also assigned to cells without data.
    pub minimum: f64,
    /// Mean of the log ratios before scaling.
    pub mean: f64,
    /// Population standard deviation of the log ratios before scaling.
    pub std_dev: f64,
}

/// `log(tally / population)`, or `None` when either side is not positive.
fn log_ratio(tally: f64, population: Option<u64>) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)]
    let population = population.filter(|p| *p > 0)? as f64;
    (tally > 0.0).then(|| (tally / population).ln())
}

/// Scales per-window tallies into color values.
///
/// Cells with a zero tally or unknown population carry no data and receive
/// the global minimum of the scaled values. With a zero deviation every
/// scaled value is 0; with no data at all every value is 0.
#[must_use]
pub fn normalize(
    tallies: &BTreeMap<CountyCode, Vec<f64>>,
    populations: &PopulationTable,
) -> NormalizedValues {
    let ratios: BTreeMap<&CountyCode, Vec<Option<f64>>> = tallies
        .iter()
        .map(|(code, series)| {
            let population = populations.population(code);
            (
                code,
                series.iter().map(|t| log_ratio(*t, population)).collect(),
            )
        })
        .collect();

    let present: Vec<f64> = ratios.values().flatten().filter_map(|v| *v).collect();

    let Some((mean, std_dev)) = mean_std(&present) else {
        log::warn!("No county has both a tally and a population; all values set to 0");
        return NormalizedValues {
            values: tallies
                .iter()
                .map(|(code, series)| (code.clone(), vec![0.0; series.len()]))
                .collect(),
            ..NormalizedValues::default()
        };
    };

    let scale = |v: f64| {
        if std_dev > 0.0 {
            (v - mean) / std_dev
        } else {
            0.0
        }
    };

    let minimum = present
        .iter()
        .map(|v| scale(*v))
        .fold(f64::INFINITY, f64::min);

    let values = ratios
        .into_iter()
        .map(|(code, series)| {
            let scaled = series
                .into_iter()
                .map(|v| v.map_or(minimum, scale))
                .collect();
            (code.clone(), scaled)
        })
        .collect();

    log::info!(
        "Normalized {} log ratios: mean {mean:.4}, std dev {std_dev:.4}, minimum {minimum:.4}",
        present.len()
    );

    NormalizedValues {
        values,
        minimum,
        mean,
        std_dev,
    }
}

/// Joins tallies, reference data, and color values into output rows.
///
/// `extra_codes` are counties known to the map but absent from the tally;
/// they get all-zero tallies and the minimum color value.
#[must_use]
pub fn color_rows(
    tally: &TimeBlockTally,
    normalized: &NormalizedValues,
    populations: &PopulationTable,
    extra_codes: impl IntoIterator<Item = CountyCode>,
) -> Vec<CountyColorRow> {
    let windows = tally.window_count();

    let mut rows: Vec<CountyColorRow> = tally
        .tallies
        .iter()
        .map(|(code, series)| {
            let county = populations.county(code);
            CountyColorRow {
                code: code.clone(),
                tally: series.clone(),
                population: county.and_then(|c| c.population),
                name: county.map(|c| c.name.clone()),
                value: normalized
                    .values
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| vec![normalized.minimum; windows]),
            }
        })
        .collect();

    let mut added = 0_usize;
    for code in extra_codes {
        if tally.tallies.contains_key(&code) {
            continue;
        }
        rows.push(CountyColorRow {
            code,
            tally: vec![0.0; windows],
            population: None,
            name: None,
            value: vec![normalized.minimum; windows],
        });
        added += 1;
    }
    if added > 0 {
        log::info!("Added {added} map counties missing from the census data");
    }

    rows
}

#[cfg(test)]
mod tests {
    use eclipse_map_census_models::County;

    use super::*;
    use crate::stats::mean_std;

    fn code(s: &str) -> CountyCode {
        CountyCode::parse(s).unwrap()
    }

    fn county(c: &str, population: Option<u64>) -> County {
        County {
            code: code(c),
            name: format!("County {c}"),
            population,
        }
    }

    fn table() -> PopulationTable {
        PopulationTable::from_counties([
            county("41047", Some(1000)),
            county("41053", Some(5000)),
            county("41051", Some(20000)),
            county("16001", None),
        ])
    }

    fn tallies() -> BTreeMap<CountyCode, Vec<f64>> {
        BTreeMap::from([
            (code("41047"), vec![3.0, 0.0, 1.0]),
            (code("41053"), vec![2.0, 4.0, 0.5]),
            (code("41051"), vec![10.0, 1.0, 0.0]),
            (code("16001"), vec![5.0, 5.0, 5.0]),
        ])
    }

    #[test]
    fn scaled_values_are_centred() {
        let result = normalize(&tallies(), &table());

        // Cells with data: 41047 x2, 41053 x3, 41051 x2.
        let with_data: Vec<f64> = [
            (code("41047"), [0_usize, 2].as_slice()),
            (code("41053"), [0, 1, 2].as_slice()),
            (code("41051"), [0, 1].as_slice()),
        ]
        .iter()
        .flat_map(|(c, idx)| idx.iter().map(|i| result.values[c][*i]))
        .collect();

        let (mean, std) = mean_std(&with_data).unwrap();
        assert!(mean.abs() < 1e-9, "mean {mean}");
        assert!((std - 1.0).abs() < 1e-9, "std {std}");
    }

    #[test]
    fn cells_without_data_get_the_minimum() {
        let result = normalize(&tallies(), &table());

        assert!((result.values[&code("41047")][1] - result.minimum).abs() < f64::EPSILON);
        assert!((result.values[&code("41051")][2] - result.minimum).abs() < f64::EPSILON);
        for v in &result.values[&code("16001")] {
            assert!((v - result.minimum).abs() < f64::EPSILON);
        }

        for series in result.values.values() {
            for v in series {
                assert!(*v >= result.minimum);
            }
        }
    }

    #[test]
    fn reports_raw_mean_and_std() {
        let result = normalize(&tallies(), &table());

        let raw = [
            (3.0_f64 / 1000.0).ln(),
            (1.0_f64 / 1000.0).ln(),
            (2.0_f64 / 5000.0).ln(),
            (4.0_f64 / 5000.0).ln(),
            (0.5_f64 / 5000.0).ln(),
            (10.0_f64 / 20000.0).ln(),
            (1.0_f64 / 20000.0).ln(),
        ];
        let (mean, std) = mean_std(&raw).unwrap();
        assert!((result.mean - mean).abs() < 1e-12);
        assert!((result.std_dev - std).abs() < 1e-12);
    }

    #[test]
    fn no_data_yields_all_zero() {
        let tallies = BTreeMap::from([(code("41047"), vec![0.0, 0.0])]);
        let result = normalize(&tallies, &table());
        assert_eq!(result.values[&code("41047")], vec![0.0, 0.0]);
        assert!(result.minimum.abs() < f64::EPSILON);
    }

    #[test]
    fn identical_ratios_scale_to_zero() {
        let tallies = BTreeMap::from([
            (code("41047"), vec![1.0]),
            (code("41053"), vec![5.0]),
        ]);
        let result = normalize(&tallies, &table());
        assert!(result.std_dev.abs() < 1e-12);
        assert!(result.values[&code("41047")][0].abs() < f64::EPSILON);
        assert!(result.values[&code("41053")][0].abs() < f64::EPSILON);
    }

    #[test]
    fn color_rows_fill_missing_map_counties() {
        let tally = TimeBlockTally {
            window_starts: vec![
                chrono::NaiveDate::from_ymd_opt(2017, 8, 21)
                    .unwrap()
                    .and_hms_opt(17, 0, 0)
                    .unwrap();
                3
            ],
            tallies: tallies(),
        };
        let normalized = normalize(&tally.tallies, &table());

        let rows = color_rows(
            &tally,
            &normalized,
            &table(),
            [code("41047"), code("06037")],
        );

        assert_eq!(rows.len(), 5);
        let marion = rows.iter().find(|r| r.code == code("41047")).unwrap();
        assert_eq!(marion.population, Some(1000));
        assert_eq!(marion.name.as_deref(), Some("County 41047"));

        let extra = rows.last().unwrap();
        assert_eq!(extra.code, code("06037"));
        assert_eq!(extra.tally, vec![0.0; 3]);
        assert_eq!(extra.population, None);
        assert_eq!(extra.value, vec![normalized.minimum; 3]);
    }

    #[test]
    fn color_rows_have_one_value_per_window_for_empty_input() {
        use std::collections::BTreeSet;

        use eclipse_map_tally_models::WindowSpec;

        let counties: BTreeSet<CountyCode> = [code("41047")].into_iter().collect();
        let tally =
            crate::blocks::aggregate(&[], &counties, &WindowSpec::from_minutes(2, 60)).unwrap();
        let normalized = normalize(&tally.tallies, &table());

        let rows = color_rows(&tally, &normalized, &table(), [code("06037")]);

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.tally.len(), tally.window_count());
            assert_eq!(row.value.len(), tally.window_count());
        }
        assert_eq!(tally.window_count(), 1);
    }
}
