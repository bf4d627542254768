#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County population reference data.
//!
//! Population estimates and county names come from the Census Bureau
//! population-statistics API as a JSON table (first row is the header).
//! The raw table is what gets cached on disk; [`PopulationTable`] is the
//! in-memory lookup built from it.

pub mod api;
pub mod topology;

use std::collections::{BTreeMap, BTreeSet};

use eclipse_map_census_models::{County, CountyCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while fetching or reading census data.
#[derive(Debug, Error)]
pub enum CensusError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response did not have the expected table layout.
    #[error("Malformed census table: {message}")]
    Malformed {
        /// Description of what was missing.
        message: String,
    },
}

/// Header names of the columns read from the census table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusColumns {
    /// Column holding the population estimate (e.g. `"POP"`).
    pub population: String,
    /// Column holding the county display name (e.g. `"GEONAME"`).
    pub name: String,
}

impl Default for CensusColumns {
    fn default() -> Self {
        Self {
            population: "POP".to_string(),
            name: "GEONAME".to_string(),
        }
    }
}

/// County reference table keyed by county code.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    counties: BTreeMap<CountyCode, County>,
}

impl PopulationTable {
    /// Builds the table from the raw census response.
    ///
    /// Rows whose `state`/`county` columns do not form a valid county code
    /// are skipped. An unparseable population is kept as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Malformed`] if the response is not an array of
    /// rows or the header lacks a required column.
    pub fn from_json(raw: &serde_json::Value, columns: &CensusColumns) -> Result<Self, CensusError> {
        let rows = raw.as_array().ok_or_else(|| CensusError::Malformed {
            message: "expected a JSON array of rows".to_string(),
        })?;

        let Some((header, body)) = rows.split_first() else {
            return Ok(Self::default());
        };

        let header: Vec<String> = cells(header);
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| CensusError::Malformed {
                    message: format!("missing column {name:?} in header {header:?}"),
                })
        };

        let pop_idx = column(&columns.population)?;
        let name_idx = column(&columns.name)?;
        let state_idx = column("state")?;
        let county_idx = column("county")?;

        let mut counties = BTreeMap::new();
        let mut skipped = 0usize;

        for row in body {
            let row = cells(row);
            let cell = |idx: usize| row.get(idx).map_or("", String::as_str);

            let Ok(code) = CountyCode::from_parts(cell(state_idx), cell(county_idx)) else {
                skipped += 1;
                continue;
            };

            let county = County {
                code: code.clone(),
                name: cell(name_idx).to_string(),
                population: cell(pop_idx).trim().parse().ok(),
            };
            counties.insert(code, county);
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} census rows without a valid county code");
        }

        Ok(Self { counties })
    }

    /// Builds a table directly from county records.
    #[must_use]
    pub fn from_counties(counties: impl IntoIterator<Item = County>) -> Self {
        Self {
            counties: counties.into_iter().map(|c| (c.code.clone(), c)).collect(),
        }
    }

    /// Population of a county, if known.
    #[must_use]
    pub fn population(&self, code: &CountyCode) -> Option<u64> {
        self.counties.get(code).and_then(|c| c.population)
    }

    /// Full county record.
    #[must_use]
    pub fn county(&self, code: &CountyCode) -> Option<&County> {
        self.counties.get(code)
    }

    /// All county codes belonging to a state, in code order.
    #[must_use]
    pub fn counties_in_state(&self, state_fips: &str) -> Vec<CountyCode> {
        self.counties
            .keys()
            .filter(|code| code.state_fips() == state_fips)
            .cloned()
            .collect()
    }

    /// Every county code in the table.
    #[must_use]
    pub fn codes(&self) -> BTreeSet<CountyCode> {
        self.counties.keys().cloned().collect()
    }

    /// Iterates over all counties in code order.
    pub fn iter(&self) -> impl Iterator<Item = &County> {
        self.counties.values()
    }

    /// Number of counties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counties.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}

/// Stringifies one table row. Numbers are kept in their JSON text form,
/// `null` becomes an empty string.
fn cells(row: &serde_json::Value) -> Vec<String> {
    row.as_array()
        .map(|cells| {
            cells
                .iter()
                .map(|c| match c {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!([
            ["POP", "GEONAME", "DATE", "state", "county"],
            ["10000", "Alpha County, Oregon", "9", "41", "001"],
            ["30000", "Beta County, Oregon", "9", "41", "003"],
            ["n/a", "Gamma County, Idaho", "9", "16", "001"],
            [55000, "Delta County, Idaho", "9", "16", "003"],
            ["1", "Broken", "9", "4", "1"]
        ])
    }

    #[test]
    fn builds_table_from_rows() {
        let table = PopulationTable::from_json(&sample(), &CensusColumns::default()).unwrap();
        assert_eq!(table.len(), 4);

        let alpha = CountyCode::parse("41001").unwrap();
        assert_eq!(table.population(&alpha), Some(10_000));
        assert_eq!(table.county(&alpha).unwrap().name, "Alpha County, Oregon");

        let gamma = CountyCode::parse("16001").unwrap();
        assert_eq!(table.population(&gamma), None);

        let delta = CountyCode::parse("16003").unwrap();
        assert_eq!(table.population(&delta), Some(55_000));
    }

    #[test]
    fn groups_counties_by_state() {
        let table = PopulationTable::from_json(&sample(), &CensusColumns::default()).unwrap();
        let oregon: Vec<String> = table
            .counties_in_state("41")
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(oregon, vec!["41001", "41003"]);
        assert!(table.counties_in_state("06").is_empty());
    }

    #[test]
    fn rejects_missing_column() {
        let raw = serde_json::json!([["POP", "state", "county"], ["1", "41", "001"]]);
        let err = PopulationTable::from_json(&raw, &CensusColumns::default()).unwrap_err();
        assert!(matches!(err, CensusError::Malformed { .. }));
    }

    #[test]
    fn empty_response_yields_empty_table() {
        let table =
            PopulationTable::from_json(&serde_json::json!([]), &CensusColumns::default()).unwrap();
        assert!(table.is_empty());
    }
}
