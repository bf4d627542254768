//! Census Bureau population-statistics API client.
//!
//! A single `GET` returns every county's population estimate and name as
//! a JSON table. No API key is required for this volume of requests.

use crate::CensusError;

/// Default population-estimate query: July 1, 2016 county estimates with
/// population, county name, and county code.
pub const DEFAULT_POPULATION_URL: &str =
    "https://api.census.gov/data/2016/pep/population?get=POP,GEONAME&for=COUNTY:*&DATE=9";

/// Fetches the raw county population table.
///
/// The response is returned unparsed so that it can be cached verbatim and
/// re-read with [`crate::PopulationTable::from_json`].
///
/// # Errors
///
/// Returns [`CensusError`] if the request fails, the server answers with a
/// non-success status, or the body is not JSON.
pub async fn fetch_population(
    client: &reqwest::Client,
    url: &str,
) -> Result<serde_json::Value, CensusError> {
    log::info!("Fetching county population data from {url}...");

    let resp = client.get(url).send().await?.error_for_status()?;
    let body = resp.text().await?;

    let table: serde_json::Value = serde_json::from_str(&body)?;
    let rows = table.as_array().map_or(0, |rows| rows.len().saturating_sub(1));
    log::info!("Received population data for {rows} counties");

    Ok(table)
}
