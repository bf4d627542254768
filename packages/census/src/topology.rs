//! County ids from a US `TopoJSON` atlas.
//!
//! The map front end draws counties from the d3 `us-10m` atlas, which
//! contains a few county ids the population API does not report. Those
//! ids still need a row in the color output so the map has no holes.

use std::collections::BTreeSet;

use eclipse_map_census_models::CountyCode;

use crate::CensusError;

/// Default US atlas location.
pub const DEFAULT_TOPOJSON_URL: &str = "https://d3js.org/us-10m.v1.json";

/// Fetches the raw `TopoJSON` document.
///
/// # Errors
///
/// Returns [`CensusError`] if the request fails or the body is not JSON.
pub async fn fetch_topology(
    client: &reqwest::Client,
    url: &str,
) -> Result<serde_json::Value, CensusError> {
    log::info!("Getting US TopoJSON data from {url}...");
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.json().await?)
}

/// Collects the county codes in `objects.counties.geometries[].id`.
///
/// Ids may be strings or numbers; numeric ids lose their leading zero in
/// the atlas, so they are zero-padded back to 5 digits. Ids that still do
/// not form a county code are ignored.
///
/// # Errors
///
/// Returns [`CensusError::Malformed`] if the document has no county
/// geometries array.
pub fn county_ids(topology: &serde_json::Value) -> Result<BTreeSet<CountyCode>, CensusError> {
    let geometries = topology["objects"]["counties"]["geometries"]
        .as_array()
        .ok_or_else(|| CensusError::Malformed {
            message: "TopoJSON has no objects.counties.geometries array".to_string(),
        })?;

    Ok(geometries
        .iter()
        .filter_map(|g| match &g["id"] {
            serde_json::Value::String(s) => CountyCode::parse(&format!("{s:0>5}")).ok(),
            serde_json::Value::Number(n) => {
                CountyCode::parse(&format!("{:0>5}", n.to_string())).ok()
            }
            _ => None,
        })
        .collect())
}
