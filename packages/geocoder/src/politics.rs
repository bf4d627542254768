//! Coordinates-to-politics reverse geocoder client.
//!
//! The service resolves `[lat, lon]` pairs to the political regions that
//! contain them. A single `POST` accepts a JSON array of pairs and answers
//! with one result object per pair, in order:
//!
//! ```text
//! [{"location": {...}, "politics": [{"type": "admin6", "code": "41_047", ...}, ...]}, ...]
//! ```
//!
//! `politics` is `null` for points outside any known region. Points near a
//! county border may list several counties.

use std::sync::LazyLock;
use std::time::Duration;

use eclipse_map_census_models::CountyCode;
use regex::Regex;

use crate::GeocodeError;

/// Default coordinates-to-politics endpoint.
pub const DEFAULT_POLITICS_URL: &str = "http://www.datasciencetoolkit.org/coordinates2politics";

/// Maximum number of coordinate pairs per request. The service's JSON
/// parser fails on request bodies with more than a few hundred pairs.
pub const MAX_BATCH_SIZE: usize = 500;

/// County-level politics codes look like `"41_047"`.
static COUNTY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d\d_\d\d\d$").expect("valid regex"));

/// Reverse-geocodes one chunk of `[lat, lon]` pairs.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the request fails or the response is not a
/// JSON array.
pub async fn reverse_geocode_chunk(
    client: &reqwest::Client,
    url: &str,
    coords: &[[f64; 2]],
) -> Result<Vec<serde_json::Value>, GeocodeError> {
    let body = serde_json::to_string(coords)?;

    let resp = client
        .post(url)
        .body(body)
        .timeout(Duration::from_secs(180))
        .send()
        .await?
        .error_for_status()?;

    let text = resp.text().await?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    match value {
        serde_json::Value::Array(results) => {
            if results.len() != coords.len() {
                log::warn!(
                    "Reverse geocoder returned {} results for {} coordinates",
                    results.len(),
                    coords.len()
                );
            }
            Ok(results)
        }
        other => Err(GeocodeError::Parse {
            message: format!("expected a JSON array, got {}", type_name(&other)),
        }),
    }
}

/// Reverse-geocodes all pairs in chunks of at most `batch_size`, calling
/// `on_chunk(done, total)` after each chunk. Results are concatenated in
/// input order.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] for a zero `batch_size`, or the first
/// chunk error. Failed chunks are not retried.
pub async fn reverse_geocode_all(
    client: &reqwest::Client,
    url: &str,
    coords: &[[f64; 2]],
    batch_size: usize,
    mut on_chunk: impl FnMut(usize, usize),
) -> Result<Vec<serde_json::Value>, GeocodeError> {
    if batch_size == 0 {
        return Err(GeocodeError::Parse {
            message: "batch size must be positive".to_string(),
        });
    }

    let mut results = Vec::with_capacity(coords.len());
    let mut done = 0usize;

    for chunk in coords.chunks(batch_size) {
        log::info!("Processing tweets {done} - {}...", done + chunk.len());
        results.extend(reverse_geocode_chunk(client, url, chunk).await?);
        done += chunk.len();
        on_chunk(done, coords.len());
    }

    log::info!("Done! Data on {} coordinates were retrieved.", results.len());
    Ok(results)
}

/// Extracts county codes from one reverse-geocoding result.
///
/// Returns `None` when the result has no politics list or no county-level
/// entries. Duplicate codes are kept once, in first-seen order.
#[must_use]
pub fn county_codes(result: &serde_json::Value) -> Option<Vec<CountyCode>> {
    let politics = result.get("politics")?.as_array()?;

    let mut codes: Vec<CountyCode> = Vec::new();
    for entry in politics {
        let Some(code) = entry.get("code").and_then(serde_json::Value::as_str) else {
            continue;
        };
        if !COUNTY_CODE_RE.is_match(code) {
            continue;
        }
        if let Ok(code) = CountyCode::parse(code)
            && !codes.contains(&code)
        {
            codes.push(code);
        }
    }

    if codes.is_empty() { None } else { Some(codes) }
}

const fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
