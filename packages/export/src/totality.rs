//! Eclipse path of totality from NASA's path table.
//!
//! Each row of the table gives a universal time followed by the northern
//! limit, southern limit, and central line as `DD MM.MH DDD MM.MH`
//! (degrees, decimal minutes, hemisphere).

use std::sync::LazyLock;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use regex::{Captures, Regex};

use crate::ExportError;

static PATH_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    let coordinate = r"(\d+) ([\d.]+)(\w) (\d+) ([\d.]+)(\w)";
    Regex::new(&format!(
        r"(\d+:\d+)   {coordinate}  {coordinate}  {coordinate}"
    ))
    .expect("valid regex")
});

/// One row of the path table; positions are `[lon, lat]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRow {
    /// Universal time, `HH:MM`.
    pub time: String,
    /// Northern limit of totality.
    pub northern: [f64; 2],
    /// Southern limit of totality.
    pub southern: [f64; 2],
    /// Central line.
    pub central: [f64; 2],
}

fn hemisphere_sign(letter: &str) -> Result<f64, ExportError> {
    match letter {
        "N" | "E" => Ok(1.0),
        "S" | "W" => Ok(-1.0),
        other => Err(ExportError::Parse {
            message: format!("Unknown hemisphere {other:?}"),
        }),
    }
}

/// Degrees from capture groups `first..first + 3` (degrees, minutes,
/// hemisphere).
fn angle(caps: &Captures<'_>, first: usize) -> Result<f64, ExportError> {
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    let degrees: f64 = group(first).parse().map_err(|e| ExportError::Parse {
        message: format!("Bad degrees {:?}: {e}", group(first)),
    })?;
    let minutes: f64 = group(first + 1).parse().map_err(|e| ExportError::Parse {
        message: format!("Bad minutes {:?}: {e}", group(first + 1)),
    })?;

    Ok(hemisphere_sign(group(first + 2))? * (degrees + minutes / 60.0))
}

/// `[lon, lat]` from the six capture groups starting at `first`.
fn position(caps: &Captures<'_>, first: usize) -> Result<[f64; 2], ExportError> {
    let lat = angle(caps, first)?;
    let lon = angle(caps, first + 3)?;
    Ok([lon, lat])
}

/// Parses every path row found in the table text.
///
/// # Errors
///
/// Returns [`ExportError::Parse`] if no rows are found or a row holds an
/// invalid number or hemisphere.
pub fn parse_path(text: &str) -> Result<Vec<PathRow>, ExportError> {
    let rows = PATH_ROW_RE
        .captures_iter(text)
        .map(|caps| {
            Ok(PathRow {
                time: caps[1].to_string(),
                northern: position(&caps, 2)?,
                southern: position(&caps, 8)?,
                central: position(&caps, 14)?,
            })
        })
        .collect::<Result<Vec<_>, ExportError>>()?;

    if rows.is_empty() {
        return Err(ExportError::Parse {
            message: "No path rows found in eclipse path table".to_string(),
        });
    }

    log::info!("Parsed {} eclipse path rows", rows.len());
    Ok(rows)
}

fn named_feature(name: &str, value: Value) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("Name".to_string(), name.into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Builds the central line and the region of totality.
///
/// The region polygon runs along the northern limit, back along the
/// southern limit, and closes on its first point.
#[must_use]
pub fn path_feature_collection(rows: &[PathRow]) -> FeatureCollection {
    let central: Vec<Vec<f64>> = rows.iter().map(|r| r.central.to_vec()).collect();

    let mut ring: Vec<Vec<f64>> = rows.iter().map(|r| r.northern.to_vec()).collect();
    ring.extend(rows.iter().rev().map(|r| r.southern.to_vec()));
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }

    FeatureCollection {
        bbox: None,
        features: vec![
            named_feature("Central line of totality", Value::LineString(central)),
            named_feature("Region of totality", Value::Polygon(vec![ring])),
        ],
        foreign_members: None,
    }
}
