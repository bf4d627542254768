//! Place parsing, location precision, and representative coordinates.

use std::str::FromStr;

use eclipse_map_census_models::fips;
use eclipse_map_tweets_models::{LocationPrecision, Place, PlaceKind};
use geo::{BoundingRect, MultiPoint, Point};

use crate::TweetError;

/// Suffix Twitter appends to state-level `admin` place names.
const STATE_SUFFIX: &str = ", USA";

/// Parses a raw `PLACE` array.
///
/// # Errors
///
/// Returns [`TweetError::Place`] if the array is too short, the type or
/// name is not a string, or the trailing bounding box is malformed.
pub fn parse_place(values: &[serde_json::Value]) -> Result<Place, TweetError> {
    let place_error = |message: &str| TweetError::Place {
        message: message.to_string(),
    };

    let (bbox_value, descriptor) = values
        .split_last()
        .ok_or_else(|| place_error("empty place array"))?;

    let kind = descriptor
        .first()
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| place_error("missing place type"))?;
    let full_name = descriptor
        .get(1)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| place_error("missing place name"))?;

    let rings: Vec<Vec<[f64; 2]>> = serde_json::from_value(bbox_value.clone())
        .map_err(|e| place_error(&format!("malformed bounding box: {e}")))?;
    let bbox: Vec<[f64; 2]> = rings.into_iter().flatten().collect();

    Ok(Place {
        kind: PlaceKind::from_str(kind).unwrap_or_else(|_| PlaceKind::Other(kind.to_string())),
        full_name: full_name.to_string(),
        descriptor: descriptor.to_vec(),
        bbox,
    })
}

/// Determines how precisely a place locates a tweet.
///
/// Returns `None` for places that cannot be attributed to counties at all:
/// country-level places, and state-level places naming an unknown state.
#[must_use]
pub fn classify(place: &Place) -> Option<LocationPrecision> {
    match &place.kind {
        PlaceKind::Country => None,
        PlaceKind::Admin => place.full_name.strip_suffix(STATE_SUFFIX).map_or(
            Some(LocationPrecision::Point),
            |state| match fips::name_to_fips(state) {
                Some(code) => Some(LocationPrecision::State(code.to_string())),
                None => {
                    log::debug!("Unknown state in place name {:?}", place.full_name);
                    None
                }
            },
        ),
        _ => Some(LocationPrecision::Point),
    }
}

/// Picks a representative `(lon, lat)` for a tweet.
///
/// Exact coordinates win when present; otherwise the center of the place
/// bounding box is used.
#[must_use]
pub fn center(place: &Place, coordinates: Option<[f64; 2]>) -> Option<(f64, f64)> {
    if let Some([lon, lat]) = coordinates {
        return Some((lon, lat));
    }

    let points: MultiPoint<f64> = place
        .bbox
        .iter()
        .map(|[lon, lat]| Point::new(*lon, *lat))
        .collect();
    let rect = points.bounding_rect()?;
    let c = rect.center();
    Some((c.x, c.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(kind: &str, name: &str) -> Place {
        parse_place(&[
            serde_json::json!(kind),
            serde_json::json!(name),
            serde_json::json!([[[-124.0, 42.0], [-124.0, 46.0], [-116.0, 46.0], [-116.0, 42.0]]]),
        ])
        .unwrap()
    }

    #[test]
    fn parses_place_array() {
        let p = place("city", "Salem, OR");
        assert_eq!(p.kind, PlaceKind::City);
        assert_eq!(p.full_name, "Salem, OR");
        assert_eq!(p.descriptor.len(), 2);
        assert_eq!(p.bbox.len(), 4);
    }

    #[test]
    fn rejects_malformed_place() {
        assert!(parse_place(&[]).is_err());
        assert!(parse_place(&[serde_json::json!("city"), serde_json::json!([1, 2])]).is_err());
        assert!(
            parse_place(&[
                serde_json::json!("city"),
                serde_json::json!("Salem, OR"),
                serde_json::json!("not a box"),
            ])
            .is_err()
        );
    }

    #[test]
    fn state_level_admin_places() {
        assert_eq!(
            classify(&place("admin", "Oregon, USA")),
            Some(LocationPrecision::State("41".to_string()))
        );
        assert_eq!(
            classify(&place("admin", "Multnomah County, OR")),
            Some(LocationPrecision::Point)
        );
        assert_eq!(classify(&place("admin", "Atlantis, USA")), None);
    }

    #[test]
    fn country_places_are_discarded() {
        assert_eq!(classify(&place("country", "United States")), None);
        assert_eq!(
            classify(&place("neighborhood", "Pearl District")),
            Some(LocationPrecision::Point)
        );
    }

    #[test]
    fn center_of_bounding_box() {
        let (lon, lat) = center(&place("city", "x"), None).unwrap();
        assert!((lon - -120.0).abs() < 1e-9);
        assert!((lat - 44.0).abs() < 1e-9);
    }

    #[test]
    fn exact_coordinates_take_precedence() {
        let (lon, lat) = center(&place("city", "x"), Some([-122.5, 45.5])).unwrap();
        assert!((lon - -122.5).abs() < f64::EPSILON);
        assert!((lat - 45.5).abs() < f64::EPSILON);
    }
}
