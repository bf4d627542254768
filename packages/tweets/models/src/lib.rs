#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geotagged tweet types.
//!
//! [`RawTweet`] mirrors one record of the collected tweet file as-is.
//! [`TweetEvent`] is the cleaned form the rest of the pipeline works with:
//! a timestamp, a location precision, and a single representative
//! coordinate.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One tweet as stored in the collected data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTweet {
    /// Screen name of the author.
    #[serde(rename = "USER")]
    pub user: String,
    /// Tweet body.
    #[serde(rename = "TEXT", default)]
    pub text: String,
    /// Creation time as reported by Twitter.
    #[serde(rename = "CREATED AT")]
    pub created_at: String,
    /// Place description: `[type, full name, ..., bounding box]`.
    ///
    /// The bounding box is always the last element, shaped
    /// `[[[lon, lat], [lon, lat], [lon, lat], [lon, lat]]]`.
    #[serde(rename = "PLACE")]
    pub place: Vec<serde_json::Value>,
    /// Exact `[lon, lat]` when the author shared a precise location.
    #[serde(rename = "COORDINATES", default)]
    pub coordinates: Option<[f64; 2]>,
}

/// Twitter place type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PlaceKind {
    /// Administrative region (state, or a county-like area).
    Admin,
    /// City.
    City,
    /// Neighborhood.
    Neighborhood,
    /// Point of interest.
    Poi,
    /// Whole country; too coarse to attribute.
    Country,
    /// Any other place type.
    #[strum(default)]
    Other(String),
}

/// A parsed place description.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Place type.
    pub kind: PlaceKind,
    /// Full place name (e.g. "Portland, OR" or "Oregon, USA").
    pub full_name: String,
    /// The place array without its trailing bounding box.
    pub descriptor: Vec<serde_json::Value>,
    /// Bounding box corners as `[lon, lat]`.
    pub bbox: Vec<[f64; 2]>,
}

/// How precisely a tweet can be located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationPrecision {
    /// The place is small enough to reverse-geocode its center.
    Point,
    /// Only the state is known; holds the state FIPS code.
    State(String),
}

impl LocationPrecision {
    /// State FIPS code for state-level tweets.
    #[must_use]
    pub fn state_fips(&self) -> Option<&str> {
        match self {
            Self::Point => None,
            Self::State(fips) => Some(fips),
        }
    }
}

/// A cleaned, located tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetEvent {
    /// Position in the cleaned event list (aligns with reverse-geocoding
    /// results).
    pub index: usize,
    /// Author screen name.
    pub user: String,
    /// Tweet body.
    pub text: String,
    /// Creation time.
    pub datetime: NaiveDateTime,
    /// Place array without the bounding box.
    pub place: Vec<serde_json::Value>,
    /// Location precision.
    pub precision: LocationPrecision,
    /// Representative latitude.
    pub latitude: f64,
    /// Representative longitude.
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn deserializes_raw_tweet() {
        let raw: RawTweet = serde_json::from_str(
            r#"{"USER": "sky_watcher", "TEXT": "Totality!", "CREATED AT": "Mon Aug 21 17:21:04 +0000 2017",
                "PLACE": ["city", "Salem, OR", [[[-123.1, 44.8], [-123.1, 45.0], [-122.9, 45.0], [-122.9, 44.8]]]]}"#,
        )
        .unwrap();
        assert_eq!(raw.user, "sky_watcher");
        assert_eq!(raw.place.len(), 3);
        assert!(raw.coordinates.is_none());
    }

    #[test]
    fn parses_place_kinds() {
        assert_eq!(PlaceKind::from_str("admin").unwrap(), PlaceKind::Admin);
        assert_eq!(PlaceKind::from_str("poi").unwrap(), PlaceKind::Poi);
        assert_eq!(
            PlaceKind::from_str("planet").unwrap(),
            PlaceKind::Other("planet".to_string())
        );
    }

    #[test]
    fn state_precision_exposes_fips() {
        assert_eq!(LocationPrecision::State("41".into()).state_fips(), Some("41"));
        assert_eq!(LocationPrecision::Point.state_fips(), None);
    }
}
