//! Tweet point features.

use eclipse_map_tweets_models::{LocationPrecision, TweetEvent};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// Timestamp format used in feature properties.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn tweet_feature(event: &TweetEvent) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("User".to_string(), event.user.clone().into());
    properties.insert("Text".to_string(), event.text.clone().into());
    properties.insert(
        "Datetime".to_string(),
        event.datetime.format(DATETIME_FORMAT).to_string().into(),
    );
    properties.insert(
        "Place".to_string(),
        serde_json::Value::Array(event.place.clone()),
    );

    // GeoJSON positions are [lon, lat].
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            event.longitude,
            event.latitude,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Builds a point feature for every precisely located tweet.
///
/// State-level tweets are left out since their coordinate is only the
/// center of a whole state.
#[must_use]
pub fn tweet_feature_collection(events: &[TweetEvent]) -> FeatureCollection {
    let features: Vec<Feature> = events
        .iter()
        .filter(|e| e.precision == LocationPrecision::Point)
        .map(tweet_feature)
        .collect();

    log::info!(
        "Created {} tweet features ({} state-level tweets skipped)",
        features.len(),
        events.len() - features.len()
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
