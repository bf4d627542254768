#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geotagged tweet ingestion.
//!
//! Turns the raw tweet collection file into a list of [`TweetEvent`]s:
//! records are extracted, timestamped, classified by location precision,
//! and given a single representative coordinate. Tweets that are only
//! locatable to a whole country are dropped here, as are records whose
//! place or timestamp cannot be parsed.

pub mod location;
pub mod parse;
pub mod time;

use std::path::Path;

use chrono::NaiveDate;
use eclipse_map_tweets_models::{RawTweet, TweetEvent};
use thiserror::Error;

/// Errors that can occur while reading tweets.
#[derive(Debug, Error)]
pub enum TweetError {
    /// Reading the tweet file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A place array could not be interpreted.
    #[error("Place error: {message}")]
    Place {
        /// Description of the problem.
        message: String,
    },
}

/// Reads the tweet collection file and extracts its raw records.
///
/// # Errors
///
/// Returns [`TweetError::Io`] if the file cannot be read.
pub fn read_tweet_file(path: &Path) -> Result<Vec<RawTweet>, TweetError> {
    log::info!("Adding Twitter data from {}...", path.display());
    let text = std::fs::read_to_string(path)?;
    let tweets = parse::extract_raw_tweets(&text);
    log::info!("Extracted {} tweet records", tweets.len());
    Ok(tweets)
}

/// Converts raw records into located events.
///
/// Indices are assigned after filtering, so `events[i].index == i`.
#[must_use]
pub fn build_events(raw: &[RawTweet], event_date: NaiveDate) -> Vec<TweetEvent> {
    let mut events = Vec::with_capacity(raw.len());
    let mut country_only = 0usize;
    let mut unparseable = 0usize;

    for tweet in raw {
        let Some(datetime) = time::parse_created_at(&tweet.created_at, event_date) else {
            log::debug!("Unparseable timestamp {:?}", tweet.created_at);
            unparseable += 1;
            continue;
        };

        let place = match location::parse_place(&tweet.place) {
            Ok(place) => place,
            Err(e) => {
                log::debug!("Skipping tweet by {}: {e}", tweet.user);
                unparseable += 1;
                continue;
            }
        };

        let Some(precision) = location::classify(&place) else {
            country_only += 1;
            continue;
        };

        let Some((longitude, latitude)) = location::center(&place, tweet.coordinates) else {
            unparseable += 1;
            continue;
        };

        events.push(TweetEvent {
            index: events.len(),
            user: tweet.user.clone(),
            text: tweet.text.clone(),
            datetime,
            place: place.descriptor,
            precision,
            latitude,
            longitude,
        });
    }

    log::info!(
        "Built {} tweet events ({country_only} without county-level location, {unparseable} unparseable)",
        events.len()
    );

    events
}

#[cfg(test)]
mod tests {
    use eclipse_map_tweets_models::LocationPrecision;

    use super::*;

    fn raw(user: &str, created_at: &str, kind: &str, name: &str) -> RawTweet {
        RawTweet {
            user: user.to_string(),
            text: format!("tweet from {user}"),
            created_at: created_at.to_string(),
            place: vec![
                serde_json::json!(kind),
                serde_json::json!(name),
                serde_json::json!([[[-123.0, 44.0], [-123.0, 45.0], [-122.0, 45.0], [-122.0, 44.0]]]),
            ],
            coordinates: None,
        }
    }

    fn eclipse_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 8, 21).unwrap()
    }

    #[test]
    fn builds_events_and_drops_unlocatable_tweets() {
        let tweets = vec![
            raw("a", "Mon Aug 21 17:00:00 +0000 2017", "city", "Salem, OR"),
            raw("b", "Mon Aug 21 17:01:00 +0000 2017", "country", "United States"),
            raw("c", "Mon Aug 21 17:02:00 +0000 2017", "admin", "Oregon, USA"),
            raw("d", "no time", "city", "Bend, OR"),
        ];

        let events = build_events(&tweets, eclipse_day());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].user, "a");
        assert_eq!(events[0].precision, LocationPrecision::Point);
        assert_eq!(events[1].user, "c");
        assert_eq!(events[1].index, 1);
        assert_eq!(events[1].precision, LocationPrecision::State("41".to_string()));
        assert!((events[0].longitude - -122.5).abs() < 1e-9);
        assert!((events[0].latitude - 44.5).abs() < 1e-9);
        assert_eq!(events[0].place.len(), 2);
    }

    #[test]
    fn reads_tweet_file_from_disk() {
        let path = std::env::temp_dir().join("eclipse_map_tweets_read_test.json");
        std::fs::write(
            &path,
            r#"{"USER": "a", "TEXT": "hi", "CREATED AT": "17:00:00", "PLACE": ["poi", "Madras", [[[-121.2, 44.6], [-121.2, 44.7], [-121.1, 44.7], [-121.1, 44.6]]]]}"#,
        )
        .unwrap();

        let tweets = read_tweet_file(&path).unwrap();
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].text, "hi");

        let _ = std::fs::remove_file(&path);
    }
}
