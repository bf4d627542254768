//! Extraction of tweet records from the raw collection file.
//!
//! The collector appended one JSON object per tweet without a surrounding
//! array or reliable separators, so records are located by pattern: each
//! starts at `{"USER"` and ends at the `]]]}` that closes the place
//! bounding box.

use std::sync::LazyLock;

use eclipse_map_tweets_models::RawTweet;
use regex::Regex;

static RECORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{"USER".*?\]\]\]\}"#).expect("valid regex"));

/// Finds and deserializes every tweet record in `text`.
///
/// Records that match the pattern but fail to deserialize are skipped.
#[must_use]
pub fn extract_raw_tweets(text: &str) -> Vec<RawTweet> {
    let mut tweets = Vec::new();
    let mut failed = 0usize;

    for m in RECORD_RE.find_iter(text) {
        match serde_json::from_str::<RawTweet>(m.as_str()) {
            Ok(tweet) => tweets.push(tweet),
            Err(e) => {
                failed += 1;
                log::debug!("Skipping unparseable tweet record at byte {}: {e}", m.start());
            }
        }
    }

    if failed > 0 {
        log::warn!("Skipped {failed} unparseable tweet records");
    }

    tweets
}
