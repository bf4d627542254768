//! Tweet timestamp parsing.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\d:\d\d:\d\d").expect("valid regex"));

/// Twitter's `created_at` layout, e.g. `Mon Aug 21 17:04:05 +0000 2017`.
const TWITTER_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parses a tweet's creation time as a UTC naive datetime.
///
/// The full Twitter layout is used when it parses. Otherwise the first
/// `HH:MM:SS` in the string is placed on `event_date`; the collection only
/// spans the eclipse day, so the clock time is all that matters.
#[must_use]
pub fn parse_created_at(raw: &str, event_date: NaiveDate) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_str(raw.trim(), TWITTER_FORMAT) {
        return Some(dt.naive_utc());
    }

    let clock = CLOCK_RE.find(raw)?;
    let time = NaiveTime::parse_from_str(clock.as_str(), "%H:%M:%S").ok()?;
    Some(event_date.and_time(time))
}
