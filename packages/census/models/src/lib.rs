#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County reference types.
//!
//! Counties are the unit every tweet tally is attributed to. A county is
//! identified by its 5-digit code (2-digit state FIPS followed by the
//! 3-digit county FIPS) and carries the population estimate and display
//! name reported by the Census Bureau.

pub mod fips;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid county code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid county code: {0:?}")]
pub struct InvalidCountyCode(pub String);

/// A 5-digit county code, e.g. `"06037"` for Los Angeles County, CA.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountyCode(String);

impl CountyCode {
    /// Builds a county code from its state and county FIPS parts.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCountyCode`] unless `state` is 2 digits and
    /// `county` is 3 digits.
    pub fn from_parts(state: &str, county: &str) -> Result<Self, InvalidCountyCode> {
        if state.len() == 2 && county.len() == 3 && all_digits(state) && all_digits(county) {
            Ok(Self(format!("{state}{county}")))
        } else {
            Err(InvalidCountyCode(format!("{state}{county}")))
        }
    }

    /// Parses either the plain form (`"06037"`) or the underscore form used
    /// by reverse-geocoding results (`"06_037"`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCountyCode`] for anything else.
    pub fn parse(s: &str) -> Result<Self, InvalidCountyCode> {
        match s.split_once('_') {
            Some((state, county)) => Self::from_parts(state, county),
            None if s.len() == 5 => Self::from_parts(&s[..2], &s[2..]),
            None => Err(InvalidCountyCode(s.to_string())),
        }
    }

    /// The 2-digit state FIPS prefix.
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.0[..2]
    }

    /// The full 5-digit code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for CountyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountyCode {
    type Err = InvalidCountyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountyCode {
    type Error = InvalidCountyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountyCode> for String {
    fn from(code: CountyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CountyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A county as reported by the population-statistics API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct County {
    /// 5-digit county code.
    pub code: CountyCode,
    /// Display name (e.g. "Los Angeles County, California").
    pub name: String,
    /// Population estimate, if the API reported a parseable value.
    pub population: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_code() {
        let code = CountyCode::parse("06037").unwrap();
        assert_eq!(code.as_str(), "06037");
        assert_eq!(code.state_fips(), "06");
    }

    #[test]
    fn parses_underscore_code() {
        let code = CountyCode::parse("41_005").unwrap();
        assert_eq!(code.as_str(), "41005");
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(CountyCode::parse("6037").is_err());
        assert!(CountyCode::parse("06_37").is_err());
        assert!(CountyCode::parse("ab123").is_err());
        assert!(CountyCode::parse("").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let code = CountyCode::from_parts("11", "001").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"11001\"");
        let back: CountyCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }
}
