//! A single `!timestamp+source` version token (spec.md §3).
//!
//! The timestamp is treated as an opaque, already-comparable string:
//! callers are responsible for minting fixed-width, lexicographically
//! ordered timestamps (the worked examples in spec.md §8 use zero-padded
//! decimal strings like `"09"`, `"10"`, `"11"`). Ordering here is purely
//! lexicographic, per spec.md §3: "Ordering on versions is lexicographic."

use crate::spec::Token;
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version {
    pub timestamp: String,
    pub source: String,
}

impl Version {
    pub fn new(timestamp: impl Into<String>, source: impl Into<String>) -> Self {
        Version { timestamp: timestamp.into(), source: source.into() }
    }

    pub fn from_token(token: &Token) -> Self {
        Version { timestamp: token.bare.clone(), source: token.ext.clone().unwrap_or_default() }
    }

    /// Parses a bare `timestamp+source` value (no leading `!`), as stored
    /// in manifest records like `.tip` and `.bm&source`.
    pub fn parse(value: &str) -> Option<Self> {
        let (timestamp, source) = value.split_once('+')?;
        if timestamp.is_empty() || source.is_empty() {
            return None;
        }
        Some(Version::new(timestamp, source))
    }

    /// The `timestamp+source` form used as a manifest record's value.
    pub fn render_bare(&self) -> String {
        format!("{}+{}", self.timestamp, self.source)
    }

    /// The `!timestamp+source` form used as a key-suffix token.
    pub fn render(&self) -> String {
        format!("!{}", self.render_bare())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp.cmp(&other.timestamp).then_with(|| self.source.cmp(&other.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_and_parses_round_trip() {
        let v = Version::new("11", "X");
        assert_eq!(v.render(), "!11+X");
        assert_eq!(Version::parse(&v.render_bare()), Some(v));
    }

    #[test]
    fn orders_by_timestamp_then_source() {
        assert!(Version::new("09", "W") < Version::new("10", "A"));
        assert!(Version::new("10", "A") < Version::new("10", "B"));
    }
}
