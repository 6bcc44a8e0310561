//! A version vector: `source -> max timestamp accepted from that source`
//! (spec.md §3). Backed by a `BTreeMap` so iteration and rendering fall out
//! sorted by source for free, matching the canonical "stable, sorted by
//! source" rendering spec.md requires.

use crate::spec::Spec;
use crate::version::Version;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionMap {
    entries: BTreeMap<String, String>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the entry for `version.source` to `version.timestamp` if that
    /// is newer than whatever is already recorded (monotonic merge).
    pub fn add(&mut self, version: &Version) {
        match self.entries.get(&version.source) {
            Some(existing) if *existing >= version.timestamp => {}
            _ => {
                self.entries.insert(version.source.clone(), version.timestamp.clone());
            }
        }
    }

    pub fn covers(&self, version: &Version) -> bool {
        self.entries.get(&version.source).is_some_and(|ts| *ts >= version.timestamp)
    }

    /// Whether any entry at all is recorded for `source`, regardless of its
    /// timestamp. Distinct from `covers`: a backref guard needs to know
    /// whether a source has been recorded yet at all (so it only ever
    /// records the *earliest* reorder from that source), not whether the
    /// recorded entry already dominates a given version.
    pub fn has_source(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    pub fn covers_all(&self, other: &VersionMap) -> bool {
        other.entries.iter().all(|(source, ts)| self.entries.get(source).is_some_and(|mine| mine >= ts))
    }

    pub fn max_ts(&self) -> Option<&str> {
        self.entries.values().map(String::as_str).max()
    }

    /// The version with the lexicographically greatest timestamp, if any
    /// entries are present. Used where a single bookmark-shaped version is
    /// needed from a vv (e.g. minting `.tip` when bootstrapping an object
    /// from a snapshot); ties on timestamp are broken by source for
    /// determinism, since the spec leaves multi-source ties unspecified.
    pub fn max_version(&self) -> Option<Version> {
        self.entries
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(source, ts)| Version::new(ts.clone(), source.clone()))
    }

    pub fn min_ts(&self) -> Option<&str> {
        self.entries.values().map(String::as_str).min()
    }

    pub fn union(&self, other: &VersionMap) -> VersionMap {
        let mut out = self.clone();
        for (source, ts) in &other.entries {
            match out.entries.get(source) {
                Some(existing) if existing >= ts => {}
                _ => {
                    out.entries.insert(source.clone(), ts.clone());
                }
            }
        }
        out
    }

    /// Componentwise minimum over entries present in *both* maps (spec.md
    /// §3's `lowerUnion`), used to bound how far a catch-up scan can stop.
    pub fn lower_union(&self, other: &VersionMap) -> VersionMap {
        let mut out = VersionMap::new();
        for (source, ts) in &self.entries {
            if let Some(other_ts) = other.entries.get(source) {
                let min_ts = if ts <= other_ts { ts } else { other_ts };
                out.entries.insert(source.clone(), min_ts.clone());
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn versions(&self) -> impl Iterator<Item = Version> + '_ {
        self.entries.iter().map(|(source, ts)| Version::new(ts.clone(), source.clone()))
    }

    /// Canonical rendering: `!ts+source` tokens concatenated in source
    /// order (stable because `BTreeMap` iterates sorted by key).
    pub fn render(&self) -> String {
        self.entries.iter().map(|(source, ts)| format!("!{ts}+{source}")).collect()
    }

    /// Parses a rendered vv string (a concatenation of `!timestamp+source`
    /// tokens, as stored in `.base_state`/`.recent_state` and backref
    /// values). Malformed input yields an empty map rather than an error:
    /// this is used only to re-read the engine's own prior writes.
    pub fn parse(rendered: &str) -> VersionMap {
        let mut vv = VersionMap::new();
        if let Ok(spec) = Spec::parse(rendered) {
            for token in spec.filter('!').tokens() {
                vv.add(&Version::from_token(token));
            }
        }
        vv
    }

    /// Builds a vv from the `!`-sigil tokens of a key's Spec (e.g. a state
    /// snapshot's `!vv.state` suffix).
    pub fn from_spec(spec: &Spec) -> VersionMap {
        let mut vv = VersionMap::new();
        for token in spec.filter('!').tokens() {
            vv.add(&Version::from_token(token));
        }
        vv
    }
}
