//! Storage-key layout for one object.
//!
//! Every record for an object `/Type#Id` is stored under a raw KV key built
//! from the object prefix plus a one-byte group discriminant plus the
//! record's wire suffix (`.tip`, `!10+X.op`, ...). The discriminant exists
//! because the wire sigils themselves don't sort the way spec.md §3 needs:
//! raw ASCII has `!` (0x21) below `.` (0x2E), but the invariant is that
//! every manifest record sorts before every version record. Tagging the two
//! groups with `0x00`/`0x01` makes that hold regardless of the sigil bytes,
//! and keeps the suffix bytes themselves unchanged so decoding is just a
//! strip-and-reparse.
//!
//! This also gives the reentrant load loop (see `request.rs`) cheap,
//! correctly-bounded scans: the meta group is `[prefix+0x00, prefix+0x01)`
//! and the version group below some floor `f` is `[prefix+0x01+f, prefix+0x01+prev)`.

use crate::version::Version;
use crate::version_map::VersionMap;

const GROUP_META: u8 = 0x00;
const GROUP_VERSION: u8 = 0x01;
const GROUP_END: u8 = 0x02;

pub const BASE_STATE: &str = ".base_state";
pub const RECENT_STATE: &str = ".recent_state";
pub const TIP: &str = ".tip";

pub fn object_prefix(ty: &str, id: &str) -> String {
    format!("/{ty}#{id}")
}

pub fn bm_key(source: &str) -> String {
    format!(".bm&{source}")
}

pub fn ebm_key(source: &str) -> String {
    format!(".ebm&{source}")
}

/// The key suffix for a regular application op: the version token plus the
/// op's *own* name as given on the wire (`.set`, `.inc`, ...), preserved
/// verbatim so a later patch can echo the exact spec the author sent.
pub fn op_key(version: &Version, op_name: &str) -> String {
    format!("{}.{}", version.render(), op_name)
}

pub fn state_key(vv: &VersionMap) -> String {
    format!("{}.state", vv.render())
}

pub fn backref_key(version: &Version) -> String {
    format!("{}.~br", version.render())
}

/// Encodes an object-relative suffix into the raw KV key for `prefix`.
pub fn encode(prefix: &str, suffix: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + 1 + suffix.len());
    out.extend_from_slice(prefix.as_bytes());
    out.push(group_of(suffix));
    out.extend_from_slice(suffix.as_bytes());
    out
}

fn group_of(suffix: &str) -> u8 {
    match suffix.chars().next() {
        Some('!') => GROUP_VERSION,
        _ => GROUP_META,
    }
}

/// Decodes a raw KV key for `prefix` back into its wire suffix, or `None`
/// if `key` does not belong to `prefix`.
pub fn decode<'a>(prefix: &str, key: &'a [u8]) -> Option<&'a str> {
    let prefix_bytes = prefix.as_bytes();
    if key.len() <= prefix_bytes.len() || &key[..prefix_bytes.len()] != prefix_bytes {
        return None;
    }
    std::str::from_utf8(&key[prefix_bytes.len() + 1..]).ok()
}

/// Exclusive upper bound of the meta group (= inclusive lower bound of the
/// version group), used both to bound the first scan and as the "we've
/// loaded nothing from the version group yet" upper bound.
pub fn meta_end(prefix: &str) -> Vec<u8> {
    let mut out = prefix.as_bytes().to_vec();
    out.push(GROUP_VERSION);
    out
}

pub fn meta_start(prefix: &str) -> Vec<u8> {
    let mut out = prefix.as_bytes().to_vec();
    out.push(GROUP_META);
    out
}

/// Inclusive lower bound of the version group starting at `floor` (a bare
/// timestamp, or `"0"` for "everything"). Every version-group key's suffix
/// starts with the `!` sigil, which sorts below ASCII digits (`0x21` vs.
/// `0x30`-`0x39`); a bare-timestamp bound must therefore be prefixed with
/// `!` before encoding, or it would sort *after* every real key and the
/// scan would silently return nothing.
pub fn version_floor(prefix: &str, floor: &str) -> Vec<u8> {
    let mut out = prefix.as_bytes().to_vec();
    out.push(GROUP_VERSION);
    out.push(b'!');
    out.extend_from_slice(floor.as_bytes());
    out
}

/// Exclusive upper bound covering the entire version group (used the first
/// time it is scanned, before any floor has been established).
pub fn version_end(prefix: &str) -> Vec<u8> {
    let mut out = prefix.as_bytes().to_vec();
    out.push(GROUP_END);
    out
}
