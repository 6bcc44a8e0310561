//! Patch building: given a peer's `base` descriptor, compute the set of
//! records they're missing (spec.md §4.4). Pure functions of whatever the
//! `Request` has loaded so far -- when more of the version-group log is
//! needed, they report the floor to extend to rather than scanning
//! themselves; `engine::handle_on` drives the extension loop.

use crate::keys;
use crate::kv::KvStore;
use crate::request::Request;
use crate::spec::Spec;
use crate::version::Version;
use crate::version_map::VersionMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffLine {
    pub spec: String,
    pub value: String,
}

pub enum PatchStatus {
    Ready(Vec<DiffLine>),
    NeedFloor(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseShape {
    Bookmark(Version),
    Vector(VersionMap),
}

/// Recognizes a `base` string that is purely one version token (a
/// bookmark) or a concatenation of version tokens (a vector), per
/// spec.md §4.4 cases 4 and 5. `!0` is the reserved "peer has nothing"
/// vector spelling.
pub fn classify_base(base: &str) -> Option<BaseShape> {
    if base == "!0" {
        return Some(BaseShape::Vector(VersionMap::new()));
    }
    let spec = Spec::parse(base).ok()?;
    let tokens = spec.tokens();
    if tokens.is_empty() || tokens.iter().any(|t| t.sigil != '!') {
        return None;
    }
    if tokens.len() == 1 {
        Some(BaseShape::Bookmark(Version::from_token(&tokens[0])))
    } else {
        Some(BaseShape::Vector(VersionMap::from_spec(&spec)))
    }
}

/// The minimum timestamp referenced by any backreference loaded so far, if
/// any extend further back than the current floor.
fn backref_extension<K: KvStore>(req: &Request<'_, K>) -> Option<String> {
    req.backref_values().filter_map(|v| VersionMap::parse(v).min_ts().map(str::to_string)).min()
}

fn diff_lines_for<K: KvStore>(req: &Request<'_, K>, vv: &VersionMap) -> Vec<DiffLine> {
    let mut op_lines = Vec::new();
    for (version, suffix, value) in req.op_records() {
        if !vv.covers(&version) {
            op_lines.push(DiffLine { spec: format!("{}{}", req.object_prefix, suffix), value: value.to_string() });
        }
    }
    op_lines.sort_by(|a, b| a.spec.cmp(&b.spec));

    // The snapshot is the base a peer applies every op on top of, so it
    // must come first regardless of how its key sorts against the ops
    // (case 1, spec.md §4.4).
    let mut lines = Vec::new();
    if let Some(value) = req.op_value(&keys::state_key(vv)) {
        lines.push(DiffLine { spec: format!("{}{}", req.object_prefix, keys::state_key(vv)), value: value.to_string() });
    }
    lines.extend(op_lines);
    lines
}

/// Ensures both the snapshot cut and every reorder below it are loaded,
/// then builds the patch against `vv`.
fn build_against_vector<K: KvStore>(req: &Request<'_, K>, vv: &VersionMap) -> crate::Result<PatchStatus> {
    let floor = vv.max_ts().unwrap_or("0").to_string();
    if !req.floor_covers(&floor) {
        return Ok(PatchStatus::NeedFloor(floor));
    }
    if let Some(extension) = backref_extension(req) {
        if !req.floor_covers(&extension) {
            return Ok(PatchStatus::NeedFloor(extension));
        }
    }
    Ok(PatchStatus::Ready(diff_lines_for(req, vv)))
}

fn build_from_recent_state<K: KvStore>(req: &Request<'_, K>) -> crate::Result<PatchStatus> {
    let Some(recent) = req.meta(keys::RECENT_STATE).map(VersionMap::parse) else {
        return Ok(PatchStatus::Ready(vec![]));
    };
    build_against_vector(req, &recent)
}

fn build_from_bookmark<K: KvStore>(req: &Request<'_, K>, bookmark: &str) -> crate::Result<PatchStatus> {
    let Some(version) = Version::parse(bookmark) else {
        return Err(crate::Error::BaseUnparseable);
    };
    let mut vv = VersionMap::new();
    vv.add(&version);
    build_against_vector(req, &vv)
}

/// Builds the patch a peer needs given their `base` descriptor
/// (spec.md §4.4 cases 1-6). `origin` is the peer's replica id, used to
/// look up their echo bookmark for case 3.
pub fn build_patch<K: KvStore>(req: &mut Request<'_, K>, base: &str, origin: &str) -> crate::Result<PatchStatus> {
    req.ensure_meta()?;
    match base {
        "!~" => Ok(PatchStatus::Ready(vec![])),
        "" => build_from_recent_state(req),
        "-" => match req.meta(&keys::ebm_key(origin)).map(str::to_string) {
            Some(ebm) => build_from_bookmark(req, &ebm),
            None => build_against_vector(req, &VersionMap::new()),
        },
        other => match classify_base(other) {
            Some(BaseShape::Bookmark(v)) => build_from_bookmark(req, &v.render_bare()),
            Some(BaseShape::Vector(vv)) => build_against_vector(req, &vv),
            None => Err(crate::Error::BaseUnparseable),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{MemoryKv, Write};

    #[test]
    fn classifies_bookmark_vs_vector() {
        assert!(matches!(classify_base("!10+X"), Some(BaseShape::Bookmark(_))));
        assert!(matches!(classify_base("!10+X!5+Y"), Some(BaseShape::Vector(_))));
        assert!(matches!(classify_base("!0"), Some(BaseShape::Vector(_))));
        assert_eq!(classify_base("garbage"), None);
        assert_eq!(classify_base("/T#A"), None);
    }

    #[test]
    fn diff_lines_always_puts_the_snapshot_first_regardless_of_key_sort_order() {
        let kv = MemoryKv::new();
        // A multi-source cut where an uncovered op's key sorts *below* the
        // snapshot's key: "!08+B.set" < "!10+A!07+B.state" lexically.
        kv.batch(vec![
            Write::Put(keys::encode("/T#A", "!10+A!07+B.state"), b"snap".to_vec()),
            Write::Put(keys::encode("/T#A", "!08+B.set"), b"v8".to_vec()),
            Write::Put(keys::encode("/T#A", "!11+A.set"), b"v11".to_vec()),
        ])
        .unwrap();
        let mut req = Request::new(&kv, "/T#A".to_string());
        req.ensure_floor("0").unwrap();

        let mut vv = VersionMap::new();
        vv.add(&Version::new("10", "A"));
        vv.add(&Version::new("07", "B"));

        let lines = diff_lines_for(&req, &vv);
        assert_eq!(lines[0].spec, "/T#A!10+A!07+B.state");
        assert_eq!(lines[0].value, "snap");
        assert!(lines[1..].iter().any(|l| l.spec == "/T#A!08+B.set"));
        assert!(lines[1..].iter().any(|l| l.spec == "/T#A!11+A.set"));
    }
}
