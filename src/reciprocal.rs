//! Choosing the reciprocal `base` to send back when handling an `on`
//! (spec.md §4.4 "Reciprocal subscription choice", §4.7 "Deriving a
//! version vector").

use crate::keys;
use crate::kv::KvStore;
use crate::patch::{self, BaseShape};
use crate::request::Request;
use crate::version_map::VersionMap;

pub enum ReciprocalStatus {
    Ready(String),
    NeedFloor(String),
}

/// Reconstructs the full version vector this replica has accepted, by
/// starting from `.recent_state` and folding in every loaded op and every
/// version named by a loaded backreference (spec.md §4.7).
pub fn derive_vector<K: KvStore>(req: &mut Request<'_, K>) -> crate::Result<(VersionMap, Option<String>)> {
    req.ensure_meta()?;
    let recent = req.meta(keys::RECENT_STATE).map(VersionMap::parse).unwrap_or_default();
    let floor = recent.max_ts().unwrap_or("0").to_string();
    if !req.floor_covers(&floor) {
        return Ok((VersionMap::new(), Some(floor)));
    }
    let mut vv = recent;
    for (version, _, _) in req.op_records() {
        vv.add(&version);
    }
    for backref in req.backref_values() {
        for version in VersionMap::parse(backref).versions() {
            vv.add(&version);
        }
    }
    Ok((vv, None))
}

/// Decides what base to send back to `origin` given the base they sent us
/// (spec.md §4.4's reciprocal-subscription rules).
pub fn compute<K: KvStore>(req: &mut Request<'_, K>, base: &str, origin: &str) -> crate::Result<ReciprocalStatus> {
    req.ensure_meta()?;

    if req.meta(keys::BASE_STATE).is_none() {
        return Ok(ReciprocalStatus::Ready(String::new()));
    }
    if base.is_empty() || base == "-" {
        let tip = req.meta(keys::TIP).unwrap_or_default().to_string();
        return Ok(ReciprocalStatus::Ready(tip));
    }
    if let Some(bm) = req.meta(&keys::bm_key(origin)).map(str::to_string) {
        return Ok(ReciprocalStatus::Ready(bm));
    }
    if matches!(patch::classify_base(base), Some(BaseShape::Bookmark(_))) {
        return Ok(ReciprocalStatus::Ready(String::new()));
    }

    match derive_vector(req)? {
        (vv, None) => Ok(ReciprocalStatus::Ready(vv.render())),
        (_, Some(floor)) => Ok(ReciprocalStatus::NeedFloor(floor)),
    }
}
