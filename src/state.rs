//! Handles an incoming `state` op: installing or replacing a compacted
//! snapshot (spec.md §4.5).

use crate::keys;
use crate::kv::KvStore;
use crate::request::Request;
use crate::version_map::VersionMap;
use crate::Error;

/// `version_vector` is the snapshot's vv (the `!`-sigil tokens of the
/// incoming spec); `author` is that spec's embedded source; `local_source`
/// is this engine's own replica id.
pub fn handle_state<K: KvStore>(
    req: &mut Request<'_, K>,
    version_vector: &VersionMap,
    author: &str,
    local_source: &str,
    value: &str,
) -> crate::Result<()> {
    req.ensure_meta()?;

    match req.meta(keys::TIP) {
        None => {
            let rendered = version_vector.render();
            req.put(keys::BASE_STATE, &rendered);
            req.put(keys::RECENT_STATE, &rendered);
            req.put(&keys::state_key(version_vector), value);
            let tip = version_vector.max_version().map(|v| v.render_bare()).unwrap_or_else(|| "0".to_string());
            req.put(keys::TIP, &tip);
            Ok(())
        }
        Some(_) if author == local_source => {
            if let Some(prev) = req.meta(keys::RECENT_STATE).map(VersionMap::parse) {
                req.delete(&keys::state_key(&prev));
            }
            req.put(&keys::state_key(version_vector), value);
            req.put(keys::RECENT_STATE, &version_vector.render());
            Ok(())
        }
        Some(_) if author == "swarm" => Err(Error::NotImplemented),
        Some(_) => Err(Error::HaveState),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::version::Version;

    fn vv(ts: &str, source: &str) -> VersionMap {
        let mut v = VersionMap::new();
        v.add(&Version::new(ts, source));
        v
    }

    #[test]
    fn stateless_object_bootstraps_from_first_snapshot() {
        let kv = MemoryKv::new();
        let mut req = Request::new(&kv, "/T#A".to_string());
        handle_state(&mut req, &vv("10", "X"), "X", "X", "s0").unwrap();
        assert_eq!(req.writes.len(), 4);
    }

    #[test]
    fn foreign_author_on_open_object_errors() {
        let kv = MemoryKv::new();
        kv.batch(vec![crate::kv::Write::Put(keys::encode("/T#A", keys::TIP), b"10+X".to_vec())]).unwrap();
        let mut req = Request::new(&kv, "/T#A".to_string());
        let err = handle_state(&mut req, &vv("11", "Y"), "Y", "X", "s1").unwrap_err();
        assert_eq!(err, Error::HaveState);
    }

    #[test]
    fn swarm_author_is_not_implemented() {
        let kv = MemoryKv::new();
        kv.batch(vec![crate::kv::Write::Put(keys::encode("/T#A", keys::TIP), b"10+X".to_vec())]).unwrap();
        let mut req = Request::new(&kv, "/T#A".to_string());
        let err = handle_state(&mut req, &vv("11", "swarm"), "swarm", "X", "s1").unwrap_err();
        assert_eq!(err, Error::NotImplemented);
    }
}
