//! `anyop`: ingesting a regular (non-reserved) op, classifying it as an
//! echo, a replay, an out-of-order reorder, or a new in-order write
//! (spec.md §4.6).

use crate::keys;
use crate::kv::KvStore;
use crate::request::Request;
use crate::version::Version;
use crate::version_map::VersionMap;
use crate::Error;
use std::cmp::Ordering;

/// Ingests `version` (carrying `value`, with application op-name
/// `op_name`, e.g. `"set"`), as relayed to us by `sender` (the op's
/// immediate sender -- not necessarily `version.source`, the original
/// author: a peer may relay an op it did not itself write). Returns
/// whether the accepted op should be echoed back out to the Host (new
/// in-order writes and reorders are; plain echoes and replays are not).
pub fn handle_regular<K: KvStore>(
    req: &mut Request<'_, K>,
    version: &Version,
    op_name: &str,
    value: &str,
    sender: &str,
    bookmarking: bool,
) -> crate::Result<bool> {
    req.ensure_meta()?;
    let tip_raw = req.meta(keys::TIP).map(str::to_string).ok_or(Error::NoSuchObject)?;
    let tip = Version::parse(&tip_raw).ok_or_else(|| Error::Backend("corrupt .tip record".into()))?;

    let emit = match version.timestamp.cmp(&tip.timestamp) {
        Ordering::Equal => {
            req.put(&keys::ebm_key(sender), &tip_raw);
            false
        }
        Ordering::Less => {
            req.ensure_floor(&version.timestamp)?;

            let mut causal_violation = false;
            let mut is_replay = false;
            for (seen, _, _) in req.op_records() {
                if seen.source != version.source {
                    continue;
                }
                if seen.timestamp > version.timestamp {
                    causal_violation = true;
                    break;
                }
                if &seen == version {
                    is_replay = true;
                    break;
                }
            }
            if causal_violation {
                return Err(Error::OutOfOrder);
            }
            if is_replay {
                false
            } else {
                req.put(&keys::op_key(version, op_name), value);
                let mut backref = req
                    .op_value(&keys::backref_key(&tip))
                    .map(VersionMap::parse)
                    .unwrap_or_default();
                if !backref.has_source(&version.source) {
                    backref.add(version);
                    req.put(&keys::backref_key(&tip), &backref.render());
                }
                true
            }
        }
        Ordering::Greater => {
            req.put(&keys::op_key(version, op_name), value);
            req.put(keys::TIP, &version.render_bare());
            true
        }
    };

    if bookmarking {
        req.put(&keys::bm_key(sender), &version.render_bare());
    }

    Ok(emit)
}
