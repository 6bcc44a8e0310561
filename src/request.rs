//! The reentrant per-object request: one incoming op's worth of loaded
//! state, accumulated across however many scans the handler needs, plus
//! the write batch and responses it produces (spec.md §4.2).
//!
//! All backend I/O is isolated to [`Request::ensure_meta`] and
//! [`Request::ensure_floor`] -- handlers (`patch`, `state`, `ingest`) only
//! ever read what has already been loaded and describe, via a return
//! value, how much further back they need the version-group scan to
//! reach. The driving loop lives in `engine.rs`.

use crate::keys;
use crate::kv::{self, KvStore, Write};
use crate::op::Op;
use crate::spec::Spec;
use crate::version::Version;
use std::collections::HashMap;

pub struct Request<'a, K: KvStore> {
    kv: &'a K,
    pub object_prefix: String,
    meta: HashMap<String, String>,
    ops: Vec<(String, String)>,
    meta_loaded: bool,
    loaded_floor: Option<String>,
    pub writes: Vec<Write>,
    pub responses: Vec<Op>,
}

impl<'a, K: KvStore> Request<'a, K> {
    pub fn new(kv: &'a K, object_prefix: String) -> Self {
        Request {
            kv,
            object_prefix,
            meta: HashMap::new(),
            ops: Vec::new(),
            meta_loaded: false,
            loaded_floor: None,
            writes: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Loads the manifest (meta) group once; idempotent, cheap, bounded
    /// regardless of log size.
    pub fn ensure_meta(&mut self) -> crate::Result<()> {
        if self.meta_loaded {
            return Ok(());
        }
        let gte = keys::meta_start(&self.object_prefix);
        let lt = keys::meta_end(&self.object_prefix);
        let rows = self.kv.scan(&gte, &lt).map_err(|e| crate::Error::Backend(e.to_string()))?;
        for (key, value) in rows {
            if let Some(suffix) = keys::decode(&self.object_prefix, &key) {
                self.meta.insert(suffix.to_string(), kv::decode_value(&value));
            }
        }
        self.meta_loaded = true;
        Ok(())
    }

    /// Whether the version group has already been scanned at least down to
    /// `floor` (i.e. a handler asking for `floor` again would get `Ready`
    /// without a new scan).
    pub fn floor_covers(&self, floor: &str) -> bool {
        self.loaded_floor.as_deref().is_some_and(|cur| cur <= floor)
    }

    /// Extends the version-group scan down to `floor`, loading only the gap
    /// between `floor` and whatever was already loaded.
    pub fn ensure_floor(&mut self, floor: &str) -> crate::Result<()> {
        self.ensure_meta()?;
        if self.floor_covers(floor) {
            return Ok(());
        }
        let gte = keys::version_floor(&self.object_prefix, floor);
        let lt = match &self.loaded_floor {
            Some(prev) => keys::version_floor(&self.object_prefix, prev),
            None => keys::version_end(&self.object_prefix),
        };
        let rows = self.kv.scan(&gte, &lt).map_err(|e| crate::Error::Backend(e.to_string()))?;
        for (key, value) in rows {
            if let Some(suffix) = keys::decode(&self.object_prefix, &key) {
                self.ops.push((suffix.to_string(), kv::decode_value(&value)));
            }
        }
        self.loaded_floor = Some(floor.to_string());
        Ok(())
    }

    pub fn meta(&self, suffix: &str) -> Option<&str> {
        self.meta.get(suffix).map(String::as_str)
    }

    pub fn ops(&self) -> &[(String, String)] {
        &self.ops
    }

    /// The raw value of a version-group record with exactly this suffix, if
    /// it has been loaded.
    pub fn op_value(&self, suffix: &str) -> Option<&str> {
        self.ops.iter().find(|(s, _)| s == suffix).map(|(_, v)| v.as_str())
    }

    /// Regular application-op entries among the loaded version records --
    /// anything that isn't a state snapshot or a backreference -- as
    /// `(version, raw suffix, value)` triples. The raw suffix is returned
    /// (rather than reconstructed) so callers can echo the exact spec the
    /// author sent, op-name included.
    pub fn op_records(&self) -> impl Iterator<Item = (Version, &str, &str)> {
        self.ops.iter().filter_map(|(suffix, value)| {
            let spec = Spec::parse(suffix).ok()?;
            match spec.op()? {
                "state" | "~br" => None,
                _ => Some((spec.version()?, suffix.as_str(), value.as_str())),
            }
        })
    }

    /// Raw values of loaded backreference (`.~br`-kind) records.
    pub fn backref_values(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|(suffix, value)| {
            let spec = Spec::parse(suffix).ok()?;
            (spec.op()? == "~br").then_some(value.as_str())
        })
    }

    pub fn put(&mut self, suffix: &str, value: &str) {
        self.writes.push(Write::Put(keys::encode(&self.object_prefix, suffix), kv::encode_value(value)));
    }

    pub fn delete(&mut self, suffix: &str) {
        self.writes.push(Write::Delete(keys::encode(&self.object_prefix, suffix)));
    }

    pub fn respond(&mut self, op: Op) {
        self.responses.push(op);
    }
}
