//! Sharding engines by object type/id prefix so unrelated objects process
//! concurrently without sharing a lock (spec.md §9's open question on
//! inter-object parallelism, resolved here as per-prefix sharding rather
//! than forced serialization -- see DESIGN.md).

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::kv::KvStore;
use crate::op::Host;
use dashmap::DashMap;
use std::sync::Arc;

/// One engine per object prefix (`/Type#Id`), constructed lazily on first
/// use and shared across subsequent ops for the same object.
pub struct EngineTable<K, H> {
    kv: Arc<K>,
    host: Arc<H>,
    local_source: String,
    config: EngineConfig,
    engines: DashMap<String, Arc<Engine<Arc<K>, Arc<H>>>>,
}

impl<K: KvStore, H: Host> EngineTable<K, H> {
    pub fn new(kv: Arc<K>, host: Arc<H>, local_source: impl Into<String>, config: EngineConfig) -> Self {
        EngineTable { kv, host, local_source: local_source.into(), config, engines: DashMap::new() }
    }

    /// Returns the engine for `prefix`, constructing it on first access.
    pub fn engine_for(&self, prefix: &str) -> Arc<Engine<Arc<K>, Arc<H>>> {
        if let Some(existing) = self.engines.get(prefix) {
            return existing.clone();
        }
        self.engines
            .entry(prefix.to_string())
            .or_insert_with(|| {
                Arc::new(Engine::new(self.kv.clone(), self.host.clone(), self.local_source.clone(), self.config.clone()))
            })
            .clone()
    }
}

impl<K: KvStore> KvStore for Arc<K> {
    fn get(&self, key: &[u8]) -> crate::Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn scan(&self, gte: &[u8], lt: &[u8]) -> crate::Result<Vec<(Vec<u8>, Vec<u8>)>> {
        (**self).scan(gte, lt)
    }

    fn batch(&self, writes: Vec<crate::kv::Write>) -> crate::Result<()> {
        (**self).batch(writes)
    }
}

impl<H: Host> Host for Arc<H> {
    fn deliver(&self, op: crate::op::Op) {
        (**self).deliver(op)
    }
}
